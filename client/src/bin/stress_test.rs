//! Bot stress test - many concurrent sessions betting against one wallet
//!
//! Usage:
//!   cargo run --release --bin stress-test -- [OPTIONS]
//!
//! Options:
//!   -u, --url            Simulator URL (default: http://localhost:8080)
//!   -n, --num-bots       Number of bots to spawn (default: 50)
//!   -d, --duration       Duration in seconds (default: 60)
//!   -r, --rate           Rounds per second per bot (default: 3.0)
//!   -b, --bet            Stake per round (default: 10)

use anyhow::{bail, Context};
use casino_client::{Client, Error};
use casino_types::{
    api::{BetRequest, BlackjackPhase},
    casino::{BetKind, Driver, Track},
};
use clap::Parser;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use reqwest::StatusCode;
use std::{
    sync::{
        atomic::{AtomicI64, AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::time;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bot stress test for the casino simulator")]
struct Args {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "50")]
    num_bots: usize,

    #[arg(short, long, default_value = "60")]
    duration: u64,

    #[arg(short, long, default_value = "3.0")]
    rate: f64,

    #[arg(short, long, default_value = "10")]
    bet: u64,
}

/// Global metrics
#[derive(Default)]
struct Metrics {
    rounds: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    total_latency_ms: AtomicU64,
    /// Sum of payouts minus stakes over settled rounds.
    net: AtomicI64,
}

impl Metrics {
    fn record_round(&self, stake: u64, payout: u64, latency_ms: u64) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.net
            .fetch_add(payout as i64 - stake as i64, Ordering::Relaxed);
    }

    fn record_error(&self, err: &Error) {
        if err.status() == Some(StatusCode::PAYMENT_REQUIRED) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        } else {
            warn!(?err, "round failed");
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Play one round of a random game, returning (stake, payout).
async fn play_round(client: &Client, rng: &mut StdRng, bet: u64) -> Result<(u64, u64), Error> {
    let amount = bet as f64;
    match rng.gen_range(0..4u8) {
        0 => {
            let mut hand = client.blackjack_deal(amount).await?;
            while hand.phase == BlackjackPhase::PlayerTurn {
                hand = if hand.player_value < 17 {
                    client.blackjack_hit().await?
                } else {
                    client.blackjack_stand().await?
                };
            }
            Ok((hand.bet, hand.payout))
        }
        1 => {
            let spin = client.slots_spin(amount).await?;
            Ok((spin.bet, spin.payout))
        }
        2 => {
            let kind = *[BetKind::Red, BetKind::Black, BetKind::Even, BetKind::Dozen(2)]
                .choose(rng)
                .unwrap_or(&BetKind::Red);
            let spin = client
                .roulette_spin(vec![BetRequest { bet: kind, amount }])
                .await?;
            Ok((spin.stake, spin.payout))
        }
        _ => {
            let track = *Track::ALL.choose(rng).unwrap_or(&Track::Monza);
            let driver = *Driver::ALL.choose(rng).unwrap_or(&Driver::Ver);
            let race = client.race(track, driver, amount).await?;
            Ok((race.bet, race.payout))
        }
    }
}

/// Run a single bot on its own session
async fn run_bot(
    url: String,
    email: String,
    password: String,
    duration: Duration,
    rate_limit_per_sec: f64,
    bet: u64,
    metrics: Arc<Metrics>,
) -> anyhow::Result<()> {
    let client = Client::new(&url)?;
    client.login(&email, &password).await?;
    let mut rng = StdRng::from_entropy();

    let start_time = Instant::now();
    let interval_duration = Duration::from_secs_f64(1.0 / rate_limit_per_sec);
    let mut interval = time::interval(interval_duration);
    // Tick once immediately to start
    interval.tick().await;

    while start_time.elapsed() < duration {
        interval.tick().await;
        let start = Instant::now();
        match play_round(&client, &mut rng, bet).await {
            Ok((stake, payout)) => {
                metrics.record_round(stake, payout, start.elapsed().as_millis() as u64)
            }
            Err(err) => metrics.record_error(&err),
        }
    }

    client.logout().await?;
    Ok(())
}

/// Log the shared balance as it moves
async fn monitor_balance(client: Client, duration: Duration) {
    let mut updates = match client.connect_updates().await {
        Ok(updates) => updates,
        Err(err) => {
            error!(?err, "failed to connect to updates");
            return;
        }
    };
    let start_time = Instant::now();
    let mut last_report = Instant::now();
    while start_time.elapsed() < duration {
        match time::timeout(Duration::from_secs(1), updates.next()).await {
            Ok(Some(Ok(update))) => {
                if last_report.elapsed() >= Duration::from_secs(5) {
                    info!(?update, "shared wallet");
                    last_report = Instant::now();
                }
            }
            Ok(Some(Err(err))) => {
                error!(?err, "update stream failed");
                return;
            }
            Ok(None) => return,
            Err(_) => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();
    if args.rate <= 0.0 {
        bail!("rate must be positive");
    }

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting stress test with {} bots", args.num_bots);
    info!(
        "Duration: {} seconds, Rate: {} rounds/sec/bot, Bet: {}",
        args.duration, args.rate, args.bet
    );
    info!("Connecting to {}", args.url);

    // Shared account
    let client = Client::new(&args.url)?;
    let email = format!("stress-{}@example.com", rand::random::<u32>());
    let password = "stress-test".to_string();
    client
        .register(&email, &password)
        .await
        .context("failed to register stress account")?;
    let initial = client.balance().await?;
    let deposit = (args.num_bots as u64).saturating_mul(args.bet).saturating_mul(10);
    let funded = client.deposit(deposit as f64).await?;
    info!(initial, funded, "funded shared wallet");

    let metrics = Arc::new(Metrics::default());
    let start_time = Instant::now();
    let duration = Duration::from_secs(args.duration);

    // Spawn monitor task
    let monitor_handle = tokio::spawn(monitor_balance(client.clone(), duration));

    // Spawn bot tasks
    let mut handles = Vec::new();
    for _ in 0..args.num_bots {
        handles.push(tokio::spawn(run_bot(
            args.url.clone(),
            email.clone(),
            password.clone(),
            duration,
            args.rate,
            args.bet,
            Arc::clone(&metrics),
        )));
    }

    // Wait for all bots to complete
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(?err, "bot failed"),
            Err(err) => error!(?err, "bot panicked"),
        }
    }
    let _ = monitor_handle.await;

    // Print results
    let elapsed = start_time.elapsed();
    let rounds = metrics.rounds.load(Ordering::Relaxed);
    let rejected = metrics.rejected.load(Ordering::Relaxed);
    let failed = metrics.failed.load(Ordering::Relaxed);
    let total_latency = metrics.total_latency_ms.load(Ordering::Relaxed);
    let net = metrics.net.load(Ordering::Relaxed);
    let rps = if elapsed.as_secs() > 0 {
        rounds as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    let avg_latency = if rounds > 0 {
        total_latency as f64 / rounds as f64
    } else {
        0.0
    };

    info!("=== STRESS TEST RESULTS ===");
    info!("Duration: {:.2}s", elapsed.as_secs_f64());
    info!(
        "Rounds: {} settled, {} rejected (insufficient funds), {} failed",
        rounds, rejected, failed
    );
    info!("Rounds/sec: {:.2}", rps);
    info!("Average Latency: {:.2}ms", avg_latency);

    // Ledger check
    let balance = client.balance().await?;
    let expected = funded as i64 + net;
    info!(balance, expected, net, "final balance");
    if failed == 0 && balance as i64 != expected {
        bail!("ledger drift: balance {balance} != expected {expected}");
    }
    client.logout().await?;

    Ok(())
}
