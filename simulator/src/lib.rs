use casino_execution::{
    casino::{
        blackjack::{hand_value, Blackjack, Hand, Phase},
        race::{self, Race},
        roulette::Roulette,
        scratch::{Card, Scratch},
        slots::{Slots, SlotsConfig},
        GameError, GameRng,
    },
    IdentityError, Memory, Session, Wallet, WalletError,
};
use casino_types::{
    api::{
        parse_amount, BalanceResponse, BetResultView, BlackjackPhase, BlackjackView, FieldEntry,
        LineWinView, RaceFieldResponse, RaceRequest, RaceView, RouletteRequest, RouletteView,
        ScratchView, SessionResponse, SlotsView, StandingView, Update,
    },
    casino::{card_label, Settlement, Track},
    Principal,
};
use commonware_utils::hex;
use rand::{rngs::OsRng, RngCore};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info, warn};

mod api;
mod config;

pub use api::Api;
pub use config::{Config, ConfigError, ValidatedConfig};

/// Buffered updates per session before slow WebSocket readers lag.
const UPDATE_BUFFER: usize = 1024;

const TOKEN_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown session")]
    UnknownSession,
    #[error("invalid amount")]
    InvalidAmount,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// Games and RNG of one signed-in client.
pub struct Table {
    session: Session<Memory>,
    blackjack: Blackjack<Memory>,
    slots: Slots<Memory>,
    roulette: Roulette<Memory>,
    scratch: Scratch<Memory>,
    race: Race<Memory>,
    rng: GameRng,
}

impl Table {
    fn new(store: Memory, config: &ValidatedConfig) -> Self {
        let session = Session::new(store, config.initial_credits);
        let wallet = session.wallet();
        Self {
            blackjack: Blackjack::new(wallet.clone()),
            slots: Slots::new(
                wallet.clone(),
                SlotsConfig {
                    wild_substitution: config.wild_substitution,
                },
            ),
            roulette: Roulette::new(wallet.clone()),
            scratch: Scratch::new(wallet.clone()),
            race: Race::new(wallet),
            session,
            rng: GameRng::from_entropy(),
        }
    }

    fn wallet(&self) -> Arc<Wallet<Memory>> {
        self.session.wallet()
    }

    fn credits(&self) -> u64 {
        self.session.wallet().balance()
    }
}

/// Handle to a live session.
#[derive(Clone)]
struct Entry {
    table: Arc<Mutex<Table>>,
    credits: watch::Receiver<u64>,
    updates: broadcast::Sender<Update>,
    /// Milliseconds since simulator start at the last request.
    last_used: Arc<AtomicU64>,
}

impl Entry {
    fn settled(&self, settlement: Settlement) {
        // No subscribers is not an error
        let _ = self.updates.send(Update::Settled(settlement));
    }

    /// Sign the session out and tell its subscribers.
    async fn close(&self) -> Result<(), Error> {
        self.table.lock().await.session.logout()?;
        if self.updates.send(Update::SignedOut).is_err() {
            debug!("no subscribers for sign-out");
        }
        Ok(())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Local casino back end.
///
/// Every signed-in client owns a [Table] keyed by an opaque session token.
/// All tables share one document store, so two sessions of the same
/// principal spend from the same ledger. Sessions idle for longer than
/// [ValidatedConfig::session_idle] are closed on the next sign-in.
pub struct Simulator {
    config: ValidatedConfig,
    store: Memory,
    sessions: RwLock<HashMap<String, Entry>>,
    started: Instant,
}

impl Simulator {
    pub fn new(config: ValidatedConfig) -> Self {
        Self {
            config,
            store: Memory::default(),
            sessions: RwLock::new(HashMap::new()),
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn store(&self) -> &Memory {
        &self.store
    }

    pub fn session_count(&self) -> usize {
        match self.sessions.read() {
            Ok(sessions) => sessions.len(),
            Err(e) => {
                error!("Failed to acquire read lock in session_count: {}", e);
                0
            }
        }
    }

    fn entry(&self, token: &str) -> Result<Entry, Error> {
        let sessions = match self.sessions.read() {
            Ok(sessions) => sessions,
            Err(e) => {
                error!("Failed to acquire read lock in entry: {}", e);
                return Err(Error::UnknownSession);
            }
        };
        let entry = sessions.get(token).cloned().ok_or(Error::UnknownSession)?;
        entry.last_used.store(self.now(), Ordering::Relaxed);
        Ok(entry)
    }

    fn now(&self) -> u64 {
        millis(self.started.elapsed())
    }

    /// Close every session idle for longer than the configured limit.
    pub async fn evict_idle(&self) -> usize {
        let now = self.now();
        let limit = millis(self.config.session_idle);
        let evicted: Vec<Entry> = match self.sessions.write() {
            Ok(mut sessions) => {
                let stale: Vec<String> = sessions
                    .iter()
                    .filter(|(_, entry)| {
                        now.saturating_sub(entry.last_used.load(Ordering::Relaxed)) > limit
                    })
                    .map(|(token, _)| token.clone())
                    .collect();
                stale
                    .iter()
                    .filter_map(|token| sessions.remove(token))
                    .collect()
            }
            Err(e) => {
                error!("Failed to acquire write lock in evict_idle: {}", e);
                return 0;
            }
        };
        for entry in &evicted {
            if let Err(err) = entry.close().await {
                warn!(?err, "failed to close idle session");
            }
        }
        if !evicted.is_empty() {
            info!(count = evicted.len(), "evicted idle sessions");
        }
        evicted.len()
    }

    fn open(&self, table: Table, principal: Principal) -> SessionResponse {
        let mut raw = [0u8; TOKEN_LENGTH];
        OsRng.fill_bytes(&mut raw);
        let token = hex(&raw);

        let credits = table.credits();
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        let entry = Entry {
            credits: table.wallet().credits(),
            table: Arc::new(Mutex::new(table)),
            updates,
            last_used: Arc::new(AtomicU64::new(self.now())),
        };
        match self.sessions.write() {
            Ok(mut sessions) => {
                sessions.insert(token.clone(), entry);
            }
            Err(e) => error!("Failed to acquire write lock in open: {}", e),
        }
        info!(principal = %principal.id, "opened session");
        SessionResponse {
            token,
            principal,
            credits,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<SessionResponse, Error> {
        self.evict_idle().await;
        let table = Table::new(self.store.clone(), &self.config);
        let principal = table.session.register(email, password).await?;
        Ok(self.open(table, principal))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionResponse, Error> {
        self.evict_idle().await;
        let table = Table::new(self.store.clone(), &self.config);
        let principal = table.session.login(email, password).await?;
        Ok(self.open(table, principal))
    }

    /// Close a session. Subscribers receive [Update::SignedOut].
    pub async fn logout(&self, token: &str) -> Result<(), Error> {
        let entry = match self.sessions.write() {
            Ok(mut sessions) => sessions.remove(token),
            Err(e) => {
                error!("Failed to acquire write lock in logout: {}", e);
                None
            }
        };
        entry.ok_or(Error::UnknownSession)?.close().await
    }

    /// Balance feed and round updates of a session.
    pub fn subscribe(
        &self,
        token: &str,
    ) -> Result<(watch::Receiver<u64>, broadcast::Receiver<Update>), Error> {
        let entry = self.entry(token)?;
        Ok((entry.credits, entry.updates.subscribe()))
    }

    pub async fn balance(&self, token: &str) -> Result<BalanceResponse, Error> {
        let entry = self.entry(token)?;
        let table = entry.table.lock().await;
        Ok(BalanceResponse {
            credits: table.credits(),
        })
    }

    pub async fn deposit(&self, token: &str, amount: f64) -> Result<BalanceResponse, Error> {
        let amount = parse_amount(amount).ok_or(Error::InvalidAmount)?;
        let entry = self.entry(token)?;
        let table = entry.table.lock().await;
        let credits = table.wallet().add_credits(amount).await?;
        info!(amount, credits, "deposited credits");
        Ok(BalanceResponse { credits })
    }

    pub async fn blackjack_deal(&self, token: &str, amount: f64) -> Result<BlackjackView, Error> {
        let bet = parse_amount(amount).ok_or(GameError::InvalidWager)?;
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;
        let hand = table.blackjack.deal(bet, &mut table.rng).await?;
        if let Some(settlement) = hand.settlement() {
            entry.settled(settlement);
        }
        Ok(blackjack_view(hand, table.session.wallet().balance()))
    }

    pub async fn blackjack_hit(&self, token: &str) -> Result<BlackjackView, Error> {
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;
        let hand = table.blackjack.hit().await?;
        if let Some(settlement) = hand.settlement() {
            entry.settled(settlement);
        }
        Ok(blackjack_view(hand, table.session.wallet().balance()))
    }

    pub async fn blackjack_stand(&self, token: &str) -> Result<BlackjackView, Error> {
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;
        let hand = table.blackjack.stand().await?;
        if let Some(settlement) = hand.settlement() {
            entry.settled(settlement);
        }
        Ok(blackjack_view(hand, table.session.wallet().balance()))
    }

    pub async fn slots_spin(&self, token: &str, amount: f64) -> Result<SlotsView, Error> {
        let bet = parse_amount(amount).ok_or(GameError::InvalidWager)?;
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;
        let spin = table.slots.spin(bet, &mut table.rng).await?;
        entry.settled(spin.settlement);
        Ok(SlotsView {
            bet,
            grid: spin.grid.iter().map(|row| row.to_vec()).collect(),
            wins: spin
                .wins
                .iter()
                .map(|win| LineWinView {
                    line: win.line.to_string(),
                    symbol: win.matched.symbol,
                    count: win.matched.count,
                    wilds: win.matched.wilds,
                    multiplier: win.multiplier,
                    amount: win.amount,
                })
                .collect(),
            payout: spin.settlement.payout,
            credits: table.credits(),
        })
    }

    /// Place every bet of `request` on a fresh slip and spin.
    pub async fn roulette_spin(
        &self,
        token: &str,
        request: &RouletteRequest,
    ) -> Result<RouletteView, Error> {
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;

        let slip = table.roulette.slip_mut();
        slip.clear();
        for bet in &request.bets {
            let placed = parse_amount(bet.amount)
                .ok_or(GameError::InvalidWager)
                .and_then(|amount| slip.add(bet.bet, amount));
            if let Err(err) = placed {
                slip.clear();
                return Err(err.into());
            }
        }

        let spin = table.roulette.spin(&mut table.rng).await?;
        entry.settled(spin.settlement);
        Ok(RouletteView {
            number: spin.number,
            color: spin.color,
            bets: spin
                .results
                .iter()
                .map(|result| BetResultView {
                    bet: result.bet.kind,
                    amount: result.bet.amount,
                    won: result.won,
                    payout: result.payout,
                })
                .collect(),
            stake: spin.settlement.stake,
            payout: spin.settlement.payout,
            credits: table.credits(),
        })
    }

    pub async fn scratch_new(&self, token: &str, amount: f64) -> Result<ScratchView, Error> {
        let bet = parse_amount(amount).ok_or(GameError::InvalidWager)?;
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;
        let card = table.scratch.buy(bet, &mut table.rng).await?;
        Ok(scratch_view(card, Vec::new(), table.session.wallet().balance()))
    }

    pub async fn scratch_reveal(&self, token: &str, index: usize) -> Result<ScratchView, Error> {
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;
        let reveal = table.scratch.reveal(index).await?;
        let card = table.scratch.card().ok_or(GameError::NoActiveRound)?;
        if let Some(settlement) = card.settlement() {
            entry.settled(settlement);
        }
        Ok(scratch_view(card, reveal.matches, table.session.wallet().balance()))
    }

    /// Discard the current card, forfeiting it if unfinished.
    pub async fn scratch_end(&self, token: &str) -> Result<BalanceResponse, Error> {
        let entry = self.entry(token)?;
        let mut table = entry.table.lock().await;
        table.scratch.abandon().ok_or(GameError::NoActiveRound)?;
        Ok(BalanceResponse {
            credits: table.credits(),
        })
    }

    pub fn race_field(&self, track: Track) -> RaceFieldResponse {
        let entries = race::win_probabilities(track)
            .into_iter()
            .map(|(driver, probability)| {
                let competitor = race::competitor_of(driver);
                FieldEntry {
                    driver,
                    name: competitor.name.to_string(),
                    car: competitor.car.to_string(),
                    expected: race::expected_score(driver, track),
                    probability,
                    multiplier: race::odds_multiplier(probability),
                }
            })
            .collect();
        RaceFieldResponse { track, entries }
    }

    pub async fn race(&self, token: &str, request: &RaceRequest) -> Result<RaceView, Error> {
        let bet = parse_amount(request.amount).ok_or(GameError::InvalidWager)?;
        let entry = self.entry(token)?;
        let mut guard = entry.table.lock().await;
        let table = &mut *guard;
        let outcome = table
            .race
            .run(request.track, request.driver, bet, &mut table.rng)
            .await?;
        entry.settled(outcome.settlement);
        Ok(RaceView {
            track: outcome.track,
            driver: outcome.driver,
            bet,
            standings: outcome
                .standings
                .iter()
                .map(|standing| StandingView {
                    driver: standing.driver,
                    score: standing.score,
                })
                .collect(),
            multiplier: outcome.multiplier,
            payout: outcome.settlement.payout,
            credits: table.credits(),
        })
    }
}

fn blackjack_view(hand: &Hand, credits: u64) -> BlackjackView {
    let complete = hand.phase() == Phase::Complete;
    let dealer = hand.visible_dealer();
    BlackjackView {
        bet: hand.bet(),
        player: hand.player().iter().map(|card| card_label(*card)).collect(),
        player_value: hand_value(hand.player()).0,
        dealer: dealer.iter().map(|card| card_label(*card)).collect(),
        dealer_value: hand_value(dealer).0,
        phase: if complete {
            BlackjackPhase::Complete
        } else {
            BlackjackPhase::PlayerTurn
        },
        outcome: hand.result().map(|result| result.outcome()),
        payout: hand.settlement().map(|s| s.payout).unwrap_or_default(),
        credits,
    }
}

fn scratch_view(card: &Card, matches: Vec<usize>, credits: u64) -> ScratchView {
    let settlement = card.settlement();
    ScratchView {
        bet: card.bet(),
        cells: card.cells(),
        matches,
        complete: card.is_complete(),
        tier: settlement.and_then(|_| card.tier()),
        payout: settlement.map(|s| s.payout).unwrap_or_default(),
        credits,
    }
}

impl Error {
    /// Whether the error came from the backing store rather than the caller.
    pub fn is_unavailable(&self) -> bool {
        let wallet = match self {
            Self::Wallet(err) => err,
            Self::Game(GameError::Wallet(err)) => err,
            Self::Identity(IdentityError::Wallet(err)) => err,
            Self::Identity(IdentityError::Store(_)) => return true,
            _ => return false,
        };
        matches!(wallet, WalletError::Store(_) | WalletError::Contended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casino_types::{
        api::BetRequest,
        casino::{BetKind, Driver, SCRATCH_CELLS},
    };

    fn simulator() -> Simulator {
        Simulator::new(ValidatedConfig::default())
    }

    #[tokio::test]
    async fn test_register_opens_session() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        assert_eq!(session.credits, 1_000);
        assert_eq!(session.token.len(), TOKEN_LENGTH * 2);
        assert_eq!(simulator.session_count(), 1);
        assert_eq!(
            simulator.balance(&session.token).await.unwrap().credits,
            1_000
        );

        assert!(matches!(
            simulator.register("a@b.co", "secret1").await,
            Err(Error::Identity(IdentityError::EmailInUse))
        ));
        assert_eq!(simulator.session_count(), 1);
    }

    #[tokio::test]
    async fn test_sessions_share_ledger() {
        let simulator = simulator();
        let first = simulator.register("a@b.co", "secret1").await.unwrap();
        let second = simulator.login("a@b.co", "secret1").await.unwrap();
        assert_ne!(first.token, second.token);

        simulator.slots_spin(&first.token, 100.0).await.unwrap();
        let a = simulator.balance(&first.token).await.unwrap();
        let b = simulator.balance(&second.token).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_logout_notifies_and_forgets() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        let (credits, mut updates) = simulator.subscribe(&session.token).unwrap();
        assert_eq!(*credits.borrow(), 1_000);

        simulator.logout(&session.token).await.unwrap();
        assert_eq!(updates.recv().await.unwrap(), Update::SignedOut);
        assert_eq!(*credits.borrow(), 0);
        assert!(matches!(
            simulator.balance(&session.token).await,
            Err(Error::UnknownSession)
        ));
        assert!(matches!(
            simulator.logout(&session.token).await,
            Err(Error::UnknownSession)
        ));
    }

    #[tokio::test]
    async fn test_deposit() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        let balance = simulator.deposit(&session.token, 250.9).await.unwrap();
        assert_eq!(balance.credits, 1_250);
        assert!(matches!(
            simulator.deposit(&session.token, 0.5).await,
            Err(Error::InvalidAmount)
        ));
        assert!(matches!(
            simulator.deposit(&session.token, f64::NAN).await,
            Err(Error::InvalidAmount)
        ));
    }

    #[tokio::test]
    async fn test_invalid_wager_leaves_balance() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        assert!(matches!(
            simulator.slots_spin(&session.token, -5.0).await,
            Err(Error::Game(GameError::InvalidWager))
        ));
        assert!(matches!(
            simulator.blackjack_deal(&session.token, 5_000.0).await,
            Err(Error::Game(GameError::Wallet(
                WalletError::InsufficientFunds { .. }
            )))
        ));
        assert_eq!(
            simulator.balance(&session.token).await.unwrap().credits,
            1_000
        );
    }

    #[tokio::test]
    async fn test_blackjack_round() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        let mut view = simulator.blackjack_deal(&session.token, 10.0).await.unwrap();
        if view.phase == BlackjackPhase::PlayerTurn {
            assert_eq!(view.dealer.len(), 1);
            assert!(matches!(
                simulator.blackjack_deal(&session.token, 10.0).await,
                Err(Error::Game(GameError::RoundInProgress))
            ));
            view = simulator.blackjack_stand(&session.token).await.unwrap();
        }
        assert_eq!(view.phase, BlackjackPhase::Complete);
        assert!(view.outcome.is_some());
        assert_eq!(view.credits, 1_000 - 10 + view.payout);
        assert!(matches!(
            simulator.blackjack_hit(&session.token).await,
            Err(Error::Game(GameError::RoundComplete))
        ));
    }

    #[tokio::test]
    async fn test_roulette_rejects_bad_slip() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        let request = RouletteRequest {
            bets: vec![
                BetRequest {
                    bet: BetKind::Red,
                    amount: 10.0,
                },
                BetRequest {
                    bet: BetKind::Straight(40),
                    amount: 10.0,
                },
            ],
        };
        assert!(matches!(
            simulator.roulette_spin(&session.token, &request).await,
            Err(Error::Game(GameError::InvalidBet))
        ));
        assert!(matches!(
            simulator
                .roulette_spin(&session.token, &RouletteRequest { bets: vec![] })
                .await,
            Err(Error::Game(GameError::EmptySlip))
        ));

        let request = RouletteRequest {
            bets: vec![
                BetRequest {
                    bet: BetKind::Even,
                    amount: 10.0,
                },
                BetRequest {
                    bet: BetKind::Straight(17),
                    amount: 5.0,
                },
            ],
        };
        let view = simulator
            .roulette_spin(&session.token, &request)
            .await
            .unwrap();
        assert_eq!(view.stake, 15);
        assert_eq!(view.bets.len(), 2);
        assert_eq!(view.credits, 1_000 - 15 + view.payout);
    }

    #[tokio::test]
    async fn test_scratch_round_publishes_settlement() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        let (_, mut updates) = simulator.subscribe(&session.token).unwrap();

        let view = simulator.scratch_new(&session.token, 10.0).await.unwrap();
        assert!(view.cells.iter().all(Option::is_none));
        assert_eq!(view.credits, 990);

        let mut last = view;
        for index in 0..SCRATCH_CELLS {
            last = simulator
                .scratch_reveal(&session.token, index)
                .await
                .unwrap();
        }
        assert!(last.complete);
        assert!(last.cells.iter().all(Option::is_some));
        assert_eq!(last.credits, 990 + last.payout);
        match updates.recv().await.unwrap() {
            Update::Settled(settlement) => assert_eq!(settlement.payout, last.payout),
            update => panic!("unexpected update: {update:?}"),
        }

        simulator.scratch_end(&session.token).await.unwrap();
        assert!(matches!(
            simulator.scratch_end(&session.token).await,
            Err(Error::Game(GameError::NoActiveRound))
        ));
    }

    #[tokio::test]
    async fn test_idle_sessions_close_on_sign_in() {
        let simulator = Simulator::new(ValidatedConfig {
            session_idle: Duration::from_millis(50),
            ..ValidatedConfig::default()
        });
        let stale = simulator.register("a@b.co", "secret1").await.unwrap();
        let (credits, mut updates) = simulator.subscribe(&stale.token).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let fresh = simulator.login("a@b.co", "secret1").await.unwrap();
        assert_eq!(simulator.session_count(), 1);
        assert_eq!(updates.recv().await.unwrap(), Update::SignedOut);
        assert_eq!(*credits.borrow(), 0);
        assert!(matches!(
            simulator.balance(&stale.token).await,
            Err(Error::UnknownSession)
        ));

        // Recently used sessions stay open
        assert_eq!(simulator.evict_idle().await, 0);
        assert_eq!(
            simulator.balance(&fresh.token).await.unwrap().credits,
            1_000
        );
    }

    #[test]
    fn test_race_field() {
        let field = simulator().race_field(Track::Monza);
        assert_eq!(field.entries.len(), 12);
        let total: f64 = field.entries.iter().map(|e| e.probability).sum();
        assert!(total <= 1.0 + 1e-9);
        assert!(field
            .entries
            .iter()
            .all(|e| (1.2..=8.0).contains(&e.multiplier)));
    }

    #[tokio::test]
    async fn test_race() {
        let simulator = simulator();
        let session = simulator.register("a@b.co", "secret1").await.unwrap();
        let view = simulator
            .race(
                &session.token,
                &RaceRequest {
                    track: Track::Monaco,
                    driver: Driver::Alo,
                    amount: 50.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(view.standings.len(), 12);
        assert!((1.2..=8.0).contains(&view.multiplier));
        if view.standings[0].driver == Driver::Alo {
            assert_eq!(view.payout, (50.0 * view.multiplier).floor() as u64);
        } else {
            assert_eq!(view.payout, 0);
        }
        assert_eq!(view.credits, 950 + view.payout);
    }
}
