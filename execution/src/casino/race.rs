//! Race betting.
//!
//! Each driver's expected score is a weighted sum of their attributes under
//! the track profile. A race perturbs every expected score with bounded
//! noise, damped for consistent drivers, and the highest score wins. A bet
//! on the winner pays the bet times an odds multiplier derived from the
//! driver's share of the field's expected score.

use super::{settle, wager, GameError, GameResult, GameRng};
use crate::{state::Store, wallet::Wallet};
use casino_types::casino::{Driver, GameKind, Settlement, Track};
use std::sync::Arc;

/// Payout edge applied to the fair multiplier.
pub const HOUSE_EDGE: f64 = 0.90;

/// Lowest win probability used when pricing a driver.
pub const MIN_PROBABILITY: f64 = 0.05;

pub const MIN_MULTIPLIER: f64 = 1.2;
pub const MAX_MULTIPLIER: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attributes {
    pub speed: f64,
    pub handling: f64,
    pub consistency: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackProfile {
    pub name: &'static str,
    /// Attribute weights, summing to one
    pub weights: Attributes,
    /// Noise amplitude
    pub variance: f64,
}

pub fn profile(track: Track) -> TrackProfile {
    match track {
        Track::Monza => TrackProfile {
            name: "Monza",
            weights: Attributes {
                speed: 0.55,
                handling: 0.20,
                consistency: 0.25,
            },
            variance: 18.0,
        },
        Track::Monaco => TrackProfile {
            name: "Monaco",
            weights: Attributes {
                speed: 0.20,
                handling: 0.55,
                consistency: 0.25,
            },
            variance: 14.0,
        },
        Track::Silverstone => TrackProfile {
            name: "Silverstone",
            weights: Attributes {
                speed: 0.35,
                handling: 0.35,
                consistency: 0.30,
            },
            variance: 16.0,
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Competitor {
    pub name: &'static str,
    pub car: &'static str,
    pub stats: Attributes,
}

const fn competitor(
    name: &'static str,
    car: &'static str,
    speed: f64,
    handling: f64,
    consistency: f64,
) -> Competitor {
    Competitor {
        name,
        car,
        stats: Attributes {
            speed,
            handling,
            consistency,
        },
    }
}

pub fn competitor_of(driver: Driver) -> Competitor {
    match driver {
        Driver::Ver => competitor("Verstappen", "Red Bull", 89.0, 88.0, 88.0),
        Driver::Ham => competitor("Hamilton", "Ferrari", 89.0, 86.0, 90.0),
        Driver::Lec => competitor("Leclerc", "Ferrari", 89.0, 88.0, 85.0),
        Driver::Nor => competitor("Norris", "McLaren", 90.0, 85.0, 80.0),
        Driver::Alo => competitor("Alonso", "Aston Martin", 85.0, 86.0, 85.0),
        Driver::Pia => competitor("Piastri", "McLaren", 90.0, 87.0, 83.0),
        Driver::Tsu => competitor("Tsunoda", "Red Bull", 89.0, 80.0, 78.0),
        Driver::Str => competitor("Stroll", "Aston Martin", 85.0, 76.0, 78.0),
        Driver::Sai => competitor("Sainz", "Williams", 87.0, 87.0, 82.0),
        Driver::Alb => competitor("Albon", "Williams", 87.0, 82.0, 76.0),
        Driver::Rus => competitor("Russell", "Mercedes", 89.0, 87.0, 84.0),
        Driver::Ant => competitor("Antonelli", "Mercedes", 89.0, 82.0, 78.0),
    }
}

pub fn expected_score(driver: Driver, track: Track) -> f64 {
    let stats = competitor_of(driver).stats;
    let weights = profile(track).weights;
    stats.speed * weights.speed
        + stats.handling * weights.handling
        + stats.consistency * weights.consistency
}

/// Each driver's share of the field's total expected score.
pub fn win_probabilities(track: Track) -> Vec<(Driver, f64)> {
    let expected: Vec<f64> = Driver::ALL
        .iter()
        .map(|driver| expected_score(*driver, track))
        .collect();
    let total: f64 = expected.iter().sum();
    Driver::ALL
        .iter()
        .zip(expected)
        .map(|(driver, score)| (*driver, score / total))
        .collect()
}

/// Odds multiplier for a driver with raw win probability `probability`.
pub fn odds_multiplier(probability: f64) -> f64 {
    let fair = 1.0 / probability.max(MIN_PROBABILITY);
    (fair * HOUSE_EDGE).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
}

pub fn multiplier(driver: Driver, track: Track) -> f64 {
    let probability = win_probabilities(track)
        .into_iter()
        .find(|(candidate, _)| *candidate == driver)
        .map(|(_, probability)| probability)
        .unwrap_or(MIN_PROBABILITY);
    odds_multiplier(probability)
}

/// Roughly normal noise in [-1, 1].
fn noise(rng: &mut GameRng) -> f64 {
    let sum: f64 = (0..4).map(|_| rng.next_f64()).sum();
    (sum - 2.0) / 2.0
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Standing {
    pub driver: Driver,
    /// Race score rounded to one decimal
    pub score: f64,
}

/// Run a race, returning the field ordered from winner to last.
///
/// Equal scores keep the order of [Driver::ALL].
pub fn simulate(track: Track, rng: &mut GameRng) -> Vec<Standing> {
    let profile = profile(track);
    let mut standings: Vec<Standing> = Driver::ALL
        .iter()
        .map(|driver| {
            let consistency = competitor_of(*driver).stats.consistency;
            let stability = (100.0 - consistency) / 100.0;
            let score = expected_score(*driver, track)
                + noise(rng) * profile.variance * (0.6 + stability);
            Standing {
                driver: *driver,
                score: (score * 10.0).round() / 10.0,
            }
        })
        .collect();
    standings.sort_by(|a, b| b.score.total_cmp(&a.score));
    standings
}

#[derive(Clone, Debug)]
pub struct RaceOutcome {
    pub track: Track,
    pub driver: Driver,
    pub standings: Vec<Standing>,
    pub multiplier: f64,
    pub settlement: Settlement,
}

impl RaceOutcome {
    pub fn winner(&self) -> Option<Driver> {
        self.standings.first().map(|standing| standing.driver)
    }
}

/// Race book bound to a session's wallet.
pub struct Race<S: Store> {
    wallet: Arc<Wallet<S>>,
}

impl<S: Store> Race<S> {
    pub fn new(wallet: Arc<Wallet<S>>) -> Self {
        Self { wallet }
    }

    /// Bet `bet` on `driver` winning at `track` and run the race.
    pub async fn run(
        &self,
        track: Track,
        driver: Driver,
        bet: u64,
        rng: &mut GameRng,
    ) -> Result<RaceOutcome, GameError> {
        wager(&self.wallet, bet).await?;
        let standings = simulate(track, rng);
        let multiplier = multiplier(driver, track);
        let result = match standings.first() {
            Some(first) if first.driver == driver => {
                GameResult::Win((bet as f64 * multiplier).floor() as u64)
            }
            _ => GameResult::Loss,
        };
        let settlement = settle(&self.wallet, GameKind::Race, bet, result).await?;
        Ok(RaceOutcome {
            track,
            driver,
            standings,
            multiplier,
            settlement,
        })
    }
}
