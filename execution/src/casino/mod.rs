//! Casino game execution module.
//!
//! Every game follows the same round lifecycle: validate the wager, debit it
//! through the [Wallet], draw the outcome from a [GameRng], settle, and
//! credit any return. The debit and the credit are separate ledger
//! transactions.
//!
//! Games:
//! - Blackjack
//! - Slots
//! - Roulette
//! - Scratch card
//! - Race

pub mod blackjack;
pub mod race;
pub mod roulette;
pub mod scratch;
pub mod slots;

use crate::{
    state::Store,
    wallet::{Wallet, WalletError},
};
use casino_types::casino::{GameKind, Outcome, Settlement, DECK_SIZE, ROULETTE_MAX_NUMBER};
use commonware_cryptography::{sha256::Sha256, Hasher};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::{info, warn};

/// Random number generator driven by a SHA-256 hash chain.
///
/// Seeded explicitly it replays the same rounds, which the tests rely on.
/// The simulator seeds it from OS entropy.
#[derive(Clone)]
pub struct GameRng {
    state: [u8; 32],
    index: usize,
}

impl GameRng {
    /// Create a new RNG from a seed and a round nonce.
    pub fn new(seed: &[u8], round: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(&round.to_be_bytes());
        Self {
            state: hasher.finalize().0,
            index: 0,
        }
    }

    /// Create an RNG seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::new(&seed, 0)
    }

    fn next_byte(&mut self) -> u8 {
        if self.index >= 32 {
            let mut hasher = Sha256::new();
            hasher.update(&self.state);
            self.state = hasher.finalize().0;
            self.index = 0;
        }
        let result = self.state[self.index];
        self.index += 1;
        result
    }

    pub fn next_u8(&mut self) -> u8 {
        self.next_byte()
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        for byte in bytes.iter_mut() {
            *byte = self.next_byte();
        }
        u32::from_be_bytes(bytes)
    }

    /// Get a random f64 value in range [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Get a random value in range [0, max).
    pub fn next_bounded(&mut self, max: u8) -> u8 {
        if max == 0 {
            return 0;
        }
        // Rejection sampling keeps the distribution unbiased
        let limit = u8::MAX - (u8::MAX % max);
        loop {
            let value = self.next_u8();
            if value < limit {
                return value % max;
            }
        }
    }

    /// Shuffle a slice in place using Fisher-Yates.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_bounded((i + 1) as u8) as usize;
            slice.swap(i, j);
        }
    }

    /// Create a shuffled deck of 52 cards (suit = card/13, rank = card%13).
    pub fn create_deck(&mut self) -> Vec<u8> {
        let mut deck: Vec<u8> = (0..DECK_SIZE).collect();
        self.shuffle(&mut deck);
        deck
    }

    /// Spin a single-zero wheel (0-36).
    pub fn spin_roulette(&mut self) -> u8 {
        self.next_bounded(ROULETTE_MAX_NUMBER + 1)
    }
}

/// Result of a finished round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Total return (stake included).
    Win(u64),
    /// Stake returned.
    Push(u64),
    Loss,
}

impl GameResult {
    /// Credits owed to the player.
    pub fn payout(&self) -> u64 {
        match self {
            Self::Win(amount) | Self::Push(amount) => *amount,
            Self::Loss => 0,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Win(_) => Outcome::Win,
            Self::Push(_) => Outcome::Push,
            Self::Loss => Outcome::Loss,
        }
    }

    /// Classify a round that returned `payout` in total.
    pub fn from_payout(payout: u64) -> Self {
        if payout > 0 {
            Self::Win(payout)
        } else {
            Self::Loss
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid wager")]
    InvalidWager,
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("a round is already in progress")]
    RoundInProgress,
    #[error("no active round")]
    NoActiveRound,
    #[error("round already complete")]
    RoundComplete,
    #[error("invalid bet")]
    InvalidBet,
    #[error("too many bets (max {max})")]
    TooManyBets { max: usize },
    #[error("no bets placed")]
    EmptySlip,
    #[error("cell {0} does not exist")]
    InvalidCell(usize),
    #[error("cell {0} already revealed")]
    CellRevealed(usize),
    #[error("deck exhausted")]
    DeckExhausted,
}

/// Debit the stake of a new round.
pub async fn wager<S: Store>(wallet: &Wallet<S>, stake: u64) -> Result<u64, GameError> {
    if stake == 0 {
        return Err(GameError::InvalidWager);
    }
    Ok(wallet.spend(stake).await?)
}

/// Credit the return of a finished round, if any.
pub async fn settle<S: Store>(
    wallet: &Wallet<S>,
    game: GameKind,
    stake: u64,
    result: GameResult,
) -> Result<Settlement, GameError> {
    let payout = result.payout();
    if payout > 0 {
        if let Err(err) = wallet.payout(payout).await {
            warn!(%game, stake, payout, ?err, "failed to credit winnings");
            return Err(err.into());
        }
    }
    info!(%game, stake, payout, outcome = ?result.outcome(), "settled round");
    Ok(Settlement {
        game,
        stake,
        payout,
    })
}
