//! Scratch card with 25 hidden values.
//!
//! Buying a card debits the bet and draws every value up front. Cells are
//! revealed one at a time; once the last cell is revealed the card settles
//! on the largest group of equal values (see [Tier]).

use super::{settle, wager, GameError, GameResult, GameRng};
use crate::{state::Store, wallet::Wallet};
use casino_types::casino::{GameKind, Settlement, Tier, SCRATCH_CELLS, SCRATCH_MAX_VALUE};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Card {
    bet: u64,
    values: [u8; SCRATCH_CELLS],
    revealed: [bool; SCRATCH_CELLS],
    settlement: Option<Settlement>,
}

impl Card {
    pub fn draw(bet: u64, rng: &mut GameRng) -> Self {
        let mut values = [0u8; SCRATCH_CELLS];
        for value in values.iter_mut() {
            *value = rng.next_bounded(SCRATCH_MAX_VALUE) + 1;
        }
        Self::from_values(bet, values)
    }

    pub fn from_values(bet: u64, values: [u8; SCRATCH_CELLS]) -> Self {
        Self {
            bet,
            values,
            revealed: [false; SCRATCH_CELLS],
            settlement: None,
        }
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    /// Values visible to the player.
    pub fn cells(&self) -> Vec<Option<u8>> {
        self.values
            .iter()
            .zip(self.revealed)
            .map(|(value, revealed)| revealed.then_some(*value))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.revealed.iter().all(|revealed| *revealed)
    }

    pub fn settlement(&self) -> Option<Settlement> {
        self.settlement
    }

    /// Reveal `index`, returning every revealed cell holding the same value
    /// (the new cell included) when it matches at least one other.
    pub fn reveal(&mut self, index: usize) -> Result<Vec<usize>, GameError> {
        if index >= SCRATCH_CELLS {
            return Err(GameError::InvalidCell(index));
        }
        if self.revealed[index] {
            return Err(GameError::CellRevealed(index));
        }
        self.revealed[index] = true;

        let value = self.values[index];
        let matches: Vec<usize> = (0..SCRATCH_CELLS)
            .filter(|i| self.revealed[*i] && self.values[*i] == value)
            .collect();
        if matches.len() < 2 {
            return Ok(Vec::new());
        }
        Ok(matches)
    }

    /// Largest group of equal values and the value it holds.
    pub fn best_group(&self) -> (u8, usize) {
        let mut counts: HashMap<u8, usize> = HashMap::new();
        for value in self.values {
            *counts.entry(value).or_default() += 1;
        }
        // Ties go to the value appearing first on the card
        self.values
            .iter()
            .map(|value| (*value, counts[value]))
            .fold((0, 0), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }

    pub fn tier(&self) -> Option<Tier> {
        Tier::from_count(self.best_group().1)
    }

    pub fn result(&self) -> GameResult {
        match self.tier() {
            Some(tier) => GameResult::Win(self.bet.saturating_mul(tier.multiplier())),
            None => GameResult::Loss,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Reveal {
    pub index: usize,
    pub value: u8,
    pub matches: Vec<usize>,
}

/// Scratch card counter bound to a session's wallet.
pub struct Scratch<S: Store> {
    wallet: Arc<Wallet<S>>,
    card: Option<Card>,
}

impl<S: Store> Scratch<S> {
    pub fn new(wallet: Arc<Wallet<S>>) -> Self {
        Self { wallet, card: None }
    }

    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    /// Buy a new card. A card still being scratched must be finished or
    /// abandoned first.
    pub async fn buy(&mut self, bet: u64, rng: &mut GameRng) -> Result<&Card, GameError> {
        if self.card.as_ref().is_some_and(|card| !card.is_complete()) {
            return Err(GameError::RoundInProgress);
        }
        wager(&self.wallet, bet).await?;
        Ok(self.card.insert(Card::draw(bet, rng)))
    }

    /// Reveal one cell, settling the card when it was the last.
    pub async fn reveal(&mut self, index: usize) -> Result<Reveal, GameError> {
        let card = self.card.as_mut().ok_or(GameError::NoActiveRound)?;
        if card.is_complete() {
            return Err(GameError::RoundComplete);
        }
        let matches = card.reveal(index)?;
        let reveal = Reveal {
            index,
            value: card.values[index],
            matches,
        };
        if card.is_complete() {
            let settlement = settle(&self.wallet, GameKind::Scratch, card.bet, card.result()).await?;
            card.settlement = Some(settlement);
        }
        Ok(reveal)
    }

    /// Discard the current card. An unfinished card forfeits its bet.
    pub fn abandon(&mut self) -> Option<Card> {
        let card = self.card.take()?;
        if !card.is_complete() {
            debug!(bet = card.bet, "abandoned scratch card");
        }
        Some(card)
    }
}
