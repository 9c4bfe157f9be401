//! Blackjack against a dealer who stands on every 17.
//!
//! Single 52-card deck, no splitting or doubling. A natural blackjack on
//! either side ends the round before the player acts. Blackjack pays 3:2
//! (rounded down), any other win pays 1:1, and ties push.

use super::{settle, wager, GameError, GameResult, GameRng};
use crate::{state::Store, wallet::Wallet};
use casino_types::casino::{GameKind, Settlement};
use std::sync::Arc;

/// Dealer keeps drawing below this total.
pub const DEALER_STANDS_ON: u8 = 17;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    PlayerTurn,
    Complete,
}

/// Calculate the value of a blackjack hand.
///
/// Aces count 11 and drop to 1 one at a time while the hand is bust.
/// Returns the value and whether an ace is still counted as 11.
pub fn hand_value(cards: &[u8]) -> (u8, bool) {
    let mut value: u16 = 0;
    let mut aces: u8 = 0;

    for &card in cards {
        let rank = (card % 13) + 1; // 1=Ace, 2-10, 11=J, 12=Q, 13=K
        if rank == 1 {
            aces += 1;
            value += 11;
        } else if rank >= 10 {
            value += 10;
        } else {
            value += rank as u16;
        }
    }

    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }

    let is_soft = aces > 0 && value <= 21;
    (value.min(255) as u8, is_soft)
}

/// Check if hand is a blackjack (21 with 2 cards).
pub fn is_blackjack(cards: &[u8]) -> bool {
    cards.len() == 2 && hand_value(cards).0 == 21
}

/// Settle a finished hand for a stake of `bet`.
pub fn resolve(player: &[u8], dealer: &[u8], bet: u64) -> GameResult {
    let (player_value, _) = hand_value(player);
    let (dealer_value, _) = hand_value(dealer);
    let player_blackjack = is_blackjack(player);
    let dealer_blackjack = is_blackjack(dealer);

    if player_value > 21 {
        GameResult::Loss
    } else if dealer_value > 21 {
        GameResult::Win(bet.saturating_mul(2))
    } else if player_blackjack && !dealer_blackjack {
        GameResult::Win(bet.saturating_mul(2).saturating_add(bet / 2))
    } else if dealer_blackjack && !player_blackjack {
        GameResult::Loss
    } else if player_value > dealer_value {
        GameResult::Win(bet.saturating_mul(2))
    } else if player_value < dealer_value {
        GameResult::Loss
    } else {
        GameResult::Push(bet)
    }
}

/// One hand of blackjack, from the deal to the settlement.
#[derive(Clone, Debug)]
pub struct Hand {
    bet: u64,
    deck: Vec<u8>,
    player: Vec<u8>,
    dealer: Vec<u8>,
    phase: Phase,
    result: Option<GameResult>,
    settlement: Option<Settlement>,
}

impl Hand {
    /// Shuffle a fresh deck and deal two cards each, player first.
    pub fn deal(bet: u64, rng: &mut GameRng) -> Result<Self, GameError> {
        Self::from_deck(bet, rng.create_deck())
    }

    /// Deal from a prepared deck (cards are drawn from the end).
    pub fn from_deck(bet: u64, deck: Vec<u8>) -> Result<Self, GameError> {
        let mut hand = Self {
            bet,
            deck,
            player: Vec::new(),
            dealer: Vec::new(),
            phase: Phase::PlayerTurn,
            result: None,
            settlement: None,
        };
        for _ in 0..2 {
            let card = hand.draw()?;
            hand.player.push(card);
        }
        for _ in 0..2 {
            let card = hand.draw()?;
            hand.dealer.push(card);
        }
        if is_blackjack(&hand.player) || is_blackjack(&hand.dealer) {
            hand.finish();
        }
        Ok(hand)
    }

    fn draw(&mut self) -> Result<u8, GameError> {
        self.deck.pop().ok_or(GameError::DeckExhausted)
    }

    fn finish(&mut self) {
        self.result = Some(resolve(&self.player, &self.dealer, self.bet));
        self.phase = Phase::Complete;
    }

    fn ensure_player_turn(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::PlayerTurn => Ok(()),
            Phase::Complete => Err(GameError::RoundComplete),
        }
    }

    /// Draw one card; a bust ends the round without a dealer draw.
    pub fn hit(&mut self) -> Result<(), GameError> {
        self.ensure_player_turn()?;
        let card = self.draw()?;
        self.player.push(card);
        if hand_value(&self.player).0 > 21 {
            self.finish();
        }
        Ok(())
    }

    /// Hand over to the dealer and settle.
    pub fn stand(&mut self) -> Result<(), GameError> {
        self.ensure_player_turn()?;
        while hand_value(&self.dealer).0 < DEALER_STANDS_ON {
            let card = self.draw()?;
            self.dealer.push(card);
        }
        self.finish();
        Ok(())
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player(&self) -> &[u8] {
        &self.player
    }

    pub fn dealer(&self) -> &[u8] {
        &self.dealer
    }

    /// Dealer cards the player may see: the hole card stays hidden until
    /// the round is over.
    pub fn visible_dealer(&self) -> &[u8] {
        match self.phase {
            Phase::PlayerTurn => &self.dealer[..1],
            Phase::Complete => &self.dealer,
        }
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn settlement(&self) -> Option<Settlement> {
        self.settlement
    }
}

/// Blackjack table bound to a session's wallet.
pub struct Blackjack<S: Store> {
    wallet: Arc<Wallet<S>>,
    hand: Option<Hand>,
}

impl<S: Store> Blackjack<S> {
    pub fn new(wallet: Arc<Wallet<S>>) -> Self {
        Self { wallet, hand: None }
    }

    pub fn hand(&self) -> Option<&Hand> {
        self.hand.as_ref()
    }

    /// Debit `bet` and deal a new hand.
    pub async fn deal(&mut self, bet: u64, rng: &mut GameRng) -> Result<&Hand, GameError> {
        if matches!(&self.hand, Some(hand) if hand.phase == Phase::PlayerTurn) {
            return Err(GameError::RoundInProgress);
        }
        wager(&self.wallet, bet).await?;
        self.hand = Some(Hand::deal(bet, rng)?);
        self.conclude().await
    }

    pub async fn hit(&mut self) -> Result<&Hand, GameError> {
        self.hand.as_mut().ok_or(GameError::NoActiveRound)?.hit()?;
        self.conclude().await
    }

    pub async fn stand(&mut self) -> Result<&Hand, GameError> {
        self.hand.as_mut().ok_or(GameError::NoActiveRound)?.stand()?;
        self.conclude().await
    }

    async fn conclude(&mut self) -> Result<&Hand, GameError> {
        let hand = self.hand.as_mut().ok_or(GameError::NoActiveRound)?;
        if let (Some(result), None) = (hand.result, hand.settlement) {
            let settlement = settle(&self.wallet, GameKind::Blackjack, hand.bet, result).await?;
            hand.settlement = Some(settlement);
        }
        Ok(&*hand)
    }
}
