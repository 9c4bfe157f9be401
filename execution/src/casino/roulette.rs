//! Single-zero roulette with a multi-bet slip.
//!
//! Bets accumulate on a [BetSlip] until the wheel is spun. Spinning debits
//! the slip total in one wallet transaction, resolves every bet against the
//! same pocket, and credits the combined return.
//!
//! Returns (stake included):
//! - Straight: 36x
//! - Dozen, Column: 3x
//! - Red, Black, Even, Odd, Low, High: 2x
//!
//! Zero loses every bet except a straight bet on zero.

use super::{settle, wager, GameError, GameResult, GameRng};
use crate::{state::Store, wallet::Wallet};
use casino_types::casino::{BetKind, Color, GameKind, Settlement, MAX_ROULETTE_BETS};
use std::sync::Arc;

/// Red numbers on a roulette wheel.
pub const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

pub fn is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

pub fn color(number: u8) -> Color {
    if number == 0 {
        Color::Green
    } else if is_red(number) {
        Color::Red
    } else {
        Color::Black
    }
}

/// Check if a bet wins for a given pocket.
pub fn bet_wins(bet: BetKind, result: u8) -> bool {
    if result == 0 {
        return bet == BetKind::Straight(0);
    }
    match bet {
        BetKind::Straight(number) => number == result,
        BetKind::Red => is_red(result),
        BetKind::Black => !is_red(result),
        BetKind::Even => result % 2 == 0,
        BetKind::Odd => result % 2 == 1,
        BetKind::Low => (1..=18).contains(&result),
        BetKind::High => (19..=36).contains(&result),
        BetKind::Dozen(dozen) => (result - 1) / 12 == dozen,
        BetKind::Column(column) => (result - 1) % 3 == column,
    }
}

/// Total return multiplier of a winning bet (includes the original bet).
pub fn return_multiplier(bet: BetKind) -> u64 {
    match bet {
        BetKind::Straight(_) => 36,
        BetKind::Dozen(_) | BetKind::Column(_) => 3,
        BetKind::Red
        | BetKind::Black
        | BetKind::Even
        | BetKind::Odd
        | BetKind::Low
        | BetKind::High => 2,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedBet {
    pub kind: BetKind,
    pub amount: u64,
}

/// Pending bets of the next spin.
#[derive(Clone, Debug, Default)]
pub struct BetSlip {
    bets: Vec<PlacedBet>,
}

impl BetSlip {
    /// Add `amount` on `kind`, merging with an existing bet on the same target.
    pub fn add(&mut self, kind: BetKind, amount: u64) -> Result<(), GameError> {
        if !kind.is_valid() {
            return Err(GameError::InvalidBet);
        }
        if amount == 0 {
            return Err(GameError::InvalidWager);
        }
        // The slip total is the round stake and must stay representable
        self.total()
            .checked_add(amount)
            .ok_or(GameError::InvalidWager)?;
        if let Some(existing) = self.bets.iter_mut().find(|bet| bet.kind == kind) {
            existing.amount += amount;
            return Ok(());
        }
        if self.bets.len() >= MAX_ROULETTE_BETS {
            return Err(GameError::TooManyBets {
                max: MAX_ROULETTE_BETS,
            });
        }
        self.bets.push(PlacedBet { kind, amount });
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<PlacedBet> {
        (index < self.bets.len()).then(|| self.bets.remove(index))
    }

    pub fn clear(&mut self) {
        self.bets.clear();
    }

    pub fn bets(&self) -> &[PlacedBet] {
        &self.bets
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.bets.iter().map(|bet| bet.amount).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetResult {
    pub bet: PlacedBet,
    pub won: bool,
    pub payout: u64,
}

/// Total return of a resolved slip, capped at `u64::MAX`.
pub fn total_payout(results: &[BetResult]) -> u64 {
    results
        .iter()
        .fold(0u64, |total, result| total.saturating_add(result.payout))
}

pub fn resolve(bets: &[PlacedBet], number: u8) -> Vec<BetResult> {
    bets.iter()
        .map(|bet| {
            let won = bet_wins(bet.kind, number);
            let payout = if won {
                bet.amount.saturating_mul(return_multiplier(bet.kind))
            } else {
                0
            };
            BetResult {
                bet: *bet,
                won,
                payout,
            }
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct Spin {
    pub number: u8,
    pub color: Color,
    pub results: Vec<BetResult>,
    pub settlement: Settlement,
}

/// Roulette table bound to a session's wallet.
pub struct Roulette<S: Store> {
    wallet: Arc<Wallet<S>>,
    slip: BetSlip,
}

impl<S: Store> Roulette<S> {
    pub fn new(wallet: Arc<Wallet<S>>) -> Self {
        Self {
            wallet,
            slip: BetSlip::default(),
        }
    }

    pub fn slip(&self) -> &BetSlip {
        &self.slip
    }

    pub fn slip_mut(&mut self) -> &mut BetSlip {
        &mut self.slip
    }

    /// Spin the wheel for every bet on the slip.
    ///
    /// The slip is kept when the debit fails and cleared once the round
    /// settles.
    pub async fn spin(&mut self, rng: &mut GameRng) -> Result<Spin, GameError> {
        if self.slip.is_empty() {
            return Err(GameError::EmptySlip);
        }
        let stake = self.slip.total();
        wager(&self.wallet, stake).await?;

        let number = rng.spin_roulette();
        let results = resolve(self.slip.bets(), number);
        self.slip.clear();

        let payout = total_payout(&results);
        let settlement = settle(
            &self.wallet,
            GameKind::Roulette,
            stake,
            GameResult::from_payout(payout),
        )
        .await?;
        Ok(Spin {
            number,
            color: color(number),
            results,
            settlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{create_rng, create_wallet},
        state::Memory,
        wallet::WalletError,
    };
    use commonware_runtime::{deterministic::Runner, Runner as _};

    #[test]
    fn test_colors() {
        assert_eq!(color(0), Color::Green);
        assert_eq!(color(1), Color::Red);
        assert_eq!(color(2), Color::Black);
        assert_eq!(color(36), Color::Red);
        assert_eq!(
            (1..=36).filter(|n| color(*n) == Color::Red).count(),
            RED_NUMBERS.len()
        );
    }

    #[test]
    fn test_red_wins_only_on_red_pockets() {
        for number in 0..=36 {
            assert_eq!(
                bet_wins(BetKind::Red, number),
                number != 0 && RED_NUMBERS.contains(&number)
            );
        }
    }

    #[test]
    fn test_zero_loses_outside_bets() {
        for bet in [
            BetKind::Red,
            BetKind::Black,
            BetKind::Even,
            BetKind::Odd,
            BetKind::Low,
            BetKind::High,
            BetKind::Dozen(0),
            BetKind::Column(0),
            BetKind::Straight(1),
        ] {
            assert!(!bet_wins(bet, 0));
        }
        assert!(bet_wins(BetKind::Straight(0), 0));
    }

    #[test]
    fn test_dozens_and_columns() {
        assert!(bet_wins(BetKind::Dozen(0), 12));
        assert!(bet_wins(BetKind::Dozen(1), 13));
        assert!(bet_wins(BetKind::Dozen(2), 36));
        assert!(bet_wins(BetKind::Column(0), 34));
        assert!(bet_wins(BetKind::Column(1), 35));
        assert!(bet_wins(BetKind::Column(2), 36));
        assert!(!bet_wins(BetKind::Column(0), 36));
    }

    #[test]
    fn test_slip_merges_and_limits() {
        let mut slip = BetSlip::default();
        slip.add(BetKind::Red, 10).unwrap();
        slip.add(BetKind::Red, 5).unwrap();
        assert_eq!(slip.bets().len(), 1);
        assert_eq!(slip.total(), 15);

        assert_eq!(slip.add(BetKind::Straight(37), 1), Err(GameError::InvalidBet));
        assert_eq!(slip.add(BetKind::Dozen(3), 1), Err(GameError::InvalidBet));
        assert_eq!(slip.add(BetKind::Black, 0), Err(GameError::InvalidWager));

        for number in 0..(MAX_ROULETTE_BETS as u8 - 1) {
            slip.add(BetKind::Straight(number), 1).unwrap();
        }
        assert_eq!(
            slip.add(BetKind::Black, 1),
            Err(GameError::TooManyBets {
                max: MAX_ROULETTE_BETS
            })
        );
        // Merging into an existing bet is still allowed at the limit
        slip.add(BetKind::Straight(0), 1).unwrap();

        assert_eq!(
            slip.remove(0),
            Some(PlacedBet {
                kind: BetKind::Red,
                amount: 15
            })
        );
        assert_eq!(slip.remove(100), None);
        slip.clear();
        assert!(slip.is_empty());
        assert_eq!(slip.total(), 0);
    }

    #[test]
    fn test_slip_total_cannot_overflow() {
        let mut slip = BetSlip::default();
        slip.add(BetKind::Red, u64::MAX - 1).unwrap();
        assert_eq!(slip.add(BetKind::Black, 2), Err(GameError::InvalidWager));
        assert_eq!(slip.add(BetKind::Red, 2), Err(GameError::InvalidWager));
        assert_eq!(slip.total(), u64::MAX - 1);

        slip.add(BetKind::Black, 1).unwrap();
        assert_eq!(slip.total(), u64::MAX);
        assert_eq!(slip.bets().len(), 2);
    }

    #[test]
    fn test_resolve_pays_total_return() {
        let bets = [
            PlacedBet {
                kind: BetKind::Straight(7),
                amount: 10,
            },
            PlacedBet {
                kind: BetKind::Red,
                amount: 10,
            },
            PlacedBet {
                kind: BetKind::Dozen(1),
                amount: 10,
            },
        ];
        let results = resolve(&bets, 7);
        assert_eq!(
            results.iter().map(|r| r.payout).collect::<Vec<_>>(),
            vec![360, 20, 0]
        );
    }

    #[test]
    fn test_total_payout_saturates() {
        let bets = [
            PlacedBet {
                kind: BetKind::Red,
                amount: 6_000_000_000_000_000_000,
            },
            PlacedBet {
                kind: BetKind::Odd,
                amount: 6_000_000_000_000_000_000,
            },
        ];
        let results = resolve(&bets, 1);
        assert!(results.iter().all(|result| result.won));
        assert_eq!(total_payout(&results), u64::MAX);
        assert_eq!(total_payout(&resolve(&bets, 2)), 0);
    }

    #[test]
    fn test_large_winning_spin_settles() {
        let executor = Runner::default();
        executor.start(|_| async move {
            for seed in 0..20 {
                let stake = 6_000_000_000_000_000_000;
                let (wallet, _) =
                    create_wallet(Memory::default(), 18_000_000_000_000_000_000).await;
                let wallet = Arc::new(wallet);
                let mut table = Roulette::new(wallet.clone());
                table.slip_mut().add(BetKind::Red, stake).unwrap();
                table.slip_mut().add(BetKind::Black, stake).unwrap();
                table.slip_mut().add(BetKind::Odd, stake).unwrap();

                let mut rng = create_rng(seed);
                let spin = table.spin(&mut rng).await.unwrap();
                assert_eq!(spin.settlement.stake, 3 * stake);
                let expected = match spin.number {
                    0 => 0,
                    n if n % 2 == 1 => u64::MAX,
                    _ => 2 * stake,
                };
                assert_eq!(spin.settlement.payout, expected);
                assert_eq!(wallet.balance(), expected);
            }
        });
    }

    #[test]
    fn test_spin_requires_bets() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let (wallet, _) = create_wallet(Memory::default(), 100).await;
            let mut table = Roulette::new(Arc::new(wallet));
            let mut rng = create_rng(3);
            assert!(matches!(
                table.spin(&mut rng).await,
                Err(GameError::EmptySlip)
            ));
        });
    }

    #[test]
    fn test_unaffordable_slip_is_kept() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let (wallet, _) = create_wallet(Memory::default(), 10).await;
            let mut table = Roulette::new(Arc::new(wallet));
            table.slip_mut().add(BetKind::Odd, 11).unwrap();
            let mut rng = create_rng(3);
            assert!(matches!(
                table.spin(&mut rng).await,
                Err(GameError::Wallet(WalletError::InsufficientFunds { .. }))
            ));
            assert_eq!(table.slip().total(), 11);
        });
    }

    #[test]
    fn test_spin_settles_and_clears_slip() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let (wallet, _) = create_wallet(Memory::default(), 1_000).await;
            let wallet = Arc::new(wallet);
            let mut table = Roulette::new(wallet.clone());
            let mut rng = create_rng(11);

            for _ in 0..20 {
                table.slip_mut().add(BetKind::Red, 5).unwrap();
                table.slip_mut().add(BetKind::Black, 5).unwrap();
                let before = wallet.balance();
                let spin = table.spin(&mut rng).await.unwrap();
                assert!(table.slip().is_empty());
                assert_eq!(spin.settlement.stake, 10);
                assert_eq!(spin.color, color(spin.number));
                let expected = if spin.number == 0 { 0 } else { 10 };
                assert_eq!(spin.settlement.payout, expected);
                assert_eq!(
                    wallet.balance() as i128,
                    before as i128 + spin.settlement.net()
                );
            }
        });
    }
}
