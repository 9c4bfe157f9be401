//! Five-reel, four-row slot machine with ten fixed paylines.
//!
//! Each payline is read left to right. The target symbol is the first
//! non-wild on the line (wild when the whole line is wild), and the run is
//! the number of leading cells equal to the target or wild. Runs of three or
//! more pay `per-line stake × multiplier`, where the per-line stake is a
//! tenth of the bet (at least one credit).

use super::{settle, wager, GameError, GameResult, GameRng};
use crate::{state::Store, wallet::Wallet};
use casino_types::casino::{GameKind, Settlement, Symbol, SLOT_COLUMNS, SLOT_ROWS};
use std::sync::Arc;

/// Minimum run length that pays.
pub const MIN_RUN: usize = 3;

/// Extra multiplier for a full five-symbol run.
const FULL_LINE_BONUS: f64 = 1.25;

/// Bonus added per wild substituting in a non-wild run.
const WILD_BONUS: f64 = 0.10;

pub type Grid = [[Symbol; SLOT_COLUMNS]; SLOT_ROWS];

/// A fixed path through the grid, one `(row, column)` per reel.
#[derive(Clone, Copy, Debug)]
pub struct Payline {
    pub name: &'static str,
    pub cells: [(usize, usize); SLOT_COLUMNS],
}

pub const PAYLINES: [Payline; 10] = [
    Payline {
        name: "row 1",
        cells: [(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)],
    },
    Payline {
        name: "row 2",
        cells: [(1, 0), (1, 1), (1, 2), (1, 3), (1, 4)],
    },
    Payline {
        name: "row 3",
        cells: [(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)],
    },
    Payline {
        name: "row 4",
        cells: [(3, 0), (3, 1), (3, 2), (3, 3), (3, 4)],
    },
    Payline {
        name: "diagonal down",
        cells: [(0, 0), (1, 1), (2, 2), (3, 3), (3, 4)],
    },
    Payline {
        name: "diagonal up",
        cells: [(3, 0), (2, 1), (1, 2), (0, 3), (0, 4)],
    },
    Payline {
        name: "zigzag high",
        cells: [(0, 0), (1, 1), (0, 2), (1, 3), (0, 4)],
    },
    Payline {
        name: "zigzag low",
        cells: [(3, 0), (2, 1), (3, 2), (2, 3), (3, 4)],
    },
    Payline {
        name: "v",
        cells: [(1, 0), (0, 1), (1, 2), (2, 3), (1, 4)],
    },
    Payline {
        name: "w",
        cells: [(2, 0), (3, 1), (2, 2), (1, 3), (2, 4)],
    },
];

/// Draw weight out of 100.
pub fn weight(symbol: Symbol) -> u8 {
    match symbol {
        Symbol::Wild => 3,
        Symbol::Diamond => 10,
        Symbol::Star => 15,
        Symbol::Bell => 20,
        Symbol::Lemon => 24,
        Symbol::Cherry => 28,
    }
}

/// Multiplier of a three-symbol run.
pub fn base_multiplier(symbol: Symbol) -> f64 {
    match symbol {
        Symbol::Wild => 6.0,
        Symbol::Diamond => 5.0,
        Symbol::Star => 3.0,
        Symbol::Bell => 2.0,
        Symbol::Lemon => 1.5,
        Symbol::Cherry => 1.2,
    }
}

pub fn draw_symbol(rng: &mut GameRng) -> Symbol {
    let mut roll = rng.next_bounded(100);
    for symbol in Symbol::ALL {
        let weight = weight(symbol);
        if roll < weight {
            return symbol;
        }
        roll -= weight;
    }
    Symbol::Cherry
}

pub fn draw_grid(rng: &mut GameRng) -> Grid {
    let mut grid = [[Symbol::Cherry; SLOT_COLUMNS]; SLOT_ROWS];
    for row in grid.iter_mut() {
        for cell in row.iter_mut() {
            *cell = draw_symbol(rng);
        }
    }
    grid
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineMatch {
    pub symbol: Symbol,
    pub count: usize,
    /// Wilds standing in for a non-wild target
    pub wilds: usize,
}

impl LineMatch {
    pub fn multiplier(&self) -> f64 {
        let mut multiplier = base_multiplier(self.symbol) * (self.count - 2) as f64;
        if self.count == SLOT_COLUMNS {
            multiplier *= FULL_LINE_BONUS;
        }
        if self.symbol != Symbol::Wild && self.wilds > 0 {
            multiplier *= 1.0 + WILD_BONUS * self.wilds as f64;
        }
        multiplier
    }
}

/// Find the paying run at the start of a line, if any.
pub fn evaluate_line(symbols: &[Symbol; SLOT_COLUMNS], wild_substitution: bool) -> Option<LineMatch> {
    let target = if wild_substitution {
        symbols
            .iter()
            .copied()
            .find(|symbol| *symbol != Symbol::Wild)
            .unwrap_or(Symbol::Wild)
    } else {
        symbols[0]
    };

    let mut count = 0;
    let mut wilds = 0;
    for &symbol in symbols {
        if symbol == target {
            count += 1;
        } else if wild_substitution && symbol == Symbol::Wild {
            count += 1;
            wilds += 1;
        } else {
            break;
        }
    }

    (count >= MIN_RUN).then_some(LineMatch {
        symbol: target,
        count,
        wilds,
    })
}

pub fn line_stake(bet: u64) -> u64 {
    (bet / PAYLINES.len() as u64).max(1)
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineWin {
    pub line: &'static str,
    pub matched: LineMatch,
    pub multiplier: f64,
    pub amount: u64,
}

/// Evaluate every payline of `grid` for a spin of `bet`.
pub fn evaluate(grid: &Grid, bet: u64, wild_substitution: bool) -> Vec<LineWin> {
    let stake = line_stake(bet);
    PAYLINES
        .iter()
        .filter_map(|payline| {
            let symbols = payline.cells.map(|(row, column)| grid[row][column]);
            let matched = evaluate_line(&symbols, wild_substitution)?;
            let multiplier = matched.multiplier();
            Some(LineWin {
                line: payline.name,
                matched,
                multiplier,
                amount: (stake as f64 * multiplier).floor() as u64,
            })
        })
        .collect()
}

/// Sum of line wins, capped at `u64::MAX`.
pub fn total_payout(wins: &[LineWin]) -> u64 {
    wins.iter()
        .fold(0u64, |total, win| total.saturating_add(win.amount))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotsConfig {
    pub wild_substitution: bool,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            wild_substitution: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Spin {
    pub bet: u64,
    pub grid: Grid,
    pub wins: Vec<LineWin>,
    pub settlement: Settlement,
}

/// Slot machine bound to a session's wallet.
pub struct Slots<S: Store> {
    wallet: Arc<Wallet<S>>,
    config: SlotsConfig,
}

impl<S: Store> Slots<S> {
    pub fn new(wallet: Arc<Wallet<S>>, config: SlotsConfig) -> Self {
        Self { wallet, config }
    }

    pub async fn spin(&self, bet: u64, rng: &mut GameRng) -> Result<Spin, GameError> {
        wager(&self.wallet, bet).await?;
        let grid = draw_grid(rng);
        let wins = evaluate(&grid, bet, self.config.wild_substitution);
        let payout = total_payout(&wins);
        let settlement = settle(
            &self.wallet,
            GameKind::Slots,
            bet,
            GameResult::from_payout(payout),
        )
        .await?;
        Ok(Spin {
            bet,
            grid,
            wins,
            settlement,
        })
    }
}
