use super::ROULETTE_MAX_NUMBER;
use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Games offered by the casino.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GameKind {
    Blackjack = 0,
    Slots = 1,
    Roulette = 2,
    Scratch = 3,
    Race = 4,
}

impl Write for GameKind {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for GameKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Blackjack),
            1 => Ok(Self::Slots),
            2 => Ok(Self::Roulette),
            3 => Ok(Self::Scratch),
            4 => Ok(Self::Race),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for GameKind {
    const SIZE: usize = 1;
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blackjack => "blackjack",
            Self::Slots => "slots",
            Self::Roulette => "roulette",
            Self::Scratch => "scratch",
            Self::Race => "race",
        };
        f.write_str(name)
    }
}

/// How a settled round went for the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Push,
    Loss,
}

/// Stake and total return of one settled round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub game: GameKind,
    pub stake: u64,
    pub payout: u64,
}

impl Settlement {
    /// Net change in credits caused by the round.
    pub fn net(&self) -> i128 {
        self.payout as i128 - self.stake as i128
    }
}

impl Write for Settlement {
    fn write(&self, writer: &mut impl BufMut) {
        self.game.write(writer);
        self.stake.write(writer);
        self.payout.write(writer);
    }
}

impl Read for Settlement {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            game: GameKind::read(reader)?,
            stake: u64::read(reader)?,
            payout: u64::read(reader)?,
        })
    }
}

impl FixedSize for Settlement {
    const SIZE: usize = GameKind::SIZE + u64::SIZE + u64::SIZE;
}

const RANKS: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];
const SUITS: [char; 4] = ['♠', '♥', '♦', '♣'];

/// Render a card (0-51, suit = card/13, rank = card%13) as e.g. `A♠`.
pub fn card_label(card: u8) -> String {
    let rank = RANKS[(card % 13) as usize];
    let suit = SUITS[((card / 13) % 4) as usize];
    format!("{rank}{suit}")
}

/// Reel symbols, ordered from rarest to most common.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Wild,
    Diamond,
    Star,
    Bell,
    Lemon,
    Cherry,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::Wild,
        Symbol::Diamond,
        Symbol::Star,
        Symbol::Bell,
        Symbol::Lemon,
        Symbol::Cherry,
    ];

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Wild => "🃏",
            Self::Diamond => "💎",
            Self::Star => "⭐",
            Self::Bell => "🔔",
            Self::Lemon => "🍋",
            Self::Cherry => "🍒",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// A single roulette wager target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum BetKind {
    /// Single number 0-36
    Straight(u8),
    Red,
    Black,
    Even,
    Odd,
    /// 1-18
    Low,
    /// 19-36
    High,
    /// 0 = 1-12, 1 = 13-24, 2 = 25-36
    Dozen(u8),
    /// 0 = 1,4,..,34; 1 = 2,5,..,35; 2 = 3,6,..,36
    Column(u8),
}

impl BetKind {
    /// Whether the target is within the table layout.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Straight(n) => *n <= ROULETTE_MAX_NUMBER,
            Self::Dozen(n) | Self::Column(n) => *n < 3,
            _ => true,
        }
    }
}

/// Pocket color on the wheel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Green,
    Red,
    Black,
}

/// Scratch card prize tiers keyed by the largest group of equal values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Pair,
    Triple,
    Quad,
    Jackpot,
}

impl Tier {
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            0 | 1 => None,
            2 => Some(Self::Pair),
            3 => Some(Self::Triple),
            4 => Some(Self::Quad),
            _ => Some(Self::Jackpot),
        }
    }

    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Pair => 2,
            Self::Triple => 8,
            Self::Quad => 20,
            Self::Jackpot => 50,
        }
    }
}

/// Race circuits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Monza,
    Monaco,
    Silverstone,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Monza, Track::Monaco, Track::Silverstone];
}

/// Race competitors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    Ver,
    Ham,
    Lec,
    Nor,
    Alo,
    Pia,
    Tsu,
    Str,
    Sai,
    Alb,
    Rus,
    Ant,
}

impl Driver {
    pub const ALL: [Driver; 12] = [
        Driver::Ver,
        Driver::Ham,
        Driver::Lec,
        Driver::Nor,
        Driver::Alo,
        Driver::Pia,
        Driver::Tsu,
        Driver::Str,
        Driver::Sai,
        Driver::Alb,
        Driver::Rus,
        Driver::Ant,
    ];
}
