use crate::{
    casino::{BetKind, Color, Driver, Outcome, Settlement, Symbol, Tier, Track},
    Principal,
};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};

/// Convert a client-supplied amount into whole credits.
///
/// Fractions are floored. Non-finite values and anything below one credit
/// after flooring are rejected.
pub fn parse_amount(amount: f64) -> Option<u64> {
    if !amount.is_finite() {
        return None;
    }
    let floored = amount.floor();
    if floored < 1.0 || floored >= u64::MAX as f64 {
        return None;
    }
    Some(floored as u64)
}

/// Frame pushed over the updates WebSocket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    /// Committed balance of the signed-in principal
    Credits(u64),
    /// A round finished
    Settled(Settlement),
    /// The session was closed
    SignedOut,
}

impl Write for Update {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Credits(credits) => {
                0u8.write(writer);
                credits.write(writer);
            }
            Self::Settled(settlement) => {
                1u8.write(writer);
                settlement.write(writer);
            }
            Self::SignedOut => 2u8.write(writer),
        }
    }
}

impl Read for Update {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let update = match u8::read(reader)? {
            0 => Self::Credits(u64::read(reader)?),
            1 => Self::Settled(Settlement::read(reader)?),
            2 => Self::SignedOut,
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(update)
    }
}

impl EncodeSize for Update {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Credits(_) => u64::SIZE,
            Self::Settled(_) => Settlement::SIZE,
            Self::SignedOut => 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub principal: Principal,
    pub credits: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub credits: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Any single-amount request: a wager or a deposit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackPhase {
    PlayerTurn,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlackjackView {
    pub bet: u64,
    pub player: Vec<String>,
    pub player_value: u8,
    /// Only the up card while the player is still acting
    pub dealer: Vec<String>,
    pub dealer_value: u8,
    pub phase: BlackjackPhase,
    pub outcome: Option<Outcome>,
    pub payout: u64,
    pub credits: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineWinView {
    pub line: String,
    pub symbol: Symbol,
    pub count: usize,
    pub wilds: usize,
    pub multiplier: f64,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotsView {
    pub bet: u64,
    pub grid: Vec<Vec<Symbol>>,
    pub wins: Vec<LineWinView>,
    pub payout: u64,
    pub credits: u64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BetRequest {
    pub bet: BetKind,
    pub amount: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouletteRequest {
    pub bets: Vec<BetRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetResultView {
    pub bet: BetKind,
    pub amount: u64,
    pub won: bool,
    pub payout: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteView {
    pub number: u8,
    pub color: Color,
    pub bets: Vec<BetResultView>,
    pub stake: u64,
    pub payout: u64,
    pub credits: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScratchView {
    pub bet: u64,
    /// Revealed values, `None` while still covered
    pub cells: Vec<Option<u8>>,
    /// Cells sharing the value of the most recent reveal
    pub matches: Vec<usize>,
    pub complete: bool,
    pub tier: Option<Tier>,
    pub payout: u64,
    pub credits: u64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RaceRequest {
    pub track: Track,
    pub driver: Driver,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub driver: Driver,
    pub name: String,
    pub car: String,
    pub expected: f64,
    pub probability: f64,
    pub multiplier: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceFieldResponse {
    pub track: Track,
    pub entries: Vec<FieldEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingView {
    pub driver: Driver,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceView {
    pub track: Track,
    pub driver: Driver,
    pub bet: u64,
    pub standings: Vec<StandingView>,
    pub multiplier: f64,
    pub payout: u64,
    pub credits: u64,
}
