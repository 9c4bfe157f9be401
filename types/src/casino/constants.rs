/// Credits granted the first time a principal signs in
pub const INITIAL_CREDITS: u64 = 1_000;

/// Maximum accepted email length (bytes)
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum accepted password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum distinct entries on a roulette bet slip
pub const MAX_ROULETTE_BETS: usize = 20;

/// Highest number on a European wheel
pub const ROULETTE_MAX_NUMBER: u8 = 36;

/// Slot grid dimensions
pub const SLOT_ROWS: usize = 4;
pub const SLOT_COLUMNS: usize = 5;

/// Scratch card layout
pub const SCRATCH_CELLS: usize = 25;
pub const SCRATCH_MAX_VALUE: u8 = 99;

/// Cards in a single deck
pub const DECK_SIZE: u8 = 52;
