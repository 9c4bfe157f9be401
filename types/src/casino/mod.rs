mod codec;
mod constants;
mod game;

pub use codec::{read_array, read_bytes, read_string, string_encode_size, write_string};
pub use constants::*;
pub use game::*;
