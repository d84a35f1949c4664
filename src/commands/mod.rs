pub mod parser;
pub mod serialiser;
pub mod types;

pub use parser::{AtResponse, FrameParser, TxStatus};
pub use serialiser::FrameSerialiser;
pub use types::{AtCommand, AtStatus, ModemStatus};
