pub mod decoder;
pub mod framing;

pub use decoder::{read_frame, DecodeError, ReadTimeouts};
pub use framing::{checksum, encode_frame, ApiFrame, EncodeError, FrameType};
