pub mod traits;

#[cfg(feature = "embedded")]
pub mod embedded;

pub use traits::{Transport, TransportError};

#[cfg(feature = "embedded")]
pub use embedded::EmbassyTransport;
