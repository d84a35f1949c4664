pub mod device;
pub mod lr;
pub mod packet;
pub mod traits;

pub use device::{RadioStats, XBeeCore};
pub use lr::XBeeLr;
pub use packet::LrPacket;
pub use traits::{Callbacks, CommandError, DeliveryStatus, Radio, RadioState, SendError};
