pub mod handler;

pub use handler::{DispatchStats, Dispatched, FrameDispatcher, FrameHandler};
