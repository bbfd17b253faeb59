//! 802.11 Frame Parsing

mod frame;
mod management;

pub use frame::*;
pub use management::*;
