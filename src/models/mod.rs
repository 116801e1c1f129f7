pub mod error;
pub mod event;
pub mod v1;
pub mod v2;

pub use error::GatewayError;
pub use event::{GatewayEvent, PayloadVersion};
pub use v1::*;
pub use v2::*;
