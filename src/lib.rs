//! Run ordinary HTTP handlers behind Amazon API Gateway.
//!
//! Incoming REST API (payload 1.0) and HTTP API (payload 2.0) proxy events
//! are translated into [`http::Request`]s, served by a [`Handler`], and the
//! captured response is translated back into the matching proxy response.

pub mod gateway;
pub mod handler;
pub mod models;
pub mod request;
pub mod response;
pub mod utils;

pub use gateway::{Gateway, GatewayBuilder, HandlerProvider};
pub use handler::{Handler, HandlerFn, NotFound, handler_fn};
pub use models::{GatewayError, GatewayEvent, PayloadVersion};
pub use request::{Request, RequestDescriptor, RequestExt};
pub use response::{ResponseDescriptor, ResponseError, ResponseWriter};
