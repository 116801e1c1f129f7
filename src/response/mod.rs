//! Capturing what a handler writes and serializing it back into the
//! gateway's response shape.

mod descriptor;
mod headers;
pub mod mime;
mod writer;

pub use descriptor::ResponseDescriptor;
pub use headers::HeaderTable;
pub use mime::{is_binary, is_text_mime};
pub use writer::{DEFAULT_CONTENT_TYPE, ResponseError, ResponseWriter};
