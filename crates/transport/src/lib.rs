//! HTTP transport for group requests.

mod dispatcher;
mod error;
mod http_client;

pub use dispatcher::HttpDispatcher;
pub use error::{TransportError, TransportResult as Result};
