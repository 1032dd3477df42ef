use std::sync::Arc;

use thiserror::Error;

use crate::RequestDescriptor;

/// Completion callback, invoked by the dispatcher once the request settles.
pub type Callback = Box<dyn FnOnce(Result<(), DispatchError>) + Send + 'static>;

/// Transmits request descriptors to the analytics service.
///
/// Implementations must not block the caller; the outcome is only reported
/// through the callback, if one was given.
pub trait Dispatcher: Send + Sync {
    fn send_request(&self, request: RequestDescriptor, callback: Option<Callback>);
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn send_request(&self, request: RequestDescriptor, callback: Option<Callback>) {
        (**self).send_request(request, callback)
    }
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn send_request(&self, request: RequestDescriptor, callback: Option<Callback>) {
        (**self).send_request(request, callback)
    }
}

/// Errors reported to completion callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The descriptor could not be encoded for transmission.
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// The request never reached the service.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The service answered with a non-success HTTP status.
    #[error("HTTP error ({status}): {body}")]
    Http { status: u16, body: String },

    /// The service received the request but refused it.
    #[error("Server error: {0}")]
    Rejected(String),

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
