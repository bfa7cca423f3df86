use std::future::Future;

use crate::error::Error;
use crate::types::{Request, Response};

/// Anything that can execute a backend command.
///
/// The production implementation is [`HttpBackend`](crate::HttpBackend);
/// tests substitute in-process fakes. Implementations perform no validation
/// of the request and must return a [`Response`] matching
/// [`Request::command`].
pub trait Backend: Send + Sync + 'static {
    fn invoke(&self, request: Request) -> impl Future<Output = Result<Response, Error>> + Send;
}
