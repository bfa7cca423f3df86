// ── Backend gateway ──
//
// Typed wrappers over `Backend::invoke`. Each method issues one command and
// narrows the response to the variant that command produces.

use pcap2socks_api::{
    Backend, Command, InterfaceInfo, Request, Response, RunPayload, RunResponse, StatusResponse,
    TestPayload, TestResponse,
};
use tracing::{debug, warn};

use crate::error::CoreError;

/// Typed command surface over any [`Backend`].
pub struct Gateway<B> {
    backend: B,
}

impl<B: Backend> Gateway<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn call(&self, request: Request) -> Result<Response, CoreError> {
        let command = request.command();
        debug!(%command, "invoking backend");
        match self.backend.invoke(request).await {
            Ok(response) if response.command() == command => Ok(response),
            Ok(response) => {
                warn!(%command, actual = %response.command(), "mismatched backend response");
                Err(CoreError::UnexpectedResponse {
                    command,
                    actual: response.command(),
                })
            }
            Err(e) => {
                warn!(%command, error = %e, "backend command failed");
                Err(CoreError::backend(command, &e))
            }
        }
    }

    pub async fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>, CoreError> {
        match self.call(Request::ListInterfaces).await? {
            Response::Interfaces(list) => Ok(list),
            other => Err(mismatch(Command::ListInterfaces, &other)),
        }
    }

    pub async fn run(&self, payload: RunPayload) -> Result<RunResponse, CoreError> {
        match self.call(Request::Run { payload }).await? {
            Response::Run(resp) => Ok(resp),
            other => Err(mismatch(Command::Run, &other)),
        }
    }

    pub async fn stop(&self) -> Result<(), CoreError> {
        match self.call(Request::Stop).await? {
            Response::Stopped => Ok(()),
            other => Err(mismatch(Command::Stop, &other)),
        }
    }

    pub async fn test(&self, payload: TestPayload) -> Result<TestResponse, CoreError> {
        match self.call(Request::Test { payload }).await? {
            Response::Test(resp) => Ok(resp),
            other => Err(mismatch(Command::Test, &other)),
        }
    }

    pub async fn status(&self) -> Result<StatusResponse, CoreError> {
        match self.call(Request::GetStatus).await? {
            Response::Status(resp) => Ok(resp),
            other => Err(mismatch(Command::GetStatus, &other)),
        }
    }
}

fn mismatch(command: Command, actual: &Response) -> CoreError {
    CoreError::UnexpectedResponse {
        command,
        actual: actual.command(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pcap2socks_api::Error;

    use super::*;

    /// Answers every command with the same canned result.
    struct Canned(fn() -> Result<Response, Error>);

    impl Backend for Canned {
        async fn invoke(&self, _request: Request) -> Result<Response, Error> {
            (self.0)()
        }
    }

    #[tokio::test]
    async fn backend_message_is_kept_verbatim() {
        let gw = Gateway::new(Canned(|| {
            Err(Error::Backend {
                message: "Cannot open device".into(),
            })
        }));
        let err = gw.stop().await.unwrap_err();
        assert!(matches!(
            &err,
            CoreError::Backend { command: Command::Stop, message } if message == "Cannot open device"
        ));
        assert_eq!(err.to_string(), "stop failed: Cannot open device");
    }

    #[tokio::test]
    async fn transport_failures_are_rewrapped() {
        let gw = Gateway::new(Canned(|| Err(Error::Timeout { timeout_secs: 3 })));
        let err = gw.status().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Backend { command: Command::GetStatus, ref message } if message.contains("3s")
        ));
    }

    #[tokio::test]
    async fn mismatched_variant_is_rejected() {
        let gw = Gateway::new(Canned(|| Ok(Response::Stopped)));
        let err = gw.list_interfaces().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnexpectedResponse {
                command: Command::ListInterfaces,
                actual: Command::Stop
            }
        ));
        assert!(gw.stop().await.is_ok());
    }
}
