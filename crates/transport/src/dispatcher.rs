use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use config::TransportConfig;
use groups::{Callback, DispatchError, Dispatcher, Method, RequestDescriptor};
use reqwest::Client;
use serde::Deserialize;
use tokio::runtime::Handle;
use url::Url;

use crate::{
    error::{TransportError, TransportResult},
    http_client::http_client_builder,
};

/// Sends group requests to the analytics API over HTTP.
///
/// The descriptor's data is serialized to JSON, base64 encoded and sent as the
/// `data` query parameter. [`Dispatcher::send_request`] returns immediately;
/// the request runs on the tokio runtime the dispatcher was created on and
/// the callback is invoked from there.
#[derive(Clone)]
pub struct HttpDispatcher {
    inner: Arc<Inner>,
    runtime: Handle,
}

struct Inner {
    client: Client,
    base_url: Url,
    geolocate: bool,
    verbose: bool,
    test: bool,
}

impl HttpDispatcher {
    /// Create a dispatcher bound to the current tokio runtime.
    pub fn new(config: &TransportConfig) -> TransportResult<Self> {
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        Self::with_runtime(config, runtime)
    }

    pub fn with_runtime(config: &TransportConfig, runtime: Handle) -> TransportResult<Self> {
        let client = http_client_builder(config).build()?;
        let base_url = base_url(config)?;

        log::debug!("Group requests will be sent to {base_url}");

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base_url,
                geolocate: config.geolocate,
                verbose: config.verbose,
                test: config.test,
            }),
            runtime,
        })
    }

    /// Send a request and wait for the service's answer.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<(), DispatchError> {
        self.inner.send(request).await
    }
}

impl Dispatcher for HttpDispatcher {
    fn send_request(&self, request: RequestDescriptor, callback: Option<Callback>) {
        let inner = self.inner.clone();

        self.runtime.spawn(async move {
            let result = inner.send(&request).await;

            if let Err(ref error) = result {
                log::error!("Failed to send group request to {}: {error}", request.endpoint);
            }

            if let Some(callback) = callback {
                callback(result);
            }
        });
    }
}

impl Inner {
    async fn send(&self, request: &RequestDescriptor) -> Result<(), DispatchError> {
        let data = serde_json::to_vec(&request.data).map_err(|e| DispatchError::Encode(e.to_string()))?;

        let mut query = vec![
            ("data", STANDARD.encode(data)),
            ("ip", flag(self.geolocate).to_string()),
            ("verbose", flag(self.verbose).to_string()),
        ];

        if self.test {
            query.push(("test", "1".to_string()));
        }

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
        };

        let url = self.endpoint_url(request.endpoint);

        log::debug!("{method} {url}");

        let response = self
            .client
            .request(method, url)
            .query(&query)
            .send()
            .await
            .map_err(|e| DispatchError::Connection(e.to_string()))?;

        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::Connection(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(DispatchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        if self.verbose {
            check_verbose_body(&body)
        } else {
            check_plain_body(&body)
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}{endpoint}", self.base_url.path().trim_end_matches('/'));
        url.set_path(&path);

        url
    }
}

fn flag(enabled: bool) -> u8 {
    u8::from(enabled)
}

fn base_url(config: &TransportConfig) -> TransportResult<Url> {
    let url = format!(
        "{}://{}:{}{}",
        config.protocol.scheme(),
        config.host,
        config.effective_port(),
        config.path
    );

    Url::parse(&url).map_err(|e| TransportError::InvalidUrl {
        url,
        reason: e.to_string(),
    })
}

/// Plain mode: the service answers `1` on success and `0` otherwise.
fn check_plain_body(body: &str) -> Result<(), DispatchError> {
    if body.trim() == "1" {
        Ok(())
    } else {
        Err(DispatchError::Rejected(body.to_string()))
    }
}

#[derive(Deserialize)]
struct VerboseResponse {
    status: i64,
    #[serde(default)]
    error: Option<String>,
}

/// Verbose mode: the service answers `{"status": 1|0, "error": ...}`.
fn check_verbose_body(body: &str) -> Result<(), DispatchError> {
    let response: VerboseResponse =
        serde_json::from_str(body).map_err(|e| DispatchError::InvalidResponse(format!("{e}: {body}")))?;

    if response.status == 1 {
        return Ok(());
    }

    Err(DispatchError::Rejected(
        response.error.unwrap_or_else(|| "Unknown error".to_string()),
    ))
}
