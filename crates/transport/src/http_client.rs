use std::time::Duration;

use config::TransportConfig;
use reqwest::{
    Client,
    header::{CONNECTION, HeaderMap, HeaderValue},
};

pub(crate) fn http_client_builder(config: &TransportConfig) -> reqwest::ClientBuilder {
    let mut headers = HeaderMap::new();

    let builder = if config.keepalive {
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        // There is no TTL on pooled connections, a short idle timeout is what
        // lets us pick up DNS changes.
        Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(5)))
            .tcp_keepalive(Some(Duration::from_secs(60)))
    } else {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        Client::builder().pool_max_idle_per_host(0)
    };

    builder
        .timeout(config.timeout)
        .tcp_nodelay(true)
        .default_headers(headers)
}
