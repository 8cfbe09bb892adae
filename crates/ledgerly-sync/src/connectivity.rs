//! HTTP connectivity oracle
//!
//! Implements `IConnectivity` by probing the remote base URL with a bounded
//! HEAD request. The answer is never cached and every failure mode,
//! including failure to build or send the probe, reports offline.

use std::time::Duration;

use tracing::debug;

use ledgerly_core::ports::IConnectivity;

/// Probes the remote store's base URL to answer reachability queries
pub struct HttpConnectivity {
    client: reqwest::Client,
    base_url: String,
}

impl HttpConnectivity {
    /// Creates an oracle probing `base_url` with `timeout` per probe.
    /// A client that cannot be built falls back to `reqwest::Client::new()`
    /// with its default timeout behavior.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl IConnectivity for HttpConnectivity {
    async fn is_online(&self) -> bool {
        // Any HTTP response counts as reachable, even an auth rejection;
        // only transport failure means offline.
        match self.client.head(&self.base_url).send().await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "connectivity probe failed");
                false
            }
        }
    }
}
