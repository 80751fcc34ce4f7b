use std::time::Duration;

use anyhow::Context;

use crate::model::DisplayStateSnapshot;
use crate::sync::SnapshotSource;

/// Path of the snapshot endpoint, relative to the engine's base URL.
pub const DISPLAY_STATE_PATH: &str = "/api/v1/display-state";

/// Fetches snapshots from a running engine over HTTP.
#[derive(Clone)]
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSnapshotSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            url: display_state_url(base_url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> anyhow::Result<DisplayStateSnapshot> {
        let res = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()?;
        let snapshot = res.json::<DisplayStateSnapshot>().await?;
        Ok(snapshot)
    }
}

fn display_state_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), DISPLAY_STATE_PATH)
}
