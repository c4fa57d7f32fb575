use crate::rules::{Blocklist, BlocklistStore, RuleConfig};
use std::time::Duration;

/// Where the maintained rule list is published.
pub const DEFAULT_UPDATE_URL: &str =
    "https://raw.githubusercontent.com/ahmedthebest31/PureLink/main/rules.json";

pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a remote update was refused. The active blocklist is left untouched
/// in every case.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("server returned status: {0}")]
    Status(u16),
    #[error("invalid rule format: {0}")]
    Malformed(#[source] reqwest::Error),
    #[error("downloaded rules are empty")]
    Empty,
}

pub fn update_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(UPDATE_TIMEOUT).build()
}

/// Download and validate a blocklist in the `{"blocklist": [...]}` format.
pub async fn fetch_blocklist(
    client: &reqwest::Client,
    url: &str,
) -> Result<Blocklist, UpdateError> {
    let resp = client.get(url).send().await.map_err(UpdateError::Network)?;

    if !resp.status().is_success() {
        return Err(UpdateError::Status(resp.status().as_u16()));
    }

    let config: RuleConfig = resp.json().await.map_err(UpdateError::Malformed)?;
    if config.blocklist.is_empty() {
        return Err(UpdateError::Empty);
    }

    Ok(Blocklist::new(config.blocklist))
}

impl BlocklistStore {
    /// Fetch the list at `url` and swap it in. Returns the new rule count.
    pub async fn update_from_remote(
        &self,
        client: &reqwest::Client,
        url: &str,
    ) -> Result<usize, UpdateError> {
        let blocklist = fetch_blocklist(client, url).await?;
        let amount = blocklist.len();
        self.replace(blocklist);
        tracing::debug!("blocklist updated from {url}: {amount} rules");
        Ok(amount)
    }
}
