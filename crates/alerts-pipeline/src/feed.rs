//! NWS alert feed client.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use alerts_common::{Alert, AlertError, AlertResult};

/// Media type requested from api.weather.gov.
pub const GEO_JSON: &str = "application/geo+json";

/// Connection settings for the NWS API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Base URL, e.g. `https://api.weather.gov`.
    pub base_url: String,
    /// NWS asks every client to identify itself.
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weather.gov".to_string(),
            user_agent: "weather-alerts (ops@example.com)".to_string(),
            timeout_secs: 20,
        }
    }
}

impl FeedConfig {
    pub fn active_url(&self) -> String {
        format!("{}/alerts/active", self.base_url.trim_end_matches('/'))
    }

    pub fn point_url(&self, lat: f64, lon: f64) -> String {
        format!("{}?point={:.4},{:.4}", self.active_url(), lat, lon)
    }
}

/// Anything that can list active alerts.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// The full active-alerts set.
    async fn active_alerts(&self) -> AlertResult<Vec<Alert>>;

    /// Alerts covering one point.
    async fn alerts_at_point(&self, lat: f64, lon: f64) -> AlertResult<Vec<Alert>>;
}

/// Build the shared HTTP client used for feed and zone requests.
pub fn build_http_client(config: &FeedConfig) -> AlertResult<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(GEO_JSON));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(8)
        .build()
        .map_err(|e| AlertError::Config(format!("failed to create HTTP client: {}", e)))
}

/// Fetch a URL and decode its JSON body, mapping transport failures.
pub(crate) async fn get_json(client: &Client, url: &str) -> AlertResult<Value> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AlertError::Timeout
        } else {
            AlertError::Upstream(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AlertError::UpstreamStatus {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AlertError::InvalidFeed(e.to_string()))
}

/// [`AlertSource`] backed by api.weather.gov.
#[derive(Clone)]
pub struct NwsFeedClient {
    client: Client,
    config: FeedConfig,
}

impl NwsFeedClient {
    pub fn new(config: FeedConfig) -> AlertResult<Self> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: FeedConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

#[async_trait]
impl AlertSource for NwsFeedClient {
    #[instrument(skip(self))]
    async fn active_alerts(&self) -> AlertResult<Vec<Alert>> {
        let body = get_json(&self.client, &self.config.active_url()).await?;
        let alerts = Alert::from_feature_collection(body)?;
        debug!(count = alerts.len(), "Fetched active alerts");
        Ok(alerts)
    }

    #[instrument(skip(self))]
    async fn alerts_at_point(&self, lat: f64, lon: f64) -> AlertResult<Vec<Alert>> {
        let body = get_json(&self.client, &self.config.point_url(lat, lon)).await?;
        Alert::from_feature_collection(body)
    }
}
