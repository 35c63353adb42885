use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};

use super::{FundRemote, SyncPayload, PULL_FUNDS_ACTION, PUSH_FUNDS_ACTION};
use crate::error::{SyncError, SyncResult};
use crate::funds::BucketBalances;

/// `FundRemote` over plain HTTP(S), e.g. a spreadsheet web-app script or the
/// bundled sync server.
#[derive(Clone, Debug)]
pub struct HttpSync {
    http: Client,
    endpoint: Url,
}

impl HttpSync {
    pub fn new(endpoint: &str, timeout: Duration) -> SyncResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl FundRemote for HttpSync {
    async fn push(&self, balances: &BucketBalances) -> SyncResult<String> {
        let payload = SyncPayload {
            action: PUSH_FUNDS_ACTION.to_string(),
            data: balances,
        };
        tracing::debug!(endpoint = %self.endpoint, "pushing fund balances");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.text().await?)
    }

    async fn pull(&self) -> SyncResult<BucketBalances> {
        tracing::debug!(endpoint = %self.endpoint, "pulling fund balances");

        let resp = self
            .http
            .get(self.endpoint.clone())
            .query(&[("action", PULL_FUNDS_ACTION)])
            .send()
            .await?;
        let body = ensure_success(resp).await?.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| SyncError::Malformed(e.to_string()))
    }
}

fn parse_endpoint(raw: &str) -> SyncResult<Url> {
    let invalid = |reason: String| SyncError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

async fn ensure_success(resp: Response) -> SyncResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "sync endpoint rejected request");
    Err(SyncError::Status {
        status: status.as_u16(),
        body,
    })
}
