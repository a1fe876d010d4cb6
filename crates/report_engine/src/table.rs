use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use report_core::{NewReport, Report};

use crate::client::{authorize, decode_error, map_reqwest_error, send};
use crate::{FailureKind, RemoteError, RemoteSettings};

/// The relational table holding one row per uploaded statement.
#[async_trait::async_trait]
pub trait ReportTable: Send + Sync {
    async fn insert(&self, report: &NewReport) -> Result<Report, RemoteError>;

    /// Every row, newest `created_at` first.
    async fn select_all(&self) -> Result<Vec<Report>, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestReportTable {
    client: reqwest::Client,
    settings: Arc<RemoteSettings>,
}

impl ReqwestReportTable {
    pub fn new(client: reqwest::Client, settings: Arc<RemoteSettings>) -> Self {
        Self { client, settings }
    }

    async fn read_rows(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<Report>, RemoteError> {
        let response = send(authorize(request, &self.settings.api_key)).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(decode_error)
    }
}

#[async_trait::async_trait]
impl ReportTable for ReqwestReportTable {
    async fn insert(&self, report: &NewReport) -> Result<Report, RemoteError> {
        let url = self.settings.endpoint(&["rest", "v1", self.settings.table.as_str()])?;
        let body = serde_json::to_vec(report).map_err(decode_error)?;
        let request = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("Prefer", "return=representation")
            .body(body);

        self.read_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::new(FailureKind::Decode, "insert returned no rows"))
    }

    async fn select_all(&self) -> Result<Vec<Report>, RemoteError> {
        let mut url = self.settings.endpoint(&["rest", "v1", self.settings.table.as_str()])?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        let request = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .header(ACCEPT, "application/json");
        self.read_rows(request).await
    }
}
