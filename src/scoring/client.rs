//! スコアリングサービスのHTTPクライアント

use super::response::ScoringResponse;
use super::wire::ScoreRequest;
use crate::config::{Endpoint, ServiceConfig};
use crate::error::{Error, Result};
use crate::parameters::RequestParameters;
use crate::table::TimeSeriesTable;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, trace, warn};

/// スコアリングサービスの共通インターフェース
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// テーブルとパラメータを送信し、結果を受け取る
    ///
    /// 成功ステータスで本文が空の場合は `Ok(None)` を返す。
    async fn score(
        &self,
        table: &TimeSeriesTable,
        params: &RequestParameters,
    ) -> Result<Option<ScoringResponse>>;

    /// 送信先（ログ用）
    fn endpoint(&self) -> &str;
}

/// HTTP経由のスコアリングクライアント
pub struct ScoringClient {
    client: reqwest::Client,
    url: url::Url,
    api_key: SecretString,
}

impl ScoringClient {
    /// 設定を検証してクライアントを作成
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Self::from_endpoint(config.validate()?)
    }

    pub fn from_endpoint(endpoint: Endpoint) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = endpoint.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: endpoint.url,
            api_key: endpoint.api_key,
        })
    }

    /// リクエストを送信してレスポンスをデコード
    pub async fn invoke(
        &self,
        table: &TimeSeriesTable,
        params: &RequestParameters,
    ) -> Result<Option<ScoringResponse>> {
        let request = ScoreRequest::new(table, params);
        for (key, value) in &request.global_parameters {
            info!("{}={}", key, value);
        }
        info!(url = %self.url, rows = table.len(), "Sending scoring request");

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = render_headers(response.headers());
            let body = response.text().await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read error response body");
                unreadable_body(&e)
            });
            error!(status = status.as_u16(), "Scoring request failed");
            return Err(Error::Service {
                status: status.as_u16(),
                headers,
                body,
            });
        }

        let body = response.text().await?;
        trace!(body = %body, "Scoring response body");

        if body.trim().is_empty() {
            warn!(
                status = status.as_u16(),
                "Scoring service returned success with an empty body; no output will be written"
            );
            return Ok(None);
        }

        let decoded = ScoringResponse::from_body(&body)?;
        debug!(
            columns = decoded.table.column_names.len(),
            rows = decoded.table.rows.len(),
            plots = decoded.plots.len(),
            "Scoring response decoded"
        );
        Ok(Some(decoded))
    }
}

#[async_trait]
impl ScoringService for ScoringClient {
    async fn score(
        &self,
        table: &TimeSeriesTable,
        params: &RequestParameters,
    ) -> Result<Option<ScoringResponse>> {
        self.invoke(table, params).await
    }

    fn endpoint(&self) -> &str {
        self.url.as_str()
    }
}

// リクエストIDやタイムスタンプを含むため、失敗時の調査用に全て残す
fn render_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                name,
                value.to_str().unwrap_or("<non-ascii value>")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn unreadable_body(err: &reqwest::Error) -> String {
    format!("<response body could not be read: {err}>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_client_requires_credentials() {
        let config = ServiceConfig::default();
        assert!(matches!(ScoringClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_client_creation() {
        let config = ServiceConfig::new("http://127.0.0.1:9/score", "test-key");
        let client = ScoringClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/score");
    }

    #[test]
    fn test_render_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-request-id", HeaderValue::from_static("abc-123"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let rendered = render_headers(&headers);
        assert!(rendered.contains("x-ms-request-id: abc-123"));
        assert!(rendered.contains("content-type: text/plain"));
    }
}
