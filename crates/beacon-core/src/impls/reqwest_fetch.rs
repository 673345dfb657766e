//! ReqwestFetch - reqwest による HttpFetch 実装
//!
//! ブラウザの CORS 読み取り許可を再現します。`origin` を設定すると、
//! リクエストに `Origin` ヘッダを付け、応答の `Access-Control-Allow-Origin` が
//! `*` かその origin でなければ本文を捨てて opaque として返します。
//! `origin` が未設定なら、全ての応答を読めるものとして扱います。

use async_trait::async_trait;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, HeaderMap, ORIGIN};
use url::Url;

use crate::ports::{FetchError, FetchResponse, HttpFetch};

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetch {
    client: reqwest::Client,
    origin: Option<String>,
}

impl ReqwestFetch {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            origin: None,
        }
    }

    /// Act as a page served from `origin`.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    fn read_permitted(&self, headers: &HeaderMap) -> bool {
        let Some(origin) = &self.origin else {
            return true;
        };
        headers
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(|allowed| allowed == "*" || allowed == origin)
            .unwrap_or(false)
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let mut request = self.client.get(url.clone());
        if let Some(origin) = &self.origin {
            request = request.header(ORIGIN, origin);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !self.read_permitted(response.headers()) {
            tracing::debug!(%url, "response carries no read permission for this origin");
            return Ok(FetchResponse::opaque());
        }

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(FetchResponse::readable(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exec"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    fn exec_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/exec?path=health", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn reads_body_without_origin() {
        let server = server_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}")).await;

        let fetch = ReqwestFetch::default();
        let resp = fetch.get(&exec_url(&server)).await.unwrap();
        assert_eq!(resp, FetchResponse::readable(200, "{\"ok\":true}"));
    }

    #[tokio::test]
    async fn missing_allow_origin_is_opaque() {
        let server = server_with(ResponseTemplate::new(200).set_body_string("{}")).await;

        let fetch = ReqwestFetch::default().with_origin("https://app.test");
        let resp = fetch.get(&exec_url(&server)).await.unwrap();
        assert!(resp.is_opaque());
        assert_eq!(resp.status, 0);
    }

    #[tokio::test]
    async fn matching_allow_origin_is_readable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exec"))
            .and(query_param("path", "health"))
            .and(header("origin", "https://app.test"))
            .respond_with(
                ResponseTemplate::new(503)
                    .insert_header("access-control-allow-origin", "https://app.test")
                    .set_body_string("busy"),
            )
            .mount(&server)
            .await;

        let fetch = ReqwestFetch::default().with_origin("https://app.test");
        let resp = fetch.get(&exec_url(&server)).await.unwrap();
        assert_eq!(resp, FetchResponse::readable(503, "busy"));
    }

    #[tokio::test]
    async fn wildcard_allow_origin_is_readable() {
        let server = server_with(
            ResponseTemplate::new(200)
                .insert_header("access-control-allow-origin", "*")
                .set_body_string("[]"),
        )
        .await;

        let fetch = ReqwestFetch::default().with_origin("https://app.test");
        assert!(!fetch.get(&exec_url(&server)).await.unwrap().is_opaque());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let fetch = ReqwestFetch::default();
        let url = Url::parse("http://127.0.0.1:9/exec").unwrap();
        assert!(matches!(fetch.get(&url).await, Err(FetchError::Network(_))));
    }
}
