//! Consul catalog source
//!
//! Long-polls `GET /v1/catalog/services` using Consul's blocking query
//! parameters and reads the new index from the `X-Consul-Index` header.

use super::CatalogSource;
use crate::{
    config::ConsulConfig,
    error::{Error, Result},
    models::CatalogListing,
};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";

/// Slack on top of the wait time before a request is abandoned.
/// Consul adds up to wait/16 of jitter to blocking queries.
const REQUEST_SLACK: Duration = Duration::from_secs(10);

/// Catalog source backed by a Consul agent's HTTP API
#[derive(Debug, Clone)]
pub struct ConsulCatalog {
    client: reqwest::Client,
    base_url: String,
    config: ConsulConfig,
}

impl ConsulCatalog {
    /// Create a source for the configured agent
    pub fn new(config: ConsulConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Agent base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query(&self, wait_index: u64, wait_time: Duration) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if wait_index > 0 {
            query.push(("index", wait_index.to_string()));
        }
        if !wait_time.is_zero() {
            query.push(("wait", format!("{}ms", wait_time.as_millis())));
        }
        if let Some(dc) = &self.config.datacenter {
            query.push(("dc", dc.clone()));
        }
        query
    }
}

#[async_trait]
impl CatalogSource for ConsulCatalog {
    async fn list_services(&self, wait_index: u64, wait_time: Duration) -> Result<CatalogListing> {
        let url = format!("{}/v1/catalog/services", self.base_url);
        debug!("GET {} (index {}, wait {:?})", url, wait_index, wait_time);

        let mut request = self
            .client
            .get(&url)
            .query(&self.query(wait_index, wait_time))
            .timeout(request_timeout(wait_time));
        if let Some(token) = &self.config.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let index = parse_index(response.headers())?;
        let services: HashMap<String, Option<Vec<String>>> = response.json().await?;
        let services = services
            .into_iter()
            .map(|(name, tags)| (name, tags.unwrap_or_default()))
            .collect();

        Ok(CatalogListing::new(services, index))
    }
}

/// Deadline for one blocking query: the wait, Consul's wait/16 jitter, and slack
fn request_timeout(wait_time: Duration) -> Duration {
    wait_time
        .saturating_add(wait_time / 16)
        .saturating_add(REQUEST_SLACK)
}

fn parse_index(headers: &HeaderMap) -> Result<u64> {
    let value = headers
        .get(INDEX_HEADER)
        .ok_or_else(|| Error::InvalidIndex(format!("missing {} header", INDEX_HEADER)))?;
    let value = value
        .to_str()
        .map_err(|e| Error::InvalidIndex(e.to_string()))?;
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidIndex(format!("{} is not a number", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog_for(server: &MockServer) -> ConsulCatalog {
        ConsulCatalog::new(ConsulConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_list_services_parses_listing_and_index() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/catalog/services"))
            .and(query_param("index", "42"))
            .and(query_param("wait", "30000ms"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Consul-Index", "43")
                    .set_body_json(serde_json::json!({
                        "consul": [],
                        "grafana": [
                            "dashboard.service.name=Grafana",
                            "dashboard.service.address=http://grafana:3000"
                        ],
                        "legacy": null
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let listing = catalog_for(&server)
            .list_services(42, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(listing.index, 43);
        assert_eq!(listing.services.len(), 3);
        assert_eq!(listing.services["grafana"].len(), 2);
        assert!(listing.services["legacy"].is_empty());
    }

    #[tokio::test]
    async fn test_zero_index_is_not_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/catalog/services"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Consul-Index", "7")
                    .set_body_json(serde_json::json!({})),
            )
            .mount(&server)
            .await;

        let listing = catalog_for(&server)
            .list_services(0, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(listing.index, 7);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].url.query_pairs().any(|(k, _)| k == "index"));
    }

    #[tokio::test]
    async fn test_token_and_datacenter_are_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/catalog/services"))
            .and(header("X-Consul-Token", "secret"))
            .and(query_param("dc", "eu-west"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Consul-Index", "1")
                    .set_body_json(serde_json::json!({})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = ConsulConfig {
            address: server.uri(),
            token: Some("secret".to_string()),
            datacenter: Some("eu-west".to_string()),
        };
        let catalog = ConsulCatalog::new(config).unwrap();
        catalog
            .list_services(0, Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/catalog/services"))
            .respond_with(ResponseTemplate::new(500).set_body_string("No cluster leader"))
            .mount(&server)
            .await;

        let err = catalog_for(&server)
            .list_services(5, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            Error::UnexpectedStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "No cluster leader");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_index_header_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/catalog/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = catalog_for(&server)
            .list_services(0, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIndex(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/catalog/services"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Consul-Index", "9")
                    .set_body_string("{\"grafana\": [\"dashboard.service.name="),
            )
            .mount(&server)
            .await;

        let err = catalog_for(&server)
            .list_services(0, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            Error::Http(e) => assert!(e.is_decode()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_agent_is_an_http_error() {
        // Nothing listens on port 9 on loopback
        let catalog = ConsulCatalog::new(ConsulConfig::new("127.0.0.1:9")).unwrap();
        let err = catalog
            .list_services(0, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_request_timeout_covers_wait_and_jitter() {
        assert_eq!(
            request_timeout(Duration::from_secs(32)),
            Duration::from_secs(44)
        );
        assert_eq!(request_timeout(Duration::ZERO), REQUEST_SLACK);
        assert_eq!(request_timeout(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn test_parse_index_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(INDEX_HEADER, "abc".parse().unwrap());
        assert!(matches!(parse_index(&headers), Err(Error::InvalidIndex(_))));

        headers.insert(INDEX_HEADER, "1024".parse().unwrap());
        assert_eq!(parse_index(&headers).unwrap(), 1024);
    }
}
