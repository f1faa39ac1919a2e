//! Reqwest-backed rates source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{RatesError, RatesSource};
use crate::core::TaxYear;

/// Fetches rates with `GET <endpoint>?taxYear=2024/25` and hands the body
/// back untouched; decoding and merging happen in the provider.
pub struct HttpRatesSource {
    client: Client,
    endpoint: Url,
}

impl HttpRatesSource {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    fn url_for(&self, tax_year: TaxYear) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("taxYear", tax_year.label());
        url
    }
}

#[async_trait]
impl RatesSource for HttpRatesSource {
    async fn fetch_raw(&self, tax_year: TaxYear) -> Result<String, RatesError> {
        let response = self
            .client
            .get(self.url_for(tax_year))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RatesError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RatesError::Status {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| RatesError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{RatesOrigin, RatesProvider};
    use axum::{Router, extract::Query, http::StatusCode, routing::get};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    async fn spawn_upstream(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    fn source_for(addr: SocketAddr, path: &str) -> HttpRatesSource {
        let endpoint = Url::parse(&format!("http://{addr}{path}")).expect("url");
        HttpRatesSource::new(endpoint, Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn url_carries_tax_year_query() {
        let endpoint = Url::parse("http://rates.test/uk?format=json").expect("url");
        let source = HttpRatesSource::new(endpoint, Duration::from_secs(1)).expect("client");
        let url = source.url_for(TaxYear::Y2023To24);
        assert_eq!(url.as_str(), "http://rates.test/uk?format=json&taxYear=2023%2F24");
    }

    #[tokio::test]
    async fn fetches_body_for_requested_year() {
        let app = Router::new().route(
            "/rates",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let year = params.get("taxYear").cloned().unwrap_or_default();
                format!(r#"{{"niRate": 0.08, "lastUpdated": "{year}"}}"#)
            }),
        );
        let addr = spawn_upstream(app).await;
        let source = source_for(addr, "/rates");

        let body = source.fetch_raw(TaxYear::Y2025To26).await.expect("body");
        assert!(body.contains("\"lastUpdated\": \"2025/26\""));

        let snapshot = RatesProvider::new(Arc::new(source))
            .fetch_rates(TaxYear::Y2025To26)
            .await;
        assert_eq!(snapshot.origin, RatesOrigin::Live);
        assert_eq!(snapshot.last_updated.as_deref(), Some("2025/26"));
    }

    #[tokio::test]
    async fn maps_non_success_status_to_error() {
        let app = Router::new().route(
            "/rates",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let addr = spawn_upstream(app).await;
        let source = source_for(addr, "/rates");

        let err = source
            .fetch_raw(TaxYear::Y2024To25)
            .await
            .expect_err("must fail");
        assert!(matches!(err, RatesError::Status { status: 503 }));

        let snapshot = RatesProvider::new(Arc::new(source))
            .fetch_rates(TaxYear::Y2024To25)
            .await;
        assert_eq!(snapshot.origin, RatesOrigin::Default);
    }
}
