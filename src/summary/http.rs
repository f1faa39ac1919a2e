use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use super::{SUMMARY_UNAVAILABLE, Summarizer, SummaryError, SummaryFacts};

#[derive(Serialize)]
struct SummaryRequestBody<'a> {
    prompt: &'a str,
}

/// Posts the rendered prompt to a text-generation endpoint. The endpoint may
/// answer with `{"text": "..."}` or with the text itself.
pub struct HttpSummarizer {
    client: Client,
    endpoint: Url,
}

impl HttpSummarizer {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, facts: &SummaryFacts) -> Result<String, SummaryError> {
        let prompt = facts.to_prompt();
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SummaryRequestBody { prompt: &prompt })
            .send()
            .await
            .map_err(|e| SummaryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummaryError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SummaryError::Decode(e.to_string()))?;
        Ok(summary_text(&body))
    }
}

fn summary_text(body: &str) -> String {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Ok(Value::String(s)) => s,
        _ => body.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        SUMMARY_UNAVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SalaryInputs, compute};
    use crate::rates::default_rates;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::json;
    use tokio::net::TcpListener;

    fn facts() -> SummaryFacts {
        let inputs = SalaryInputs::default();
        let breakdown = compute(&inputs, &default_rates(inputs.tax_year));
        SummaryFacts::new(&inputs, &breakdown)
    }

    async fn summarizer_for(app: Router) -> HttpSummarizer {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let endpoint = Url::parse(&format!("http://{addr}/summarize")).expect("url");
        HttpSummarizer::new(endpoint, Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn summary_text_accepts_json_and_plain_bodies() {
        assert_eq!(summary_text(r#"{"text": " • one\n• two "}"#), "• one\n• two");
        assert_eq!(summary_text("\"quoted\""), "quoted");
        assert_eq!(summary_text("plain answer"), "plain answer");
        assert_eq!(summary_text(r#"{"other": 1}"#), SUMMARY_UNAVAILABLE);
        assert_eq!(summary_text("   "), SUMMARY_UNAVAILABLE);
    }

    #[tokio::test]
    async fn posts_prompt_and_reads_text() {
        let app = Router::new().route(
            "/summarize",
            post(|Json(body): Json<Value>| async move {
                let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
                let echoed = if prompt.contains("2024/25") { "• ok" } else { "• wrong" };
                Json(json!({ "text": echoed }))
            }),
        );
        let summarizer = summarizer_for(app).await;
        let text = summarizer.summarize(&facts()).await.expect("summary");
        assert_eq!(text, "• ok");
    }

    #[tokio::test]
    async fn reports_upstream_status() {
        let app = Router::new().route(
            "/summarize",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let summarizer = summarizer_for(app).await;
        let err = summarizer.summarize(&facts()).await.expect_err("must fail");
        assert!(matches!(err, SummaryError::Status { status: 429 }));
    }
}
