//! Tax-year rate lookup.
//!
//! A [`RatesSource`] returns whatever text an upstream service produced for
//! a tax year. [`RatesProvider`] turns that into a [`RatesSnapshot`],
//! merging field-by-field against [`default_rates`] and falling back to the
//! defaults entirely when the upstream is missing, failing or unreadable.

mod http;
mod loader;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{TaxRates, TaxYear};

pub use http::HttpRatesSource;
pub use loader::RatesLoader;

#[derive(Debug, Error)]
pub enum RatesError {
    #[error("rates request failed: {0}")]
    Transport(String),
    #[error("rates endpoint returned HTTP {status}")]
    Status { status: u16 },
    #[error("rates response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RatesSource: Send + Sync {
    async fn fetch_raw(&self, tax_year: TaxYear) -> Result<String, RatesError>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatesOrigin {
    Live,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLink {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesSnapshot {
    pub tax_year: TaxYear,
    pub rates: TaxRates,
    pub origin: RatesOrigin,
    pub last_updated: Option<String>,
    pub sources: Vec<SourceLink>,
}

impl RatesSnapshot {
    pub fn defaults(tax_year: TaxYear) -> Self {
        Self {
            tax_year,
            rates: default_rates(tax_year),
            origin: RatesOrigin::Default,
            last_updated: None,
            sources: Vec::new(),
        }
    }
}

/// Baseline parameters for each supported year. 2024/25 figures are the
/// reference set; 2023/24 differs only in its 12% NI main rate.
pub fn default_rates(tax_year: TaxYear) -> TaxRates {
    let ni_rate = match tax_year {
        TaxYear::Y2023To24 => 0.12,
        TaxYear::Y2024To25 | TaxYear::Y2025To26 => 0.08,
    };
    TaxRates {
        personal_allowance: 12_570.0,
        basic_rate_threshold: 50_270.0,
        higher_rate_threshold: 125_140.0,
        additional_rate_threshold: 125_140.0,
        basic_rate: 0.20,
        higher_rate: 0.40,
        additional_rate: 0.45,
        ni_threshold: 12_570.0,
        ni_rate,
        ni_upper_limit: 50_270.0,
        ni_upper_rate: 0.02,
    }
}

#[derive(Clone, Default)]
pub struct RatesProvider {
    source: Option<Arc<dyn RatesSource>>,
}

impl RatesProvider {
    pub fn new(source: Arc<dyn RatesSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn defaults_only() -> Self {
        Self::default()
    }

    /// Never fails: any upstream problem yields the year's defaults.
    pub async fn fetch_rates(&self, tax_year: TaxYear) -> RatesSnapshot {
        let Some(source) = &self.source else {
            return RatesSnapshot::defaults(tax_year);
        };

        match source.fetch_raw(tax_year).await {
            Ok(body) => snapshot_from_body(tax_year, &body).unwrap_or_else(|err| {
                warn!(%tax_year, error = %err, "unusable rates response, using defaults");
                RatesSnapshot::defaults(tax_year)
            }),
            Err(err) => {
                warn!(%tax_year, error = %err, "rates fetch failed, using defaults");
                RatesSnapshot::defaults(tax_year)
            }
        }
    }
}

fn snapshot_from_body(tax_year: TaxYear, body: &str) -> Result<RatesSnapshot, RatesError> {
    let json = extract_json_object(body)
        .ok_or_else(|| RatesError::Decode("no JSON object in response".to_string()))?;
    let raw: Value = serde_json::from_str(json).map_err(|e| RatesError::Decode(e.to_string()))?;
    if !raw.is_object() {
        return Err(RatesError::Decode("expected a JSON object".to_string()));
    }

    let rates = merge_rates(default_rates(tax_year), &raw);
    debug!(%tax_year, ?rates, "merged upstream rates");
    Ok(RatesSnapshot {
        tax_year,
        rates,
        origin: RatesOrigin::Live,
        last_updated: raw
            .get("lastUpdated")
            .and_then(Value::as_str)
            .map(str::to_string),
        sources: source_links(&raw),
    })
}

/// Returns the text from the first `{` to the last `}`, so JSON wrapped in
/// prose or a fenced block can still be parsed.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Copy, Clone)]
enum FieldKind {
    Amount,
    Rate,
}

/// Overlays every well-formed upstream field onto `defaults`. A field that is
/// absent, non-numeric or out of range keeps its default; a merged set that
/// breaks the ordering constraints is discarded for `defaults`.
pub fn merge_rates(defaults: TaxRates, raw: &Value) -> TaxRates {
    use FieldKind::{Amount, Rate};

    let merged = TaxRates {
        personal_allowance: pick(raw, "personalAllowance", Amount, defaults.personal_allowance),
        basic_rate_threshold: pick(raw, "basicRateThreshold", Amount, defaults.basic_rate_threshold),
        higher_rate_threshold: pick(raw, "higherRateThreshold", Amount, defaults.higher_rate_threshold),
        additional_rate_threshold: pick(
            raw,
            "additionalRateThreshold",
            Amount,
            defaults.additional_rate_threshold,
        ),
        basic_rate: pick(raw, "basicRate", Rate, defaults.basic_rate),
        higher_rate: pick(raw, "higherRate", Rate, defaults.higher_rate),
        additional_rate: pick(raw, "additionalRate", Rate, defaults.additional_rate),
        ni_threshold: pick(raw, "niThreshold", Amount, defaults.ni_threshold),
        ni_rate: pick(raw, "niRate", Rate, defaults.ni_rate),
        ni_upper_limit: pick(raw, "niUpperLimit", Amount, defaults.ni_upper_limit),
        ni_upper_rate: pick(raw, "niUpperRate", Rate, defaults.ni_upper_rate),
    };

    match merged.validate() {
        Ok(()) => merged,
        Err(reason) => {
            warn!(%reason, "merged rates are inconsistent, using defaults");
            defaults
        }
    }
}

fn pick(raw: &Value, key: &str, kind: FieldKind, default: f64) -> f64 {
    let Some(value) = raw.get(key) else {
        return default;
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let in_range = |v: f64| match kind {
        FieldKind::Amount => v.is_finite() && v >= 0.0,
        FieldKind::Rate => (0.0..=1.0).contains(&v),
    };

    match parsed {
        Some(v) if in_range(v) => v,
        _ => {
            warn!(field = key, value = %value, "ignoring malformed rate field");
            default
        }
    }
}

fn source_links(raw: &Value) -> Vec<SourceLink> {
    let Some(entries) = raw.get("sourceUrls").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let link = entry.get("web").unwrap_or(entry);
            let uri = link.get("uri").and_then(Value::as_str)?;
            let title = link.get("title").and_then(Value::as_str).unwrap_or(uri);
            Some(SourceLink {
                uri: uri.to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}
