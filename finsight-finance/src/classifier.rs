//! Transaction classifier: remote model first, keyword rules on any failure.
//!
//! The remote call is a single attempt bounded by the configured timeout.
//! Every failure mode is reported as a [`PredictError`] variant so it can be
//! logged precisely, then absorbed: [`Classifier::classify`] always returns.

use anyhow::{Context, Result};
use finsight_core::{ClassificationResult, ClassifierConfig};
use finsight_ingest::parse_payment_reference;
use futures_util::future::join_all;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::category_rules::categorize_or;

/// Body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictRequest {
    pub text: String,
    pub amount: Option<f64>,
    pub merchant: String,
}

/// Successful `/predict` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub category: String,
    pub confidence: f64,
    #[serde(default)]
    pub merchant: Option<String>,
}

/// Why the remote prediction was not used.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("could not connect: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("service answered {0}")]
    Status(StatusCode),

    /// Body was not JSON, or lacked a usable `category`/`confidence`.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl PredictError {
    fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            PredictError::Timeout(timeout)
        } else if err.is_connect() {
            PredictError::Connect(err)
        } else if err.is_decode() {
            PredictError::Malformed(err.to_string())
        } else {
            PredictError::Request(err)
        }
    }

    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Timeout(_) => "timeout",
            PredictError::Connect(_) => "connect",
            PredictError::Status(_) => "status",
            PredictError::Malformed(_) => "malformed",
            PredictError::Request(_) => "request",
        }
    }
}

/// Outcome of [`Classifier::classify`], tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Category and confidence reported by the prediction service
    Model(ClassificationResult),
    /// Keyword rules, fixed confidence, no merchant
    Fallback(ClassificationResult),
}

impl Classification {
    pub fn result(&self) -> &ClassificationResult {
        match self {
            Classification::Model(r) | Classification::Fallback(r) => r,
        }
    }

    pub fn into_result(self) -> ClassificationResult {
        match self {
            Classification::Model(r) | Classification::Fallback(r) => r,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback(_))
    }

    pub fn source(&self) -> &'static str {
        match self {
            Classification::Model(_) => "model",
            Classification::Fallback(_) => "rules",
        }
    }
}

pub struct Classifier {
    config: ClassifierConfig,
    client: reqwest::Client,
    predict_url: String,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("building HTTP client")?;
        let predict_url = config.predict_url();
        Ok(Self {
            config,
            client,
            predict_url,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// One bounded attempt against the prediction service.
    pub async fn predict(&self, req: &PredictRequest) -> Result<Prediction, PredictError> {
        let timeout = self.config.timeout();

        let resp = self
            .client
            .post(&self.predict_url)
            .json(req)
            .send()
            .await
            .map_err(|e| PredictError::from_transport(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PredictError::Status(status));
        }

        // Read the whole body under the same deadline before parsing, so a
        // stalled body is a timeout rather than a partial result.
        let body = resp
            .bytes()
            .await
            .map_err(|e| PredictError::from_transport(e, timeout))?;

        let prediction: Prediction = serde_json::from_slice(&body)
            .map_err(|e| PredictError::Malformed(e.to_string()))?;
        if prediction.category.trim().is_empty() {
            return Err(PredictError::Malformed("empty category".to_string()));
        }
        Ok(prediction)
    }

    /// Classify a description. Never fails.
    pub async fn classify(&self, text: &str, amount_hint: Option<f64>) -> Classification {
        let parsed = parse_payment_reference(text);
        let local_merchant = parsed.merchant.unwrap_or_default();
        let req = PredictRequest {
            text: text.to_string(),
            amount: amount_hint.or(parsed.amount),
            merchant: local_merchant.clone(),
        };

        match self.predict(&req).await {
            Ok(prediction) => {
                tracing::debug!(
                    category = %prediction.category,
                    confidence = prediction.confidence,
                    "model classification"
                );
                let merchant = if local_merchant.is_empty() {
                    prediction.merchant.unwrap_or_default()
                } else {
                    local_merchant
                };
                Classification::Model(ClassificationResult {
                    category: prediction.category,
                    confidence: prediction.confidence,
                    merchant,
                })
            }
            Err(err) => {
                tracing::warn!(
                    kind = err.kind(),
                    error = %err,
                    url = %self.predict_url,
                    "prediction service unavailable, using rules"
                );
                self.fallback(text)
            }
        }
    }

    /// Rule-based result for `text`
    pub fn fallback(&self, text: &str) -> Classification {
        let category = categorize_or(text, self.config.default_category);
        Classification::Fallback(ClassificationResult {
            category: category.label().to_string(),
            confidence: self.config.fallback_confidence,
            merchant: String::new(),
        })
    }

    /// Classify several descriptions concurrently. Output order matches input.
    pub async fn classify_all<'a, I>(&self, items: I) -> Vec<Classification>
    where
        I: IntoIterator<Item = (&'a str, Option<f64>)>,
    {
        join_all(
            items
                .into_iter()
                .map(|(text, amount)| self.classify(text, amount)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::Category;

    fn unreachable_config() -> ClassifierConfig {
        ClassifierConfig {
            // port 9 (discard) is never listening in test environments
            ml_service_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 200,
            ..ClassifierConfig::default()
        }
    }

    #[test]
    fn test_fallback_shape() {
        let c = Classifier::new(ClassifierConfig::default()).unwrap();
        let out = c.fallback("Zomato order");
        assert!(out.is_fallback());
        assert_eq!(out.source(), "rules");
        let r = out.into_result();
        assert_eq!(r.category, "Food");
        assert_eq!(r.confidence, 0.6);
        assert_eq!(r.merchant, "");
    }

    #[test]
    fn test_fallback_default_category_is_configurable() {
        let cfg = ClassifierConfig {
            default_category: Category::Shopping,
            ..ClassifierConfig::default()
        };
        let c = Classifier::new(cfg).unwrap();
        assert_eq!(c.fallback("").result().category, "Shopping");
    }

    #[test]
    fn test_prediction_merchant_is_optional() {
        let p: Prediction = serde_json::from_str(r#"{"category":"Food","confidence":0.9}"#).unwrap();
        assert_eq!(p.merchant, None);
        assert!(serde_json::from_str::<Prediction>(r#"{"category":"Food"}"#).is_err());
    }

    #[test]
    fn test_request_serializes_null_amount() {
        let req = PredictRequest {
            text: "coffee".to_string(),
            amount: None,
            merchant: String::new(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"text": "coffee", "amount": null, "merchant": ""}));
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        let c = Classifier::new(unreachable_config()).unwrap();
        let out = c.classify("UBER TRIP", Some(250.0)).await;
        assert!(out.is_fallback());
        assert_eq!(out.result().category, "Transport");
        assert_eq!(out.result().confidence, 0.6);
    }

    #[tokio::test]
    async fn test_classify_all_keeps_order() {
        let c = Classifier::new(unreachable_config()).unwrap();
        let out = c
            .classify_all([("Netflix", None), ("", None), ("Apollo Pharmacy", Some(120.0))])
            .await;
        let cats: Vec<_> = out.iter().map(|c| c.result().category.as_str()).collect();
        assert_eq!(cats, ["Entertainment", "Other", "Health"]);
    }
}
