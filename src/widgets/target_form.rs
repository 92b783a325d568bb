//! New-target form: validation, submission and result reporting.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::MessageArea;
use crate::api::{ApiError, CreateTargetResponse, MetricsClient};

static HTTP_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").expect("valid regex"));

/// Client-side validation failures. The message is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please provide a valid URL")]
    Url,
    #[error("Please provide a valid collection interval")]
    CollectionInterval,
}

/// How a submission ended.
#[derive(Debug)]
pub enum Submission {
    /// A rule failed; nothing was sent.
    Rejected(ValidationError),
    /// The backend accepted the request and answered with a status message.
    Answered(CreateTargetResponse),
    /// The backend answered with a non-success status.
    Refused { status: u16, body: String },
    /// Transport or decoding failure. Logged, not shown.
    Failed(ApiError),
}

/// URL must start with `http://` or `https://`. Nothing else is checked.
pub fn is_valid_http_url(url: &str) -> bool {
    HTTP_URL.is_match(url)
}

/// Check the fields in order, stopping at the first failure.
pub fn validate(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    let url = fields.get("url").and_then(Value::as_str).unwrap_or_default();
    if !is_valid_http_url(url) {
        return Err(ValidationError::Url);
    }

    let interval = match fields.get("collectioninterval") {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    match interval {
        Some(i) if i > 0.0 => Ok(()),
        _ => Err(ValidationError::CollectionInterval),
    }
}

/// Collect submitted form fields into a JSON object of strings.
/// A repeated field keeps its last value.
pub fn form_to_json<I>(fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (String, String)>,
{
    fields
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect()
}

/// The new-target form bound to its creation endpoint.
pub struct TargetForm {
    client: MetricsClient,
    action: String,
    messages: MessageArea,
}

impl TargetForm {
    pub const ELEMENT_ID: &'static str = "new-target-form";

    pub fn new(client: MetricsClient, action: String, messages: MessageArea) -> Self {
        Self {
            client,
            action,
            messages,
        }
    }

    pub fn messages(&self) -> &MessageArea {
        &self.messages
    }

    /// Validate and send the fields, updating the message area with the outcome.
    pub async fn submit<I>(&self, fields: I) -> Submission
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let payload = form_to_json(fields);

        if let Err(e) = validate(&payload) {
            self.messages.show("error", &e.to_string()).await;
            return Submission::Rejected(e);
        }

        let response = match self.client.post_json(&self.action, &Value::Object(payload)).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Failed to submit new target: {}", e);
                return Submission::Failed(e);
            }
        };

        if !response.status.is_success() {
            self.messages.show("error", &response.body).await;
            tracing::debug!(
                "Create request refused with {}; body not decoded as a status message",
                response.status
            );
            return Submission::Refused {
                status: response.status.as_u16(),
                body: response.body,
            };
        }

        match serde_json::from_str::<CreateTargetResponse>(&response.body) {
            Ok(answer) => {
                tracing::info!("Create request answered {}: {}", answer.status, answer.message);
                self.messages.show(&answer.status, &answer.message).await;
                Submission::Answered(answer)
            }
            Err(e) => {
                tracing::error!("Failed to decode create response: {}", e);
                Submission::Failed(ApiError::Decode(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::spawn_backend;
    use crate::widgets::MessageState;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn form_for(action: String, clear_delay: Duration) -> TargetForm {
        let client = MetricsClient::new("http://127.0.0.1:1", Duration::from_secs(5)).unwrap();
        TargetForm::new(client, action, MessageArea::new(clear_delay))
    }

    #[test]
    fn test_url_rule() {
        assert!(!is_valid_http_url("ftp://x"));
        assert!(!is_valid_http_url(""));
        assert!(!is_valid_http_url("HTTP://a.com"));
        assert!(!is_valid_http_url(" http://a.com"));
        assert!(is_valid_http_url("http://a.com"));
        assert!(is_valid_http_url("https://a.com"));
        assert!(is_valid_http_url("http://"));
    }

    #[test]
    fn test_interval_rule() {
        for bad in ["0", "-5", "", "soon", "NaN"] {
            let payload = form_to_json(fields(&[("url", "http://a.com"), ("collectioninterval", bad)]));
            assert_eq!(validate(&payload), Err(ValidationError::CollectionInterval), "{bad}");
        }
        for good in ["1", "60", "0.5"] {
            let payload = form_to_json(fields(&[("url", "http://a.com"), ("collectioninterval", good)]));
            assert_eq!(validate(&payload), Ok(()), "{good}");
        }

        let missing = form_to_json(fields(&[("url", "http://a.com")]));
        assert_eq!(validate(&missing), Err(ValidationError::CollectionInterval));
    }

    #[test]
    fn test_url_is_checked_first() {
        let payload = form_to_json(fields(&[("url", "ftp://x"), ("collectioninterval", "0")]));
        assert_eq!(validate(&payload), Err(ValidationError::Url));
    }

    #[tokio::test]
    async fn test_rejected_submission_shows_rule_message() {
        let form = form_for("http://127.0.0.1:1/target".to_string(), Duration::from_secs(15));
        let outcome = form
            .submit(fields(&[("url", "https://a.com"), ("collectioninterval", "-5")]))
            .await;

        assert!(matches!(outcome, Submission::Rejected(ValidationError::CollectionInterval)));
        let shown = form.messages().snapshot().await;
        assert_eq!(shown.text, "Please provide a valid collection interval");
        assert_eq!(shown.class, "message-wrapper message-error");
    }

    #[tokio::test]
    async fn test_successful_submission_shows_backend_message() {
        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        let router = Router::new().route(
            "/target",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(CreateTargetResponse {
                        status: "success".to_string(),
                        message: "created".to_string(),
                    })
                }
            }),
        );
        let base = spawn_backend(router).await;

        let form = form_for(format!("{}/target", base), Duration::from_millis(200));
        let outcome = form
            .submit(fields(&[
                ("url", "https://example.com"),
                ("collectioninterval", "30"),
                ("name", "example"),
            ]))
            .await;
        assert!(matches!(outcome, Submission::Answered(_)));

        let body = received.lock().unwrap().clone().unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "url": "https://example.com",
                "collectioninterval": "30",
                "name": "example",
            })
        );

        let shown = form.messages().snapshot().await;
        assert_eq!(shown.text, "created");
        assert_eq!(shown.class, "message-wrapper message-success");

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(form.messages().snapshot().await, MessageState::default());
    }

    #[tokio::test]
    async fn test_refused_submission_shows_body_text() {
        let router = Router::new().route(
            "/target",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "An error occured !") }),
        );
        let base = spawn_backend(router).await;

        let form = form_for(format!("{}/target", base), Duration::from_secs(15));
        let outcome = form
            .submit(fields(&[("url", "http://a.com"), ("collectioninterval", "5")]))
            .await;

        match outcome {
            Submission::Refused { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "An error occured !");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let shown = form.messages().snapshot().await;
        assert_eq!(shown.text, "An error occured !");
        assert_eq!(shown.class, "message-wrapper message-error");
    }

    #[tokio::test]
    async fn test_transport_failure_shows_nothing() {
        // Nothing listens on port 1.
        let form = form_for("http://127.0.0.1:1/target".to_string(), Duration::from_secs(15));
        let outcome = form
            .submit(fields(&[("url", "http://a.com"), ("collectioninterval", "5")]))
            .await;

        assert!(matches!(outcome, Submission::Failed(ApiError::Transport(_))));
        assert_eq!(form.messages().snapshot().await, MessageState::default());
    }

    #[tokio::test]
    async fn test_undecodable_success_body_shows_nothing() {
        let router = Router::new().route("/target", post(|| async { "ok" }));
        let base = spawn_backend(router).await;

        let form = form_for(format!("{}/target", base), Duration::from_secs(15));
        let outcome = form
            .submit(fields(&[("url", "http://a.com"), ("collectioninterval", "5")]))
            .await;

        assert!(matches!(outcome, Submission::Failed(ApiError::Decode(_))));
        assert_eq!(form.messages().snapshot().await, MessageState::default());
    }
}
