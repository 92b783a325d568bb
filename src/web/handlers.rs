//! HTTP request handlers.

use super::AppState;
use crate::widgets::{
    AvailabilityTable, Element, LatencyChart, LatencyDistributionChart, LatencyRow, MessageArea,
    MessageState, StatusCodeChart, Submission, TargetForm, Widget, CLASS_LABELS,
};

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use rust_embed::RustEmbed;
use serde::Serialize;

#[derive(RustEmbed)]
#[folder = "static/"]
struct Assets;

// ============================================================================
// Dashboard
// ============================================================================

pub struct StatusRow {
    pub label: &'static str,
    pub count: u64,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub form_id: &'static str,
    pub message_id: &'static str,
    pub availability_id: &'static str,
    pub latency_id: &'static str,
    pub latency_distribution_id: &'static str,
    pub status_code_id: &'static str,
    pub message: MessageState,
    pub availability: Vec<Element>,
    pub latency_rows: Vec<LatencyRow>,
    pub status_rows: Vec<StatusRow>,
    pub latency_config: String,
    pub latency_distribution_config: String,
    pub status_code_config: String,
    pub refresh_ms: u128,
    pub message_clear_ms: u128,
}

pub async fn handle_dashboard(State(state): State<AppState>) -> Response {
    let dashboard = &state.dashboard;

    let availability = dashboard.availability.read().await.elements.clone();

    let (latency_rows, latency_config) = {
        let chart = dashboard.latency.read().await;
        (chart.latest_rows(), to_json(&*chart))
    };

    let latency_distribution_config = to_json(&*dashboard.latency_distribution.read().await);

    let (status_rows, status_code_config) = {
        let chart = dashboard.status_codes.read().await;
        let rows = CLASS_LABELS
            .iter()
            .zip(chart.counts())
            .map(|(&label, count)| StatusRow { label, count })
            .collect();
        (rows, to_json(&*chart))
    };

    let page = DashboardPage {
        form_id: TargetForm::ELEMENT_ID,
        message_id: MessageArea::ELEMENT_ID,
        availability_id: AvailabilityTable::ELEMENT_ID,
        latency_id: LatencyChart::ELEMENT_ID,
        latency_distribution_id: LatencyDistributionChart::ELEMENT_ID,
        status_code_id: StatusCodeChart::ELEMENT_ID,
        message: dashboard.form.messages().snapshot().await,
        availability,
        latency_rows,
        status_rows,
        latency_config,
        latency_distribution_config,
        status_code_config,
        refresh_ms: state.config.refresh_interval.as_millis(),
        message_clear_ms: state.config.message_clear_delay.as_millis(),
    };

    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render dashboard: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

// ============================================================================
// Widgets
// ============================================================================

pub async fn handle_widget(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.dashboard.widget_json(&id).await {
        Some(model) => Json(model).into_response(),
        None => (StatusCode::NOT_FOUND, "Widget not found").into_response(),
    }
}

// ============================================================================
// Form
// ============================================================================

pub async fn handle_submit_target(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let form = &state.dashboard.form;
    if let Submission::Refused { status, body } = form.submit(fields).await {
        tracing::warn!("Create target refused with {}: {}", status, body);
    }

    if wants_json(&headers) {
        Json(form.messages().snapshot().await).into_response()
    } else {
        Redirect::to("/").into_response()
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false)
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_static(Path(path): Path<String>) -> Response {
    match Assets::get(&path) {
        Some(asset) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                asset.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::Server;
    use crate::api::testing::spawn_backend;
    use crate::api::{CreateTargetResponse, MetricsClient, TargetRecord};
    use crate::config::DashboardConfig;
    use crate::widgets::{Dashboard, MessageState, Widget};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::time::Duration;

    async fn spawn_dashboard(target_url: String) -> (String, Dashboard) {
        let config = DashboardConfig {
            target_url,
            ..Default::default()
        };
        let client = MetricsClient::new(&config.backend_url, Duration::from_secs(5)).unwrap();
        let dashboard = Dashboard::new(&config, client);
        let server = Server::new(config, dashboard.clone());
        (spawn_backend(server.routes()).await, dashboard)
    }

    #[tokio::test]
    async fn test_dashboard_page_binds_element_ids() {
        let (base, dashboard) = spawn_dashboard("http://127.0.0.1:1/target".to_string()).await;
        dashboard.availability.write().await.apply(Some(vec![TargetRecord {
            target: "https://up.io".to_string(),
            availability: 0.97,
        }]));

        let html = reqwest::get(&base).await.unwrap().text().await.unwrap();
        for id in [
            "new-target-form",
            "form-message-wrapper",
            "availability-widget-body",
            "latency-distribution-chart",
            "latency-chart",
            "status-code-chart",
        ] {
            assert!(html.contains(&format!("id=\"{}\"", id)), "missing {id}");
        }
        assert!(html.contains("0.97"));
        assert!(html.contains("progress-bar progress-bar-green"));
        // askama escapes slashes, so look for the host part only
        assert!(html.contains("up.io"));
    }

    #[tokio::test]
    async fn test_widget_json_and_unknown_widget() {
        let (base, _dashboard) = spawn_dashboard("http://127.0.0.1:1/target".to_string()).await;

        let chart: serde_json::Value = reqwest::get(format!("{}/widgets/status-code-chart", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(chart["type"], "doughnut");

        let missing = reqwest::get(format!("{}/widgets/nope", base)).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_form_post_reports_backend_message() {
        let backend = spawn_backend(Router::new().route(
            "/target",
            post(|| async {
                Json(CreateTargetResponse {
                    status: "success".to_string(),
                    message: "Target successfully added !".to_string(),
                })
            }),
        ))
        .await;
        let (base, _dashboard) = spawn_dashboard(format!("{}/target", backend)).await;

        let shown: MessageState = reqwest::Client::new()
            .post(format!("{}/target", base))
            .header("content-type", "application/x-www-form-urlencoded")
            .header("accept", "application/json")
            .body("url=https%3A%2F%2Fexample.com&collectioninterval=30")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(shown.text, "Target successfully added !");
        assert_eq!(shown.class, "message-wrapper message-success");
    }

    #[tokio::test]
    async fn test_browser_form_post_redirects_to_dashboard() {
        let (base, dashboard) = spawn_dashboard("http://127.0.0.1:1/target".to_string()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/target", base))
            .header("content-type", "application/x-www-form-urlencoded")
            .body("url=ftp%3A%2F%2Fx&collectioninterval=30")
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.url().path(), "/");

        let html = response.text().await.unwrap();
        assert!(html.contains("Please provide a valid URL"));
        assert_eq!(
            dashboard.form.messages().snapshot().await.class,
            "message-wrapper message-error"
        );
    }

    #[tokio::test]
    async fn test_refused_form_post_reports_body_text() {
        let backend = spawn_backend(Router::new().route(
            "/target",
            post(|| async { (axum::http::StatusCode::CONFLICT, "Target already exists") }),
        ))
        .await;
        let (base, _dashboard) = spawn_dashboard(format!("{}/target", backend)).await;

        let shown: MessageState = reqwest::Client::new()
            .post(format!("{}/target", base))
            .header("content-type", "application/x-www-form-urlencoded")
            .header("accept", "application/json")
            .body("url=https%3A%2F%2Fexample.com&collectioninterval=30")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(shown.text, "Target already exists");
        assert_eq!(shown.class, "message-wrapper message-error");
    }

    #[tokio::test]
    async fn test_script_submits_form_in_place() {
        let (base, _dashboard) = spawn_dashboard("http://127.0.0.1:1/target".to_string()).await;

        let html = reqwest::get(&base).await.unwrap().text().await.unwrap();
        assert!(html.contains("data-message-clear-ms=\"15000\""));

        let script = reqwest::get(format!("{}/static/dashboard.js", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(script.contains("addEventListener(\"submit\""));
        assert!(script.contains("preventDefault()"));
        assert!(script.contains("Accept: \"application/json\""));
        assert!(script.contains("fetchWidget(\"form-message-wrapper\")"));
    }

    #[tokio::test]
    async fn test_static_assets_are_served() {
        let (base, _dashboard) = spawn_dashboard("http://127.0.0.1:1/target".to_string()).await;

        let response = reqwest::get(format!("{}/static/dashboard.js", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.contains("javascript"), "{content_type}");

        let missing = reqwest::get(format!("{}/static/nope.css", base)).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
