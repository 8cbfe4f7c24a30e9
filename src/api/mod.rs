//! HTTP client for the node tracker service.
//!
//! Four operations, all plain JSON over HTTP:
//! - `fetch_snapshot`: GET /api/dashboard (read, pipeline-fatal on failure)
//! - `preview_status`: POST /api/nodes/{id}/estimate-status (read-only dry run)
//! - `save_report`: POST /api/observer/reports (the observer's own log)
//! - `fetch_latest`: GET /api/observer/reports/latest (read-after-write check)
//!
//! Calls are blocking and sequential with one fixed deadline applied
//! uniformly. Error messages always name the method and endpoint and never
//! include the bearer token.

use crate::analysis::StatusPreview;
use crate::models::{ObserverReport, ReportWarning, Snapshot, SuggestedNext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// User-Agent header sent on every request.
const USER_AGENT: &str = "lookout-cli";

/// Fixed per-call deadline applied to every network call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Origin tag recorded with every saved report.
const GENERATED_BY: &str = "lookout_cli";

/// Errors from tracker API calls. The `endpoint` is always `METHOD URL`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Could not reach the service at all
    #[error("cannot reach {endpoint}: {detail}. Check LOOKOUT_BASE_URL")]
    Connect { endpoint: String, detail: String },

    /// The service answered with an HTTP error status
    #[error("{endpoint} returned HTTP {status}: {detail}")]
    Http {
        endpoint: String,
        status: u16,
        detail: String,
    },

    /// The service answered 200 but reported `ok: false`
    #[error("{endpoint} reported an error: {detail}")]
    Service { endpoint: String, detail: String },

    /// The response body could not be decoded
    #[error("unexpected response from {endpoint}: {detail}")]
    Parse { endpoint: String, detail: String },
}

/// Response from the estimate-status preview endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub suggested: Option<SuggestedStatus>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A status suggestion returned by the preview endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestedStatus {
    pub status: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    trays: BTreeMap<String, Vec<crate::models::Node>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct SaveReportRequest<'a> {
    payload: &'a ObserverReport,
    generated_by: &'a str,
    node_count: usize,
}

/// Acknowledgement returned when a report is saved.
#[derive(Debug, Deserialize)]
pub struct SavedReport {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    report: Option<StoredReport>,
    #[serde(default)]
    error: Option<String>,
}

/// The most recently stored report, as returned by the report store.
#[derive(Debug, Deserialize)]
pub struct StoredReport {
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub payload: Option<StoredPayload>,
}

/// Lenient view of a stored report payload; only the fields the integrity
/// check and the status line need.
#[derive(Debug, Default, Deserialize)]
pub struct StoredPayload {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub warnings: Vec<ReportWarning>,
    #[serde(default)]
    pub node_count: Option<u64>,
    #[serde(default)]
    pub suggested_next: Option<SuggestedNext>,
}

/// Blocking client for the tracker service.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl ApiClient {
    /// Create a client for the given base URL. The token, when present, is
    /// attached as a bearer credential to snapshot and report-store calls.
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Fetch the current snapshot of active nodes. Fails loudly: any
    /// transport or service error here is pipeline-fatal.
    pub fn fetch_snapshot(&self) -> Result<Snapshot, ApiError> {
        let url = self.url("/api/dashboard");
        let endpoint = format!("GET {}", url);

        let response = self
            .authorize(self.agent.get(&url).set("User-Agent", USER_AGENT))
            .call()
            .map_err(|e| request_error(e, &endpoint))?;
        let body: DashboardResponse = response
            .into_json()
            .map_err(|e| parse_error(&endpoint, e))?;
        if !body.ok {
            return Err(service_error(&endpoint, body.error));
        }
        Ok(Snapshot { trays: body.trays })
    }

    /// Save a report to the observer report store.
    pub fn save_report(
        &self,
        report: &ObserverReport,
        node_count: usize,
    ) -> Result<SavedReport, ApiError> {
        let url = self.url("/api/observer/reports");
        let endpoint = format!("POST {}", url);

        let response = self
            .authorize(self.agent.post(&url).set("User-Agent", USER_AGENT))
            .send_json(SaveReportRequest {
                payload: report,
                generated_by: GENERATED_BY,
                node_count,
            })
            .map_err(|e| request_error(e, &endpoint))?;
        let body: SavedReport = response
            .into_json()
            .map_err(|e| parse_error(&endpoint, e))?;
        if !body.ok {
            return Err(service_error(&endpoint, body.error));
        }
        Ok(body)
    }

    /// Fetch the most recently saved report (read-after-write check only).
    pub fn fetch_latest(&self) -> Result<Option<StoredReport>, ApiError> {
        let url = self.url("/api/observer/reports/latest");
        let endpoint = format!("GET {}", url);

        let response = self
            .authorize(self.agent.get(&url).set("User-Agent", USER_AGENT))
            .call()
            .map_err(|e| request_error(e, &endpoint))?;
        let body: LatestResponse = response
            .into_json()
            .map_err(|e| parse_error(&endpoint, e))?;
        if !body.ok {
            return Err(service_error(&endpoint, body.error));
        }
        Ok(body.report)
    }
}

impl StatusPreview for ApiClient {
    /// Ask the tracker what status it would assign, without persisting
    /// anything. The request body carries only the intent text; the absence
    /// of a confirm field is what guarantees zero side effects. No bearer
    /// token is attached.
    fn preview_status(&self, node_id: &str, intent: &str) -> Result<PreviewResponse, ApiError> {
        let url = self.url(&format!("/api/nodes/{}/estimate-status", node_id));
        let endpoint = format!("POST {}", url);

        let response = self
            .agent
            .post(&url)
            .set("User-Agent", USER_AGENT)
            .send_json(serde_json::json!({ "intent": intent }))
            .map_err(|e| request_error(e, &endpoint))?;
        let body: PreviewResponse = response
            .into_json()
            .map_err(|e| parse_error(&endpoint, e))?;
        if !body.ok {
            return Err(service_error(&endpoint, body.error));
        }
        Ok(body)
    }
}

fn request_error(err: ureq::Error, endpoint: &str) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => ApiError::Http {
            endpoint: endpoint.to_string(),
            status,
            detail: body_error(status, response),
        },
        other => ApiError::Connect {
            endpoint: endpoint.to_string(),
            detail: format!("{}{}", other, port_hint(endpoint)),
        },
    }
}

fn parse_error(endpoint: &str, err: std::io::Error) -> ApiError {
    ApiError::Parse {
        endpoint: endpoint.to_string(),
        detail: err.to_string(),
    }
}

fn service_error(endpoint: &str, error: Option<String>) -> ApiError {
    ApiError::Service {
        endpoint: endpoint.to_string(),
        detail: error.unwrap_or_else(|| "unknown".to_string()),
    }
}

/// Summarize an HTTP error body: prefer the JSON `error` field (truncated),
/// fall back to the raw text, then to the bare status code.
fn body_error(status: u16, response: ureq::Response) -> String {
    let text = response.into_string().unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return truncate(error, 200);
        }
    }
    if text.is_empty() {
        status.to_string()
    } else {
        truncate(&text, 100)
    }
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
/// Counts characters, not bytes, so multibyte text stays intact.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}

/// A hint naming the port the client tried, for connection errors.
fn port_hint(endpoint: &str) -> String {
    let authority = endpoint
        .split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or("");
    match authority.rsplit_once(':').map(|(_, port)| port) {
        Some(port) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => {
            format!(". Is the tracker running on port {}?", port)
        }
        _ => ". Is the tracker running? (default port 3000)".to_string(),
    }
}
