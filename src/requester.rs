//! Client side of identification: validates input locally, calls the
//! identify-species function once and maps its reply onto UI state.

use crate::models::{ErrorBody, IdentificationRequest, RequesterConfig, SpeciesRecord};
use crate::server::IDENTIFY_PATH;
use crate::{Error, Result};
use reqwest::Client;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a species name or upload an image";
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to identify species. Please try again.";
pub const SUCCESS_MESSAGE: &str = "Species identified successfully!";

/// Progress labels shown while an identification is running.
pub const ANALYSIS_STAGES: [&str; 6] = [
    "Scanning image patterns...",
    "Analyzing morphological features...",
    "Querying biological databases...",
    "Cross-referencing taxonomy...",
    "Compiling species profile...",
    "Generating comprehensive report...",
];

const DEFAULT_STAGE_DELAY: Duration = Duration::from_millis(500);

/// Calls a deployed identify-species function.
pub struct SpeciesRequester {
    client: Client,
    endpoint: String,
    anon_key: Option<String>,
    stage_delay: Duration,
}

impl SpeciesRequester {
    pub fn new(config: RequesterConfig) -> Self {
        let endpoint = format!("{}{}", config.base_url.trim_end_matches('/'), IDENTIFY_PATH);
        Self {
            client: Client::new(),
            endpoint,
            anon_key: config.anon_key,
            stage_delay: DEFAULT_STAGE_DELAY,
        }
    }

    pub fn with_stage_delay(mut self, delay: Duration) -> Self {
        self.stage_delay = delay;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Identify without progress reporting.
    pub async fn identify(&self, request: &IdentificationRequest) -> Result<SpeciesRecord> {
        self.identify_with_progress(request, |_| {}).await
    }

    /// Identify, reporting each of [`ANALYSIS_STAGES`] before the call goes out.
    ///
    /// An empty request is refused locally and nothing is sent.
    pub async fn identify_with_progress<F>(
        &self,
        request: &IdentificationRequest,
        mut on_stage: F,
    ) -> Result<SpeciesRecord>
    where
        F: FnMut(&str),
    {
        let body = Self::outgoing_body(request)?;

        for stage in ANALYSIS_STAGES {
            on_stage(stage);
            if !self.stage_delay.is_zero() {
                tokio::time::sleep(self.stage_delay).await;
            }
        }

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.anon_key {
            builder = builder.bearer_auth(key).header("apikey", key);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Identify-species call failed: {}", e);
            e
        })?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| GENERIC_FAILURE_MESSAGE.to_string());
            tracing::error!("Identify-species returned {}: {}", status, message);
            return Err(Error::Remote { status, message });
        }

        let value: serde_json::Value = serde_json::from_str(&text)?;
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return Err(Error::Remote {
                status,
                message: message.to_string(),
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Body actually sent: blank fields dropped and the name trimmed.
    fn outgoing_body(request: &IdentificationRequest) -> Result<IdentificationRequest> {
        let image = request
            .image
            .as_deref()
            .filter(|image| !image.trim().is_empty())
            .map(str::to_string);
        let species_name = request
            .species_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        if image.is_none() && species_name.is_none() {
            return Err(Error::InvalidInput(EMPTY_QUERY_MESSAGE.to_string()));
        }

        Ok(IdentificationRequest {
            image,
            species_name,
        })
    }
}

/// Opaque token identifying one started lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading,
    Identified(Box<SpeciesRecord>),
}

/// Toast-style message produced when a lookup settles.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Identified,
    Failed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Identified => f.write_str(SUCCESS_MESSAGE),
            Notice::Failed(message) => f.write_str(message),
        }
    }
}

/// View state of the species lookup page.
///
/// Only the most recently started lookup may update the state; results of
/// superseded lookups are dropped when they arrive.
pub struct LookupSession {
    latest: AtomicU64,
    state: Mutex<ViewState>,
}

impl LookupSession {
    pub fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
            state: Mutex::new(ViewState::Idle),
        }
    }

    pub fn state(&self) -> ViewState {
        self.lock_state().clone()
    }

    /// Start a lookup: clears any shown result and enters `Loading`.
    pub fn begin(&self) -> LookupTicket {
        let ticket = LookupTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        *self.lock_state() = ViewState::Loading;
        ticket
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Apply a finished lookup. Returns `None` when `ticket` was superseded.
    pub fn resolve(&self, ticket: LookupTicket, result: Result<SpeciesRecord>) -> Option<Notice> {
        let mut state = self.lock_state();
        if !self.is_current(ticket) {
            tracing::debug!("Dropping stale lookup result {:?}", ticket);
            return None;
        }

        match result {
            Ok(record) => {
                *state = ViewState::Identified(Box::new(record));
                Some(Notice::Identified)
            }
            Err(err) => {
                *state = ViewState::Idle;
                Some(Notice::Failed(user_message(&err)))
            }
        }
    }

    /// Run `requester` for `request` and apply the outcome.
    pub async fn lookup(
        &self,
        requester: &SpeciesRequester,
        request: &IdentificationRequest,
    ) -> Option<Notice> {
        let ticket = self.begin();
        let result = requester.identify(request).await;
        self.resolve(ticket, result)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LookupSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Message worth showing to a person for a failed lookup.
pub fn user_message(err: &Error) -> String {
    match err {
        Error::Remote { message, .. } | Error::InvalidInput(message) => message.clone(),
        Error::ImageTooLarge { .. } => err.to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FALLBACK_COMMON_NAME;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn requester(server: &MockServer, anon_key: Option<&str>) -> SpeciesRequester {
        SpeciesRequester::new(RequesterConfig {
            base_url: server.uri(),
            anon_key: anon_key.map(str::to_string),
        })
        .with_stage_delay(Duration::ZERO)
    }

    fn record() -> SpeciesRecord {
        SpeciesRecord::fallback("")
    }

    #[tokio::test]
    async fn test_empty_request_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = IdentificationRequest {
            image: Some(String::new()),
            species_name: Some("   ".to_string()),
        };
        let mut stages = 0;
        let err = requester(&server, None)
            .identify_with_progress(&request, |_| stages += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(ref msg) if msg == EMPTY_QUERY_MESSAGE));
        assert_eq!(stages, 0);
    }

    #[tokio::test]
    async fn test_success_returns_record_and_reports_stages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(IDENTIFY_PATH))
            .and(body_json(json!({ "speciesName": "Bengal Tiger" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(record()))
            .expect(1)
            .mount(&server)
            .await;

        let mut seen = Vec::new();
        let result = requester(&server, None)
            .identify_with_progress(&IdentificationRequest::by_name("  Bengal Tiger "), |s| {
                seen.push(s.to_string())
            })
            .await
            .unwrap();

        assert_eq!(result.common_name, FALLBACK_COMMON_NAME);
        assert_eq!(seen, ANALYSIS_STAGES.map(str::to_string).to_vec());
    }

    #[tokio::test]
    async fn test_anon_key_is_sent_as_bearer_and_apikey() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer anon"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record()))
            .expect(1)
            .mount(&server)
            .await;

        requester(&server, Some("anon"))
            .identify(&IdentificationRequest::by_name("Oak"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_body_becomes_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({ "error": "Rate limit exceeded. Please try again later." })),
            )
            .mount(&server)
            .await;

        let err = requester(&server, None)
            .identify(&IdentificationRequest::by_name("Oak"))
            .await
            .unwrap_err();

        assert_eq!(err.remote_status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(err.to_string(), "Rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn test_unreadable_error_body_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = requester(&server, None)
            .identify(&IdentificationRequest::by_name("Oak"))
            .await
            .unwrap_err();

        assert!(err.is_remote());
        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_error_field_in_success_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
            .mount(&server)
            .await;

        let err = requester(&server, None)
            .identify(&IdentificationRequest::by_name("Oak"))
            .await
            .unwrap_err();

        assert_eq!(err.remote_status(), Some(StatusCode::OK));
        assert_eq!(err.to_string(), "nope");
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        let requester = SpeciesRequester::new(RequesterConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            anon_key: None,
        })
        .with_stage_delay(Duration::ZERO);

        let err = requester
            .identify(&IdentificationRequest::by_name("Oak"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert_eq!(user_message(&err), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_endpoint_joins_function_path() {
        let requester = SpeciesRequester::new(RequesterConfig {
            base_url: "https://project.example/".to_string(),
            anon_key: None,
        });
        assert_eq!(
            requester.endpoint(),
            "https://project.example/functions/v1/identify-species"
        );
    }

    #[test]
    fn test_session_applies_latest_result() {
        let session = LookupSession::new();
        let ticket = session.begin();
        assert_eq!(session.state(), ViewState::Loading);

        let notice = session.resolve(ticket, Ok(record()));
        assert_eq!(notice, Some(Notice::Identified));
        assert_eq!(notice.unwrap().to_string(), SUCCESS_MESSAGE);
        assert!(matches!(session.state(), ViewState::Identified(_)));
    }

    #[test]
    fn test_session_drops_stale_result() {
        let session = LookupSession::new();
        let first = session.begin();
        let second = session.begin();

        assert_eq!(session.resolve(first, Ok(record())), None);
        assert_eq!(session.state(), ViewState::Loading);

        let notice = session.resolve(
            second,
            Err(Error::Remote {
                status: StatusCode::PAYMENT_REQUIRED,
                message: "API credits exhausted. Please add credits.".to_string(),
            }),
        );
        assert_eq!(
            notice,
            Some(Notice::Failed("API credits exhausted. Please add credits.".to_string()))
        );
        assert_eq!(session.state(), ViewState::Idle);
    }

    #[test]
    fn test_begin_clears_previous_result() {
        let session = LookupSession::new();
        let ticket = session.begin();
        session.resolve(ticket, Ok(record()));

        session.begin();
        assert_eq!(session.state(), ViewState::Loading);
    }

    #[tokio::test]
    async fn test_lookup_runs_requester_and_applies_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record()))
            .mount(&server)
            .await;

        let session = LookupSession::new();
        let notice = session
            .lookup(&requester(&server, None), &IdentificationRequest::by_name("Oak"))
            .await;

        assert_eq!(notice, Some(Notice::Identified));
        assert!(matches!(session.state(), ViewState::Identified(_)));
    }
}
