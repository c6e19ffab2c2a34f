use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use logging::redact_sensitive_data;
use sinkaudit_core::{AuditError, Stage};

/// Longest provider error body carried into an error message.
const MAX_ERROR_BODY: usize = 300;

/// Base URLs of the Google APIs the audit reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub logging: String,
    pub storage: String,
    pub bigquery: String,
    pub pubsub: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            logging: "https://logging.googleapis.com".to_string(),
            storage: "https://storage.googleapis.com".to_string(),
            bigquery: "https://bigquery.googleapis.com".to_string(),
            pubsub: "https://pubsub.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at one base URL (emulators, stubs).
    pub fn all(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            logging: base.clone(),
            storage: base.clone(),
            bigquery: base.clone(),
            pubsub: base,
        }
    }
}

/// Authenticated HTTP client shared by the sink lookup and the fetchers.
pub struct GcpClient {
    http: Client,
    access_token: String,
    endpoints: Endpoints,
}

/// What a 404 means for the call being made.
pub(crate) enum NotFound {
    Sink { sink: String, project: String },
    Resource,
}

/// Identifies a call for error mapping.
pub(crate) struct CallSite<'a> {
    pub stage: Stage,
    pub resource: &'a str,
    pub not_found: NotFound,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl GcpClient {
    pub fn new(access_token: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            http: Client::new(),
            access_token: access_token.into(),
            endpoints,
        }
    }

    /// Build with a per-request timeout.
    pub fn with_timeout(
        access_token: impl Into<String>,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            access_token: access_token.into(),
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        site: CallSite<'_>,
    ) -> Result<T, AuditError> {
        debug!(url, stage = %site.stage, "GET");
        self.send(self.http.get(url), site).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
        site: CallSite<'_>,
    ) -> Result<T, AuditError> {
        debug!(url, stage = %site.stage, "POST");
        self.send(self.http.post(url).json(body), site).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        site: CallSite<'_>,
    ) -> Result<T, AuditError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport(&site, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response, site).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| transport(&site, format!("unreadable response: {e}")))
    }
}

fn transport(site: &CallSite<'_>, message: String) -> AuditError {
    AuditError::Transport {
        stage: site.stage,
        resource: site.resource.to_string(),
        message,
    }
}

async fn status_error(status: StatusCode, response: Response, site: CallSite<'_>) -> AuditError {
    let body = response.text().await.unwrap_or_default();
    let message = provider_message(&body);
    debug!(status = %status, message = %message, "Provider returned error");

    match status {
        StatusCode::NOT_FOUND => match site.not_found {
            NotFound::Sink { sink, project } => AuditError::SinkNotFound { sink, project },
            NotFound::Resource => AuditError::ResourceNotFound {
                resource: site.resource.to_string(),
            },
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuditError::PermissionDenied {
            stage: site.stage,
            resource: site.resource.to_string(),
            message,
        },
        _ => transport(&site, format!("{status}: {message}")),
    }
}

/// Pull the human message out of a Google error body, falling back to the
/// raw (redacted, truncated) text.
fn provider_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = envelope.error.message {
            return redact_sensitive_data(&message);
        }
    }
    let mut text = redact_sensitive_data(body.trim());
    if text.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
