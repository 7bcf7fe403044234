//! HTTP client for the mediator.
//!
//! The mediator only ever says "here it is" or "nothing yet" (404 with an
//! empty body). The client turns that into one call that either returns the
//! payload or fails for good, see [`retry::retry_with_backoff`].

pub mod retry;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::action::Action;
use crate::observation::PlayerReport;

pub use retry::{AttemptError, CancelToken, Outcome, RetryPolicy};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("mediator did not deliver after {attempts} attempt(s), last failure: {last_failure}")]
    RetryExhausted { attempts: u32, last_failure: String },
    #[error("request was cancelled")]
    Cancelled,
    #[error("mediator answered with non-retryable status {0}")]
    Status(u16),
    #[error("malformed payload from mediator: {0}")]
    Decode(String),
    #[error("invalid mediator url: {0}")]
    Url(String),
    #[error("could not build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Client side of the mediator protocol, as seen from the agent.
pub struct BridgeClient {
    base_url: Url,
    http: reqwest::Client,
    policy: RetryPolicy,
    cancel: CancelToken,
}

impl BridgeClient {
    pub fn new(base_url: &str, policy: RetryPolicy) -> Result<Self, BridgeError> {
        let base_url = Url::parse(base_url).map_err(|err| BridgeError::Url(err.to_string()))?;

        // add headers
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(policy.timeout)
            .build()?;

        Ok(Self {
            base_url,
            http,
            policy,
            cancel: CancelToken::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// A handle that aborts whatever call this client is currently retrying.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn route(&self, route: &str) -> Result<Url, BridgeError> {
        self.base_url
            .join(route)
            .map_err(|err| BridgeError::Url(err.to_string()))
    }

    /// Wait for the player's next report.
    pub async fn get_report(&self) -> Result<PlayerReport, BridgeError> {
        let url = self.route("/state")?;
        let body = retry::retry_with_backoff(&self.policy, &self.cancel, "GET /state", |_| {
            let request = self.http.get(url.clone());
            async move {
                let response = request
                    .send()
                    .await
                    .map_err(|err| AttemptError::Transport(err.to_string()))?;
                read_polled(response).await
            }
        })
        .await?;

        serde_json::from_str(&body).map_err(|err| BridgeError::Decode(err.to_string()))
    }

    /// Hand an action to the player. Returns once the mediator has queued it;
    /// does not wait for the player to act on it.
    pub async fn post_action(&self, action: Action) -> Result<(), BridgeError> {
        let wire = action.wire_value();
        let url = self.route(&format!("/action/{}", wire))?;
        let what = format!("POST /action/{} ({})", wire, action);

        retry::retry_with_backoff(&self.policy, &self.cancel, &what, |_| {
            let request = self.http.post(url.clone());
            async move {
                let response = request
                    .send()
                    .await
                    .map_err(|err| AttemptError::Transport(err.to_string()))?;
                read_polled(response).await
            }
        })
        .await?;

        // The body echoes the whole action buffer; not worth logging.
        log::debug!("[BRIDGE] Posted {}", action);
        Ok(())
    }
}

/// Classify one mediator response.
///
/// A 404 with an empty body is the mediator's "nothing pending yet". A 404
/// with a body comes from its catch-all and means the route itself is wrong;
/// it is still handed back as a (retryable) status so the policy decides,
/// but it is logged loudly since retrying will not fix it.
async fn read_polled(response: reqwest::Response) -> Result<Outcome<String>, AttemptError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| AttemptError::Transport(err.to_string()))?;

    if status.is_success() {
        return Ok(Outcome::Ready(body));
    }
    if status == StatusCode::NOT_FOUND {
        if body.trim().is_empty() {
            return Ok(Outcome::Empty);
        }
        log::warn!(
            "[BRIDGE] 404 with a body, probably a wrong mediator route: {}",
            body
        );
    }
    Err(AttemptError::Status(status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        let response = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        reqwest::Response::from(response)
    }

    #[tokio::test]
    async fn empty_404_means_nothing_pending() {
        let outcome = read_polled(response(404, "")).await.unwrap();
        assert_eq!(outcome, Outcome::Empty);
    }

    #[tokio::test]
    async fn not_found_with_a_body_is_a_routing_error() {
        let body = r#"{"error":"no such route","path":"/stat"}"#;
        match read_polled(response(404, body)).await {
            Err(AttemptError::Status(404)) => {}
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_errors_are_statuses() {
        assert!(matches!(
            read_polled(response(503, "")).await,
            Err(AttemptError::Status(503))
        ));
        assert!(matches!(
            read_polled(response(400, "bad request")).await,
            Err(AttemptError::Status(400))
        ));
    }

    #[tokio::test]
    async fn success_hands_back_the_body() {
        let outcome = read_polled(response(200, r#"{"status":false}"#))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ready(r#"{"status":false}"#.to_string()));
    }
}
