//! Donation redirect resolver.
//!
//! Asks the redirect decision service where to send a donor, racing the request against a
//! fixed timer. Whatever goes wrong (rejection, malformed answer, transport error, timeout)
//! the donor lands on the fallback donation page; the distinction is only logged.

mod race;

pub use race::*;

use std::time::Duration;

use futures::FutureExt;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::models::AttributionParams;

/// How a redirect was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The decision service answered with a destination.
    Service,
    /// The service answered with a non-success status.
    Rejected,
    /// The service answered without a usable `redirect_url`.
    Malformed,
    /// The request never completed.
    Unreachable,
    /// The timer fired first.
    TimedOut,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Service => "service",
            Outcome::Rejected => "rejected",
            Outcome::Malformed => "malformed",
            Outcome::Unreachable => "unreachable",
            Outcome::TimedOut => "timeout",
        }
    }
}

/// Where to send the donor, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub destination: String,
    pub outcome: Outcome,
}

#[derive(Debug, Deserialize)]
struct DecisionResponse {
    #[serde(default)]
    redirect_url: Option<String>,
}

/// Resolves the donation redirect for one page load.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    client: reqwest::Client,
    endpoint: String,
    fallback: String,
    timeout: Duration,
}

impl RedirectResolver {
    pub fn new(endpoint: impl Into<String>, fallback: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            fallback: fallback.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.donate_go_url.clone(),
            config.donate_fallback_url.clone(),
            config.redirect_timeout,
        )
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback
    }

    /// Decide the destination. Returns `None` if `cancel` fires before anything settles;
    /// the pending request and timer are dropped with it.
    pub async fn resolve(
        &self,
        params: &AttributionParams,
        cancel: &CancellationToken,
    ) -> Option<Resolution> {
        let request = self.request(params).boxed();
        let timer = async move {
            tokio::time::sleep(self.timeout).await;
            self.fall_back(Outcome::TimedOut)
        }
        .boxed();

        let resolution = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Donation redirect cancelled before it resolved");
                return None;
            }
            (resolution, _) = first_settled(vec![request, timer]) => resolution,
        };

        match resolution.outcome {
            Outcome::Service => tracing::info!(
                destination = %resolution.destination,
                "Donation redirect resolved by decision service"
            ),
            outcome => tracing::warn!(
                reason = outcome.as_str(),
                "Donation redirect falling back"
            ),
        }
        Some(resolution)
    }

    /// Resolve and navigate through `guard`. Returns whether a navigation happened.
    pub async fn navigate<N: Navigator>(
        &self,
        params: &AttributionParams,
        guard: &NavigationGuard<N>,
        cancel: &CancellationToken,
    ) -> bool {
        match self.resolve(params, cancel).await {
            Some(resolution) => guard.replace(&resolution.destination),
            None => false,
        }
    }

    async fn request(&self, params: &AttributionParams) -> Resolution {
        let response = match self
            .client
            .post(&self.endpoint)
            .header(CACHE_CONTROL, "no-store")
            .json(params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "Decision service unreachable");
                return self.fall_back(Outcome::Unreachable);
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Decision service rejected request");
            return self.fall_back(Outcome::Rejected);
        }

        match response.json::<DecisionResponse>().await {
            Ok(DecisionResponse {
                redirect_url: Some(url),
            }) if !url.trim().is_empty() => Resolution {
                destination: url,
                outcome: Outcome::Service,
            },
            _ => self.fall_back(Outcome::Malformed),
        }
    }

    fn fall_back(&self, outcome: Outcome) -> Resolution {
        Resolution {
            destination: self.fallback.clone(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    const FALLBACK: &str = "https://fallback.example/donate";

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Navigator for Recorder {
        fn replace(&self, url: &str) {
            self.0.lock().unwrap().push(url.to_string());
        }
    }

    type Received = Arc<Mutex<Vec<Value>>>;

    /// Spawn a stub decision service and return its base URL.
    async fn stub_service(received: Received) -> String {
        async fn ok(State(received): State<Received>, Json(body): Json<Value>) -> Json<Value> {
            received.lock().unwrap().push(body);
            Json(json!({ "redirect_url": "https://give.example/campaign?t=tok" }))
        }
        async fn reject() -> StatusCode {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        async fn missing() -> Json<Value> {
            Json(json!({ "token": "abc" }))
        }
        async fn slow() -> Json<Value> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "redirect_url": "https://give.example/late" }))
        }

        let app = Router::new()
            .route("/ok", post(ok))
            .route("/reject", post(reject))
            .route("/missing", post(missing))
            .route("/slow", post(slow))
            .with_state(received);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn params() -> AttributionParams {
        AttributionParams {
            gclid: Some("abc123".to_string()),
            utm_source: Some("google".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_service_destination_wins() {
        let received = Received::default();
        let base = stub_service(received.clone()).await;
        let resolver =
            RedirectResolver::new(format!("{base}/ok"), FALLBACK, Duration::from_secs(4));
        let guard = NavigationGuard::new(Recorder::default());

        let navigated = resolver
            .navigate(&params(), &guard, &CancellationToken::new())
            .await;

        assert!(navigated);
        assert_eq!(guard.attempts(), 1);
        assert_eq!(
            *guard.navigator().0.lock().unwrap(),
            vec!["https://give.example/campaign?t=tok".to_string()]
        );
        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["gclid"], "abc123");
        assert_eq!(bodies[0]["utm_source"], "google");
        assert_eq!(bodies[0]["utm_medium"], Value::Null);
    }

    #[tokio::test]
    async fn test_rejection_and_missing_field_fall_back_immediately() {
        let base = stub_service(Received::default()).await;

        for (path, expected) in [("reject", Outcome::Rejected), ("missing", Outcome::Malformed)] {
            let resolver = RedirectResolver::new(
                format!("{base}/{path}"),
                FALLBACK,
                Duration::from_secs(10),
            );
            let started = Instant::now();
            let resolution = resolver
                .resolve(&params(), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(resolution.destination, FALLBACK);
            assert_eq!(resolution.outcome, expected);
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }

    #[tokio::test]
    async fn test_network_error_falls_back_before_timeout() {
        // Nothing listens on port 1.
        let resolver =
            RedirectResolver::new("http://127.0.0.1:1/", FALLBACK, Duration::from_secs(10));
        let started = Instant::now();

        let resolution = resolver
            .resolve(&params(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(resolution.outcome, Outcome::Unreachable);
        assert_eq!(resolution.destination, FALLBACK);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_navigates_to_fallback_once() {
        let base = stub_service(Received::default()).await;
        let resolver =
            RedirectResolver::new(format!("{base}/slow"), FALLBACK, Duration::from_millis(100));
        let guard = NavigationGuard::new(Recorder::default());

        assert!(
            resolver
                .navigate(&params(), &guard, &CancellationToken::new())
                .await
        );
        // Give the losing request time to have finished had it not been dropped.
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(guard.attempts(), 1);
        assert_eq!(
            *guard.navigator().0.lock().unwrap(),
            vec![FALLBACK.to_string()]
        );
    }

    #[tokio::test]
    async fn test_cancel_prevents_any_navigation() {
        let base = stub_service(Received::default()).await;
        let resolver =
            RedirectResolver::new(format!("{base}/slow"), FALLBACK, Duration::from_millis(200));
        let guard = NavigationGuard::new(Recorder::default());
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        assert!(!resolver.navigate(&params(), &guard, &cancel).await);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!guard.has_navigated());
        assert_eq!(guard.attempts(), 0);
    }
}
