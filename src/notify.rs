//! Outbound notification to the remediation dispatcher.
//!
//! Notifications are fire-and-forget: the caller never waits on the
//! dispatcher, nothing is retried, and failures end up in the log only.

use std::time::Duration;

use thiserror::Error;

use crate::models::FailureAlert;

/// Receives failed check-ins. Implementations must not block the caller.
pub trait FailureNotifier: Send + Sync {
    fn notify(&self, alert: FailureAlert);
}

/// Used when no dispatcher URL is configured.
#[derive(Debug, Default)]
pub struct DisabledNotifier;

impl FailureNotifier for DisabledNotifier {
    fn notify(&self, alert: FailureAlert) {
        tracing::debug!(
            student_id = alert.student_id,
            "dispatcher webhook not configured, skipping notification"
        );
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("dispatcher answered with status {0}")]
    Rejected(reqwest::StatusCode),
}

/// Posts each alert as JSON to the dispatcher's webhook from a spawned task.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, alert: &FailureAlert) -> Result<reqwest::StatusCode, NotifyError> {
        let response = self.client.post(&self.url).json(alert).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status));
        }
        Ok(status)
    }
}

impl FailureNotifier for WebhookNotifier {
    fn notify(&self, alert: FailureAlert) {
        let notifier = self.clone();
        tracing::info!(
            student_id = alert.student_id,
            url = %notifier.url,
            "triggering dispatcher webhook"
        );
        tokio::spawn(async move {
            match notifier.send(&alert).await {
                Ok(status) => tracing::info!(
                    student_id = alert.student_id,
                    status = status.as_u16(),
                    "dispatcher webhook sent"
                ),
                Err(err) => tracing::warn!(
                    student_id = alert.student_id,
                    error = %err,
                    "dispatcher webhook failed"
                ),
            }
        });
    }
}


#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tokio::sync::mpsc;

    use super::*;

    /// Serves a dispatcher stand-in on an ephemeral port and forwards what it receives.
    async fn dispatcher(
        reply: StatusCode,
    ) -> (String, mpsc::UnboundedReceiver<(Option<String>, serde_json::Value)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, body: String| {
                let tx = tx.clone();
                async move {
                    let content_type = headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    let _ = tx.send((content_type, serde_json::from_str(&body).unwrap()));
                    reply
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), rx)
    }

    /// Talks to the local stand-in directly, whatever proxy the environment sets.
    fn local_notifier(url: String) -> WebhookNotifier {
        WebhookNotifier {
            client: reqwest::Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
            url,
        }
    }

    fn failing_alert() -> FailureAlert {
        FailureAlert {
            student_id: 2,
            quiz_score: 5,
            focus_minutes: 30,
        }
    }

    #[tokio::test]
    async fn webhook_posts_alert_as_json() {
        let (url, mut received) = dispatcher(StatusCode::OK).await;
        let notifier = local_notifier(url);

        let status = notifier.send(&failing_alert()).await.unwrap();

        assert_eq!(status, reqwest::StatusCode::OK);
        let (content_type, body) = received.recv().await.unwrap();
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(
            body,
            serde_json::json!({ "student_id": 2, "quiz_score": 5, "focus_minutes": 30 })
        );
    }

    #[tokio::test]
    async fn notify_delivers_from_a_background_task() {
        let (url, mut received) = dispatcher(StatusCode::OK).await;
        let notifier = local_notifier(url);

        notifier.notify(failing_alert());

        let (_, body) = tokio::time::timeout(Duration::from_secs(5), received.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body["student_id"], 2);
    }

    #[tokio::test]
    async fn dispatcher_error_status_is_a_failure() {
        let (url, _received) = dispatcher(StatusCode::INTERNAL_SERVER_ERROR).await;
        let notifier = local_notifier(url);

        assert!(matches!(
            notifier.send(&failing_alert()).await,
            Err(NotifyError::Rejected(status)) if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[test]
    fn alert_payload_uses_snake_case_fields() {
        let alert = FailureAlert {
            student_id: 2,
            quiz_score: 5,
            focus_minutes: 30,
        };
        assert_eq!(
            serde_json::to_value(alert).unwrap(),
            serde_json::json!({ "student_id": 2, "quiz_score": 5, "focus_minutes": 30 })
        );
    }

    #[tokio::test]
    async fn unreachable_dispatcher_does_not_reach_the_caller() {
        let notifier =
            WebhookNotifier::new("http://127.0.0.1:9/hook", Duration::from_millis(200)).unwrap();
        let alert = FailureAlert {
            student_id: 2,
            quiz_score: 1,
            focus_minutes: 1,
        };
        assert!(notifier.send(&alert).await.is_err());
        notifier.notify(alert);
    }
}
