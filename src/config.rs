use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::Args;

use crate::notify::{DisabledNotifier, FailureNotifier, WebhookNotifier};

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address the HTTP service listens on
    #[arg(long, env = "FOCUS_BIND", default_value = "0.0.0.0:4000")]
    pub bind: SocketAddr,

    /// Dispatcher webhook fired on failed check-ins; notifications are off when unset
    #[arg(long, env = "DISPATCHER_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Upper bound on a single webhook call
    #[arg(
        long,
        env = "DISPATCHER_WEBHOOK_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=120)
    )]
    pub webhook_timeout_secs: u64,

    /// Browser origin allowed to call the API, repeatable; any origin when unset
    #[arg(long = "cors-origin", env = "FOCUS_CORS_ORIGIN", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

impl ServeArgs {
    /// A blank URL counts as unset.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn cors_origins(&self) -> anyhow::Result<Vec<HeaderValue>> {
        self.cors_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("invalid CORS origin {origin:?}"))
            })
            .collect()
    }

    pub fn notifier(&self) -> anyhow::Result<Arc<dyn FailureNotifier>> {
        match self.webhook_url() {
            Some(url) => {
                let notifier =
                    WebhookNotifier::new(url, Duration::from_secs(self.webhook_timeout_secs))?;
                tracing::info!(url = notifier.url(), "dispatcher webhook enabled");
                Ok(Arc::new(notifier))
            }
            None => {
                tracing::info!("dispatcher webhook disabled");
                Ok(Arc::new(DisabledNotifier))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn defaults_listen_on_4000_without_webhook() {
        let cli = TestCli::try_parse_from(["focus-mode"]).unwrap();
        assert_eq!(cli.serve.bind, "0.0.0.0:4000".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.serve.webhook_timeout_secs, 10);
        if std::env::var_os("DISPATCHER_WEBHOOK_URL").is_none() {
            assert_eq!(cli.serve.webhook_url(), None);
        }
    }

    #[test]
    fn blank_webhook_url_disables_notification() {
        let cli = TestCli::try_parse_from(["focus-mode", "--webhook-url", "  "]).unwrap();
        assert_eq!(cli.serve.webhook_url(), None);
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let cli = TestCli::try_parse_from([
            "focus-mode",
            "--cors-origin",
            "https://focus-mode-frontend.onrender.com, http://localhost:5173",
        ])
        .unwrap();
        assert_eq!(
            cli.serve.cors_origins().unwrap(),
            vec![
                HeaderValue::from_static("https://focus-mode-frontend.onrender.com"),
                HeaderValue::from_static("http://localhost:5173"),
            ]
        );
    }

    #[test]
    fn cors_origin_must_be_a_valid_header() {
        let cli = TestCli::try_parse_from(["focus-mode", "--cors-origin", "http://a\nb"]).unwrap();
        assert!(cli.serve.cors_origins().is_err());
    }

    #[test]
    fn webhook_timeout_is_bounded() {
        assert!(TestCli::try_parse_from(["focus-mode", "--webhook-timeout-secs", "0"]).is_err());
        assert!(TestCli::try_parse_from(["focus-mode", "--webhook-timeout-secs", "600"]).is_err());
    }
}
