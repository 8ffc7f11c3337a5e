mod limiter;

pub use limiter::RateLimiter;

use crate::config::Config;
use crate::error::{PantryError, Result};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Status and fully-read body of a dispatched request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub fn build_client(cfg: &Config) -> Result<Client> {
    let mut default_headers = HeaderMap::new();
    let ua = HeaderValue::from_str(&cfg.user_agent)
        .map_err(|e| PantryError::Config(format!("invalid user agent: {}", e)))?;
    default_headers.insert(USER_AGENT, ua);
    let client = Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()?;
    Ok(client)
}

/// Executes requests on a shared transport, optionally behind a
/// [`RateLimiter`]. Transport errors come back as-is; there is no retry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    limiter: Option<Arc<RateLimiter>>,
}

impl Dispatcher {
    pub fn unthrottled(client: Client) -> Self {
        Self {
            client,
            limiter: None,
        }
    }

    pub fn rate_limited(client: Client, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client,
            limiter: Some(limiter),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.limiter.as_ref()
    }

    /// Acquire a permit (when throttled), send, and read the body. Every
    /// await is raced against `cancel`.
    pub async fn execute(
        &self,
        req: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<RawResponse> {
        let req = req.build()?;
        if let Some(limiter) = &self.limiter {
            limiter.acquire(cancel).await?;
        } else if cancel.is_cancelled() {
            return Err(PantryError::Cancelled);
        }
        debug!("{} {}", req.method(), req.url().path());

        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PantryError::Cancelled),
            res = self.client.execute(req) => res?,
        };
        let status = res.status();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PantryError::Cancelled),
            body = res.bytes() => body?,
        };
        debug!("-> {} ({} bytes)", status, body.len());
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_status_mapping() {
        let ok = RawResponse {
            status: StatusCode::OK,
            body: b"fine".to_vec(),
        };
        assert!(ok.is_ok());
        assert_eq!(ok.text(), "fine");
        for s in [
            StatusCode::CREATED,
            StatusCode::BAD_REQUEST,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let r = RawResponse {
                status: s,
                body: Vec::new(),
            };
            assert!(!r.is_ok());
        }
    }

    #[test]
    fn rejects_invalid_user_agent() {
        let mut cfg = Config::new("k");
        cfg.user_agent = "bad\nagent".into();
        assert!(matches!(build_client(&cfg), Err(PantryError::Config(_))));
    }
}
