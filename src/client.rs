use crate::config::{Config, DecodeMode};
use crate::error::{PantryError, Result};
use crate::http::{build_client, Dispatcher, RateLimiter, RawResponse};
use crate::record::ensure_record;
use crate::types::{PantryInfo, UpdatedInfo};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Client for a single pantry. Each operation issues exactly one request.
///
/// Cloning is cheap and clones share the transport and the rate limiter.
#[derive(Debug, Clone)]
pub struct PantryClient {
    dispatcher: Dispatcher,
    pantry_url: Url,
    decode_mode: DecodeMode,
}

impl PantryClient {
    /// Builds a client; throttled unless `cfg.rate_limit` is `None`.
    pub fn new(cfg: Config) -> Result<Self> {
        let client = build_client(&cfg)?;
        let dispatcher = match cfg.rate_limit {
            Some(rl) => Dispatcher::rate_limited(client, Arc::new(RateLimiter::new(rl))),
            None => Dispatcher::unthrottled(client),
        };
        Self::from_parts(&cfg, dispatcher)
    }

    /// Builds a throttled client that draws permits from `limiter`, which may
    /// be shared with other clients. `cfg.rate_limit` is ignored.
    pub fn with_limiter(cfg: Config, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = build_client(&cfg)?;
        Self::from_parts(&cfg, Dispatcher::rate_limited(client, limiter))
    }

    fn from_parts(cfg: &Config, dispatcher: Dispatcher) -> Result<Self> {
        let mut pantry_url = Url::parse(&cfg.api_url)
            .map_err(|e| PantryError::Config(format!("invalid api url {}: {}", cfg.api_url, e)))?;
        pantry_url
            .path_segments_mut()
            .map_err(|_| PantryError::Config(format!("api url cannot be a base: {}", cfg.api_url)))?
            .pop_if_empty()
            .push("pantry")
            .push(&cfg.api_key);
        Ok(Self {
            dispatcher,
            pantry_url,
            decode_mode: cfg.decode_mode,
        })
    }

    pub fn limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.dispatcher.limiter()
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    fn basket_url(&self, name: &str) -> Url {
        let mut url = self.pantry_url.clone();
        // pantry_url was checked to be a base url in from_parts.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("basket").push(name);
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        cancel: &CancellationToken,
    ) -> Result<RawResponse> {
        let mut req = self.dispatcher.client().request(method, url);
        if let Some(body) = body {
            req = req
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }
        self.dispatcher.execute(req, cancel).await
    }

    fn decode_info(&self, res: RawResponse) -> Result<PantryInfo> {
        match self.decode_mode {
            DecodeMode::Lenient => Ok(PantryInfo::from_json_lenient(&res.body)),
            DecodeMode::Strict => decode_strict(res),
        }
    }

    fn decode_content<T: DeserializeOwned>(&self, res: RawResponse) -> Result<T> {
        match self.decode_mode {
            DecodeMode::Lenient => serde_json::from_slice(&res.body).map_err(PantryError::Decode),
            DecodeMode::Strict => decode_strict(res),
        }
    }

    /// GET /pantry/{key}
    pub async fn get_details(&self, cancel: &CancellationToken) -> Result<PantryInfo> {
        let res = self
            .send(Method::GET, self.pantry_url.clone(), None, cancel)
            .await?;
        self.decode_info(res)
    }

    /// PUT /pantry/{key}
    pub async fn update_details(
        &self,
        info: &UpdatedInfo,
        cancel: &CancellationToken,
    ) -> Result<PantryInfo> {
        let body = serde_json::to_vec(info).map_err(PantryError::Serialization)?;
        let res = self
            .send(Method::PUT, self.pantry_url.clone(), Some(body), cancel)
            .await?;
        self.decode_info(res)
    }

    /// POST /pantry/{key}/basket/{name}. Returns true iff the service answered 200.
    ///
    /// `data` must serialize as a struct; anything else fails with
    /// [`PantryError::TypeMismatch`] before a request is made.
    pub async fn create_or_replace_basket<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        ensure_record(data)?;
        let body = serde_json::to_vec(data).map_err(PantryError::Serialization)?;
        let res = self
            .send(Method::POST, self.basket_url(name), Some(body), cancel)
            .await?;
        Ok(res.is_ok())
    }

    /// Like [`create_or_replace_basket`](Self::create_or_replace_basket) for an
    /// untyped JSON object.
    pub async fn create_or_replace_basket_json(
        &self,
        name: &str,
        data: &Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let body = serde_json::to_vec(data).map_err(PantryError::Serialization)?;
        let res = self
            .send(Method::POST, self.basket_url(name), Some(body), cancel)
            .await?;
        Ok(res.is_ok())
    }

    /// PUT /pantry/{key}/basket/{name}. The service merges `data` into the
    /// basket and answers with the full content, decoded back into `T`.
    pub async fn update_basket_content<T: Serialize + DeserializeOwned>(
        &self,
        name: &str,
        data: &T,
        cancel: &CancellationToken,
    ) -> Result<T> {
        ensure_record(data)?;
        let body = serde_json::to_vec(data).map_err(PantryError::Serialization)?;
        let res = self
            .send(Method::PUT, self.basket_url(name), Some(body), cancel)
            .await?;
        self.decode_content(res)
    }

    pub async fn update_basket_content_json(
        &self,
        name: &str,
        data: &Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let body = serde_json::to_vec(data).map_err(PantryError::Serialization)?;
        let res = self
            .send(Method::PUT, self.basket_url(name), Some(body), cancel)
            .await?;
        self.decode_content(res)
    }

    /// GET /pantry/{key}/basket/{name}, decoded into whatever shape the caller asks for.
    pub async fn get_basket_content<T: DeserializeOwned>(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let res = self
            .send(Method::GET, self.basket_url(name), None, cancel)
            .await?;
        self.decode_content(res)
    }

    /// DELETE /pantry/{key}/basket/{name}. Removes the basket and all of its
    /// data. Returns true iff the service answered 200.
    pub async fn delete_basket(&self, name: &str, cancel: &CancellationToken) -> Result<bool> {
        let res = self
            .send(Method::DELETE, self.basket_url(name), None, cancel)
            .await?;
        Ok(res.is_ok())
    }

    /// Fetches the pantry details and looks for `name` among its baskets.
    pub async fn has_basket(&self, name: &str, cancel: &CancellationToken) -> Result<bool> {
        let info = self.get_details(cancel).await?;
        Ok(info.has_basket(name))
    }
}

fn decode_strict<T: DeserializeOwned>(res: RawResponse) -> Result<T> {
    if !res.status.is_success() {
        return Err(PantryError::Status {
            status: res.status,
            body: res.text(),
        });
    }
    serde_json::from_slice(&res.body).map_err(PantryError::Decode)
}
