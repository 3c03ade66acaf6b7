// src/utils/http.rs

//! HTTP client utilities.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::PortalConfig;

/// Login form, relative to the portal base URL.
pub const LOGIN_PATH: &str = "login.aspx";

/// Saved-search result pages.
pub const PORTAL_PATH: &str = "pages/portal.aspx";

/// Download-intent endpoint that issues `ClientRefId`s.
pub const DOWNLOAD_HANDLER_PATH: &str = "pages/DownloadHandler.ashx";

/// Base that `ClientRefId`s are resolved against.
pub const CONTENT_BASE_PATH: &str = "pages/";

/// Create a configured asynchronous HTTP client that stores cookies in `jar`.
pub fn create_async_client(config: &PortalConfig, jar: Arc<Jar>) -> Result<Client> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_provider(jar)
        .build()
        .map_err(|e| AppError::transport("build_client", e))
}

/// HTTP access to one portal, with a shared cookie jar and retry policy.
#[derive(Clone)]
pub struct PortalClient {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
    backoff: ExponentialBuilder,
}

impl PortalClient {
    /// Create a client with an empty cookie jar.
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let http = create_async_client(config, Arc::clone(&jar))?;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(config.max_retries);

        Ok(Self {
            http,
            jar,
            base_url,
            backoff,
        })
    }

    /// Absolute URL of a portal path.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// The `Cookie` header value the jar would send to `url`, if any.
    pub fn cookies_for(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Send a request, retrying transient failures.
    ///
    /// `build` is called once per attempt. Non-success statuses are errors.
    pub async fn send<F>(&self, stage: &'static str, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.send_with(stage, self.backoff.clone(), build).await
    }

    /// Send a request exactly once. Used for form submissions that must not
    /// be replayed.
    pub async fn submit<F>(&self, stage: &'static str, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.send_with(stage, self.backoff.clone().with_max_times(0), build)
            .await
    }

    async fn send_with<F>(
        &self,
        stage: &'static str,
        backoff: ExponentialBuilder,
        build: F,
    ) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let build = &build;
        let http = &self.http;

        let attempt = move || async move {
            let response = build(http)
                .send()
                .await
                .map_err(|e| AppError::transport(stage, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::status(stage, status));
            }
            log::trace!("{} ({})", response.url(), status.as_u16());
            Ok::<_, AppError>(response)
        };

        attempt
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .when(AppError::is_retryable)
            .notify(|err: &AppError, delay: Duration| {
                log::warn!(
                    "Retrying {} in {}ms: {}",
                    stage,
                    delay.as_millis(),
                    err
                );
            })
            .await
    }

    /// GET a page and return its body as text.
    pub async fn get_text<Q>(&self, stage: &'static str, url: &Url, query: &Q) -> Result<String>
    where
        Q: serde::Serialize + ?Sized,
    {
        let response = self
            .send(stage, |http| http.get(url.clone()).query(query))
            .await?;
        response
            .text()
            .await
            .map_err(|e| AppError::transport(stage, e))
    }

    /// GET a binary body.
    pub async fn get_bytes(&self, stage: &'static str, url: &Url) -> Result<Vec<u8>> {
        let response = self.send(stage, |http| http.get(url.clone())).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::transport(stage, e))?;
        Ok(bytes.to_vec())
    }
}
