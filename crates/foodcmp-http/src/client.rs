//! `Provider` adapter for storefronts that expose the foodcmp JSON API.
//!
//! Wraps `reqwest` with storefront-specific status handling and typed
//! response deserialization. Read-only calls retry transient failures; cart
//! mutations are sent exactly once per call.

use std::time::Duration;
use std::vec::IntoIter;

use async_trait::async_trait;
use foodcmp_core::{AppConfig, ItemResult, ProviderConfig, ProviderId, SearchRequest};
use foodcmp_orchestrator::{IdempotencyToken, Provider, ProviderError, Readiness, RunContext};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::HttpProviderError;
use crate::retry::retry_with_backoff;
use crate::types::{CartItemBody, CartResponse, SearchResponse};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Connection settings shared by every HTTP provider in a run.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts for read-only calls after a transient failure.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.http_request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.http_max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            user_agent: "foodcmp/0.1 (deal-comparison)".to_owned(),
            max_retries: 2,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

/// A storefront reached over HTTP.
///
/// Use [`HttpProvider::from_config`] with an entry from the providers file, or
/// [`HttpProvider::with_base_url`] to point at a mock server in tests.
pub struct HttpProvider {
    id: ProviderId,
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    ctx: RunContext,
}

impl HttpProvider {
    /// Builds an adapter for one entry of the providers file.
    ///
    /// # Errors
    ///
    /// Returns [`HttpProviderError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`HttpProviderError::InvalidBaseUrl`] if the entry's
    /// URL does not parse.
    pub fn from_config(
        config: &ProviderConfig,
        settings: &HttpSettings,
        ctx: RunContext,
    ) -> Result<Self, HttpProviderError> {
        Self::with_base_url(config.id(), &config.base_url, settings, ctx)
    }

    /// Builds an adapter rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpProviderError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`HttpProviderError::InvalidBaseUrl`] if `base_url`
    /// does not parse.
    pub fn with_base_url(
        id: ProviderId,
        base_url: &str,
        settings: &HttpSettings,
        ctx: RunContext,
    ) -> Result<Self, HttpProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        // Trailing slash so that `Url::join` appends endpoint paths instead of
        // replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| HttpProviderError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            id,
            client,
            base_url: parsed,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
            ctx,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, HttpProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| HttpProviderError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn search_url(&self, term: &str, request: &SearchRequest) -> Result<Url, HttpProviderError> {
        let mut url = self.endpoint("search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", term);
            pairs.append_pair("limit", &request.max_results_per_provider().to_string());
            if let Some(location) = request.location() {
                pairs.append_pair("location", location);
            }
        }
        Ok(url)
    }

    /// Maps 429 and other non-2xx responses to typed errors.
    fn check_status(&self, response: Response) -> Result<Response, HttpProviderError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(HttpProviderError::RateLimited {
                provider: self.id.to_string(),
                retry_after_secs,
            });
        }
        if !status.is_success() {
            return Err(HttpProviderError::UnexpectedStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    /// GETs `url` with retry and parses the body as `T`.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, HttpProviderError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            let response = self.check_status(response)?;
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| HttpProviderError::Deserialize {
                context: url.to_string(),
                source: e,
            })
        })
        .await
    }

    async fn health(&self) -> Result<(), HttpProviderError> {
        let url = self.endpoint("health")?;
        let url = &url;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            self.check_status(response).map(|_| ())
        })
        .await
    }

    async fn search_term(
        &self,
        term: &str,
        request: &SearchRequest,
    ) -> Result<Vec<ItemResult>, HttpProviderError> {
        let url = self.search_url(term, request)?;
        let parsed: SearchResponse = self.get_json(&url).await?;
        Ok(parsed
            .items
            .into_iter()
            .map(|w| w.into_item(self.id.clone()))
            .collect())
    }

    async fn read_cart(&self) -> Result<CartResponse, HttpProviderError> {
        let url = self.endpoint("cart")?;
        self.get_json(&url).await
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    async fn initialize(&self) -> Readiness {
        match self.health().await {
            Ok(()) => Readiness::Ready,
            Err(e) => Readiness::Unavailable(format!("health check failed: {e}")),
        }
    }

    /// Searches every term in turn and shares the result cap across them.
    ///
    /// Matching items are taken round-robin, one per term per round, so every
    /// term that returned a match is represented before any term gets a second
    /// slot. A failing term is logged and skipped. The call fails only when
    /// every term failed.
    async fn search_items(&self, request: &SearchRequest) -> Result<Vec<ItemResult>, ProviderError> {
        let mut per_term: Vec<IntoIter<ItemResult>> = Vec::new();
        let mut failures: Vec<String> = Vec::new();

        for term in request.food_items() {
            if self.ctx.is_cancelled() {
                break;
            }
            match self.search_term(term, request).await {
                Ok(items) => {
                    let matching: Vec<ItemResult> =
                        items.into_iter().filter(|i| i.matches(request)).collect();
                    tracing::debug!(term = %term, matching = matching.len(), "term searched");
                    per_term.push(matching.into_iter());
                }
                Err(e) => {
                    tracing::warn!(term = %term, error = %e, "term search failed");
                    failures.push(format!("{term}: {e}"));
                }
            }
        }

        if !failures.is_empty() && failures.len() == request.food_items().len() {
            return Err(ProviderError::Transport(failures.join("; ")));
        }
        Ok(interleave(per_term, request.max_results_per_provider()))
    }

    async fn add_item_to_cart(
        &self,
        item: &ItemResult,
        token: &IdempotencyToken,
    ) -> Result<(), ProviderError> {
        let url = self.endpoint("cart/items")?;
        let response = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, token.to_string())
            .json(&CartItemBody::for_item(item))
            .send()
            .await
            .map_err(HttpProviderError::from)?;
        self.check_status(response)?;
        Ok(())
    }

    async fn verify_cart_contains(&self, item: &ItemResult) -> Result<bool, ProviderError> {
        let cart = self.read_cart().await?;
        Ok(cart.items.iter().any(|line| line.is_for(item)))
    }

    /// A 404 means the line is already gone, which is what a rollback wants.
    async fn remove_item_from_cart(&self, item: &ItemResult) -> Result<(), ProviderError> {
        let url = self.endpoint("cart/items")?;
        let response = self
            .client
            .delete(url)
            .json(&CartItemBody::for_item(item))
            .send()
            .await
            .map_err(HttpProviderError::from)?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(item = %item.item_name, "cart line already absent");
            return Ok(());
        }
        self.check_status(response)?;
        Ok(())
    }
}

/// Takes one item from each term in turn until `cap` items are collected or
/// every term is drained.
fn interleave(mut per_term: Vec<IntoIter<ItemResult>>, cap: usize) -> Vec<ItemResult> {
    let mut results = Vec::new();
    while results.len() < cap {
        let before = results.len();
        for term in &mut per_term {
            if results.len() >= cap {
                break;
            }
            if let Some(item) = term.next() {
                results.push(item);
            }
        }
        if results.len() == before {
            break;
        }
    }
    results
}
