//! Request Client Module
//!
//! Fetches web pages, optionally through a proxy, and memoizes the responses
//! to the file cache outside production.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::agents::UserAgent;
use super::failure_log::{FailureLog, FailureRecord};
use super::proxy::ProxyResolver;
use crate::config::Config;
use crate::error::{MemoError, Result};
use crate::memo::{CachedValue, FileMemoizer, MemoizeConfig};

/// Namespace of cached responses.
pub const CACHE_NAMESPACE: &str = "webpage";

/// How the response body is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Text,
    Json,
}

// == Request Options ==
/// Per request options. All of them take part in the cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    /// Proxy list; takes precedence over `proxy_custom`
    pub proxy_file: Option<PathBuf>,
    /// Line of the proxy list to use
    pub proxy_id: usize,
    pub proxy_enabled: bool,
    /// Proxy URL used when no proxy file is set
    pub proxy_custom: Option<String>,
    /// Attempt number recorded in the failure log
    pub attempt: u32,
    pub logs_file: PathBuf,
    /// Extra request headers; `user-agent` is always overridden
    pub headers: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub cache_folder: PathBuf,
    pub cache_max_age_ms: u64,
    pub cache_disabled: bool,
    /// Delay before the request, production only
    pub wait_ms: u64,
}

impl RequestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            proxy_file: Some(config.proxy_file.clone()),
            proxy_id: 0,
            proxy_enabled: true,
            proxy_custom: None,
            attempt: 1,
            logs_file: config.logs_file.clone(),
            headers: BTreeMap::new(),
            response_type: ResponseType::Text,
            cache_folder: config.cache_folder.clone(),
            cache_max_age_ms: config.cache_max_age_ms,
            cache_disabled: config.cache_disabled,
            wait_ms: 0,
        }
    }

    fn memoize_config(&self) -> MemoizeConfig {
        MemoizeConfig::new()
            .namespace(CACHE_NAMESPACE)
            .folder(&self.cache_folder)
            .max_age_ms(self.cache_max_age_ms)
            .disabled(self.cache_disabled)
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// == Requester ==
/// Performs HTTP requests with proxy selection, failure logging and caching.
#[derive(Debug, Clone)]
pub struct Requester {
    inner: Arc<RequesterInner>,
}

#[derive(Debug)]
struct RequesterInner {
    proxies: ProxyResolver,
    memoizer: FileMemoizer,
    user_agent: UserAgent,
    production: bool,
}

impl Requester {
    pub fn new(production: bool) -> Self {
        Self {
            inner: Arc::new(RequesterInner {
                proxies: ProxyResolver::new(),
                memoizer: FileMemoizer::new(),
                user_agent: UserAgent::Chrome,
                production,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.production)
    }

    pub fn is_production(&self) -> bool {
        self.inner.production
    }

    // == Request ==
    /// Fetches `url`, going through the file cache unless in production.
    ///
    /// In production `wait_ms` is slept first and the response is never
    /// cached. Elsewhere the `(url, options)` pair is memoized under the
    /// `webpage` namespace.
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<CachedValue> {
        if self.inner.production {
            if options.wait_ms > 0 {
                tokio::time::sleep(Duration::from_millis(options.wait_ms)).await;
            }
            let body = self.fetch(url, &options).await?;
            return CachedValue::from_output(&body);
        }

        let requester = self.clone();
        let memoized = self.inner.memoizer.wrap(
            move |(url, options): (String, RequestOptions)| {
                let requester = requester.clone();
                async move {
                    requester
                        .fetch(&url, &options)
                        .await
                        .map_err(anyhow::Error::from)
                }
            },
            options.memoize_config(),
        )?;

        memoized
            .call((url.to_string(), options))
            .await
            .map_err(MemoError::into_original)
    }

    // == Fetch ==
    /// Performs the request without caching.
    ///
    /// Failures after the proxy has been chosen are logged and appended to
    /// the failure log before being returned.
    pub async fn fetch(&self, url: &str, options: &RequestOptions) -> Result<Value> {
        let client = self.client_for(options).await?;

        match self.send(&client, url, options).await {
            Ok(body) => Ok(body),
            Err(e) => {
                error!(url, attempt = options.attempt, error = %e, "Request failed");
                // TODO: retry through the next proxy line (attempt + 1), up to three attempts
                let record = FailureRecord::new(url, options.attempt, &e);
                if let Err(log_err) = FailureLog::new(&options.logs_file).append(&record).await {
                    warn!(error = %log_err, "Could not record failed request");
                }
                Err(e)
            }
        }
    }

    async fn client_for(&self, options: &RequestOptions) -> Result<reqwest::Client> {
        let builder = reqwest::Client::builder();

        let builder = if options.proxy_enabled {
            let proxy = self
                .inner
                .proxies
                .resolve(
                    options.proxy_file.as_deref(),
                    options.proxy_id,
                    options.proxy_custom.as_deref(),
                )
                .await?;
            builder.proxy(reqwest::Proxy::all(proxy.as_str())?)
        } else {
            builder.no_proxy()
        };

        Ok(builder.build()?)
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Value> {
        let headers = self.headers(&options.headers)?;
        debug!(url, "Sending request");

        let response = client.get(url).headers(headers).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MemoError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match options.response_type {
            ResponseType::Text => Ok(Value::String(response.text().await?)),
            ResponseType::Json => Ok(response.json::<Value>().await?),
        }
    }

    fn headers(&self, extra: &BTreeMap<String, String>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| MemoError::InvalidHeader(format!("name {name:?}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| MemoError::InvalidHeader(format!("value for {name}")))?;
            headers.insert(name, value);
        }
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(self.inner.user_agent.as_str()),
        );
        Ok(headers)
    }
}

impl Default for Requester {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::derive_key;

    #[test]
    fn test_default_options() {
        let options = RequestOptions::default();
        assert_eq!(options.proxy_file, Some(PathBuf::from("./storage/proxy.txt")));
        assert!(options.proxy_enabled);
        assert_eq!(options.attempt, 1);
        assert_eq!(options.response_type, ResponseType::Text);
        assert_eq!(options.cache_max_age_ms, 12 * 60 * 60 * 1000);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: RequestOptions =
            serde_json::from_str(r#"{"proxyEnabled": false, "type": "json", "proxyId": 2}"#)
                .unwrap();
        assert!(!options.proxy_enabled);
        assert_eq!(options.response_type, ResponseType::Json);
        assert_eq!(options.proxy_id, 2);
        assert_eq!(options.logs_file, PathBuf::from("./storage/request-errors.json"));
    }

    #[test]
    fn test_memoize_config_from_options() {
        let options = RequestOptions {
            cache_disabled: true,
            ..RequestOptions::default()
        };
        let config = options.memoize_config();
        assert_eq!(config.namespace.as_deref(), Some(CACHE_NAMESPACE));
        assert_eq!(config.supplied_fields(), 4);
        assert!(config.is_disabled());
    }

    #[test]
    fn test_cache_options_fragment_keys() {
        // Cache knobs are part of the memoized arguments, so changing them
        // changes the entry.
        let url = "http://example.com".to_string();
        let short = RequestOptions {
            cache_max_age_ms: 1_000,
            ..RequestOptions::default()
        };
        let long = RequestOptions::default();

        assert_ne!(
            derive_key(&(url.clone(), short)).unwrap(),
            derive_key(&(url, long)).unwrap()
        );
    }

    #[test]
    fn test_user_agent_overrides_custom_header() {
        let requester = Requester::default();
        let mut extra = BTreeMap::new();
        extra.insert("User-Agent".to_string(), "curl/8".to_string());
        extra.insert("accept".to_string(), "text/html".to_string());

        let headers = requester.headers(&extra).unwrap();
        assert_eq!(headers.get(USER_AGENT).unwrap(), UserAgent::Chrome.as_str());
        assert_eq!(headers.get("accept").unwrap(), "text/html");
        assert_eq!(headers.get_all(USER_AGENT).iter().count(), 1);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let requester = Requester::default();
        let mut extra = BTreeMap::new();
        extra.insert("bad header".to_string(), "x".to_string());

        assert!(matches!(
            requester.headers(&extra),
            Err(MemoError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_proxy_fails_before_sending() {
        let requester = Requester::default();
        let options = RequestOptions {
            proxy_file: None,
            proxy_custom: None,
            ..RequestOptions::default()
        };

        let result = requester.fetch("http://127.0.0.1:9/", &options).await;
        assert!(matches!(result, Err(MemoError::MissingProxy)));
    }
}
