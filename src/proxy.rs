use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Client;
use url::Url;

use crate::app_config::ProxyConfig;
use crate::errors::ProxyError;

// @module: Fetch-and-rewrite proxy for remote pages

/// Stable local path the transport collaborator serves the fetched body from
pub const PROXIED_PATH: &str = "/proxied_url";

// @const: Root-relative href/src attribute regex
static ROOT_RELATIVE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*(?:"(/[^"]*)"|'(/[^']*)')"#).unwrap()
});

/// A fetched page, rewritten and ready to be mounted
#[derive(Debug, Clone)]
pub struct ProxiedPage {
    /// The URL the caller asked for
    pub original_url: String,

    /// Local address the body is served from
    pub proxied_url: String,

    /// Page body, with resource URLs rewritten when configured
    pub html: String,
}

/// Request/response contract of the fetch-and-rewrite collaborator.
///
/// Transport is owned by the implementation; the core only consumes the
/// result. Cancellation of an in-flight fetch is not supported — the reader
/// discards late results for superseded loads instead.
#[async_trait]
pub trait Proxy: Send + Sync {
    /// Retrieve the document at `url` and expose it locally.
    async fn request(&self, url: &str) -> Result<ProxiedPage, ProxyError>;
}

/// HTTP implementation fetching over reqwest
pub struct HttpProxy {
    client: Client,
    rewrite_urls: bool,
}

impl HttpProxy {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProxyError::RequestFailed(e.to_string()))?;

        Ok(HttpProxy {
            client,
            rewrite_urls: config.rewrite_urls,
        })
    }
}

#[async_trait]
impl Proxy for HttpProxy {
    async fn request(&self, url: &str) -> Result<ProxiedPage, ProxyError> {
        let parsed = Url::parse(url).map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", url, e)))?;

        debug!("Fetching {}", url);
        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| ProxyError::RequestFailed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Status {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProxyError::BodyError(e.to_string()))?;

        let html = if self.rewrite_urls {
            rewrite_root_relative_urls(&body, &parsed)
        } else {
            body
        };

        Ok(ProxiedPage {
            original_url: url.to_string(),
            proxied_url: PROXIED_PATH.to_string(),
            html,
        })
    }
}

/// Rewrite root-relative `href`/`src` attribute values to absolute URLs
/// against `base`, so resources keep resolving once the page is served from
/// the local proxy address. Attribute values that fail to join are left
/// untouched.
pub fn rewrite_root_relative_urls(html: &str, base: &Url) -> String {
    ROOT_RELATIVE_URL
        .replace_all(html, |caps: &Captures| {
            let attribute = &caps[1];
            let (quote, path) = match (caps.get(2), caps.get(3)) {
                (Some(path), _) => ('"', path.as_str()),
                (_, Some(path)) => ('\'', path.as_str()),
                _ => return caps[0].to_string(),
            };
            match base.join(path) {
                Ok(absolute) => format!("{}={}{}{}", attribute, quote, absolute, quote),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}
