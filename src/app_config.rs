use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the reader configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// CSS declaration applied to the highlighted sentence
    #[serde(default = "default_highlight")]
    pub highlight: String,

    /// Time to wait (in ms) before moving to the next sentence.
    /// 0 means wait for an explicit next command.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// If set, a notification with this name (payload: sentence text)
    /// is emitted for each activated sentence
    #[serde(default)]
    pub notification: Option<String>,

    /// Reading window geometry, passed through to the presentation shell
    #[serde(default)]
    pub geometry: Geometry,

    /// HTML processing config
    #[serde(default)]
    pub html: HtmlConfig,

    /// Proxy config
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Geometry of the reading window (px or %), owned by the presentation shell
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Geometry {
    /// Width of the reading window
    #[serde(default = "default_full")]
    pub width: String,

    /// Height of the reading window
    #[serde(default = "default_full")]
    pub height: String,

    /// X position of the reading window
    #[serde(default = "default_zero")]
    pub left: String,

    /// Y position of the reading window
    #[serde(default = "default_zero")]
    pub top: String,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: default_full(),
            height: default_full(),
            left: default_zero(),
            top: default_zero(),
        }
    }
}

/// Configuration for HTML segmentation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HtmlConfig {
    /// List of tag names to parse sentences from
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            tags: default_tags(),
        }
    }
}

/// Configuration for the fetch-and-rewrite proxy
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Request timeout in seconds
    #[serde(default = "default_proxy_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether root-relative resource URLs are rewritten to absolute ones
    #[serde(default = "default_true")]
    pub rewrite_urls: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_proxy_timeout_secs(),
            rewrite_urls: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_highlight() -> String {
    "background-color:red;".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_tags() -> Vec<String> {
    ["p", "h1", "h2", "h3", "h4", "li"]
        .iter()
        .map(|t| (*t).to_string())
        .collect()
}

fn default_full() -> String {
    "100%".to_string()
}

fn default_zero() -> String {
    "0".to_string()
}

fn default_proxy_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.html.tags.is_empty() {
            return Err(anyhow!("At least one tag name must be configured"));
        }

        if self.html.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(anyhow!("Tag names must not be empty"));
        }

        if let Some(notification) = &self.notification {
            if notification.trim().is_empty() {
                return Err(anyhow!("Notification name must not be empty when set"));
            }
        }

        if self.proxy.timeout_secs == 0 {
            return Err(anyhow!("Proxy timeout must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            highlight: default_highlight(),
            timeout_ms: default_timeout_ms(),
            notification: None,
            geometry: Geometry::default(),
            html: HtmlConfig::default(),
            proxy: ProxyConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
