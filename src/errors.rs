/*!
 * Error types for the pagereader application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when fetching a page through the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Error when the HTTP request itself fails (network, DNS, timeout)
    #[error("Cannot open URL: {0}")]
    RequestFailed(String),

    /// Error when the server answered with a non-success status
    #[error("URL {url} responded with status {status_code}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// The requested URL
        url: String,
    },

    /// Error when the requested URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Error when reading the response body
    #[error("Failed to read response body: {0}")]
    BodyError(String),
}

/// Errors that can occur while driving the reader
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Error from the fetch-and-rewrite proxy
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// The reader event loop is no longer running
    #[error("Reader is shut down")]
    Closed,
}
