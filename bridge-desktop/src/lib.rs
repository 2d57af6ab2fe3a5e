//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Only networking has a portable desktop default:
//! - `HttpClient` using `reqwest`
//!
//! The media primitive is always host-injected; desktop shells typically wrap
//! their own audio output (rodio, cpal, a webview audio element) in a
//! `MediaBackend` implementation.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http_client = Arc::new(ReqwestHttpClient::new()?);
//!     // Pass to EngineConfig::builder().http_client(http_client)
//!     Ok(())
//! }
//! ```

mod http;

pub use http::ReqwestHttpClient;
