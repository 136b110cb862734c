//! SSRF-safe HTTP fetching.
//!
//! All network I/O goes through [`GuardedFetcher`], which sits on top of an
//! [`HttpTransport`] (reqwest in production, a stub in tests) and validates
//! every hop against a [`crate::policy::HostAllowList`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use postgrab_core::{FetchOptions, GuardedFetcher, HostSet, ReqwestTransport};
//!
//! # async fn example() -> Result<(), postgrab_core::FetchError> {
//! let transport = Arc::new(ReqwestTransport::new(1024 * 1024)?);
//! let fetcher = GuardedFetcher::new(transport);
//! let hosts = HostSet::new(["www.linkedin.com"]);
//! let page = fetcher
//!     .fetch(
//!         "https://www.linkedin.com/posts/example",
//!         &hosts,
//!         &FetchOptions::new(Duration::from_secs(12)),
//!     )
//!     .await?;
//! println!("status {}", page.status);
//! # Ok(())
//! # }
//! ```

mod error;
mod guarded;
mod retry;
mod transport;

pub use error::FetchError;
pub use guarded::{FetchOptions, GuardedFetcher};
pub use retry::{DEFAULT_MAX_RETRIES, RetryDecision, RetryPolicy};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
