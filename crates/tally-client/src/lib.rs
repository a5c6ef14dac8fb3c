//! # tally-client
//!
//! Async client for the Tally finance backend.
//!
//! ```no_run
//! use std::sync::{Arc, RwLock};
//! use tally_client::{ClientConfig, TallyClient};
//! use tally_engine::{AppState, LoginForm};
//!
//! # async fn run() -> Result<(), tally_client::ClientError> {
//! let state = Arc::new(RwLock::new(AppState::new()));
//! let client = TallyClient::new(ClientConfig::from_env()?, state)?;
//! client
//!     .login(&LoginForm { email: "me@example.com".into(), password: "secret".into() })
//!     .await?;
//! let budgets = client.list_budgets().await?;
//! # let _ = budgets;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Typed endpoint wrappers
//! - [`transport`] — HTTP sending with the retry-once-after-refresh interceptor
//! - [`config`] — Environment-driven configuration
//! - [`cache`] — Session token cache on disk
//! - [`error`] — Error types

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod transport;

pub use api::TallyClient;
pub use cache::SessionCache;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use transport::{ApiRequest, SharedState, Transport, REFRESH_PATH};
