//! opscan - client for the OpScan smart-contract security analysis API.
//!
//! Submits bytecode or source payloads for analysis, authenticates with
//! email, Ethereum address, API key, or the trial account, and polls for
//! results under a bounded quadratic backoff schedule.
//!
//! ```no_run
//! use opscan::{AnalysisRequest, Client, ClientConfig, Credentials};
//!
//! # async fn run() -> opscan::Result<()> {
//! let config = ClientConfig::with_defaults(Credentials::Trial)?;
//! let client = Client::new(config)?;
//! let request = AnalysisRequest::from_bytecode("0x60606040...")?;
//! let issues = client.analyze(&request).await?;
//! println!("{issues}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod client;
pub mod core;
pub mod error;
pub mod util;

pub use crate::client::{Client, ClientConfig, DEFAULT_API_URL};
pub use crate::core::auth::{Credentials, TokenPair};
pub use crate::core::models::{AnalysisRequest, AnalysisStatus, ListFilter, SubmitReceipt};
pub use crate::core::poller::{MAX_POLLS, PollOptions};
pub use crate::error::{Error, ExitCode, Result};
