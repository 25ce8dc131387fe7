//! Errors surfaced by the gatekeeper's own lifecycle.
//!
//! Request handling never fails with these; rejections are reported through
//! [`DispatchOutcome`](crate::DispatchOutcome).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatekeeperError>;

#[derive(Debug, Error)]
pub enum GatekeeperError {
    #[error("gatekeeper requires oracles to be configured before building")]
    MissingOracles,

    #[error("cache sweeper join failed")]
    SweeperJoin(#[source] tokio::task::JoinError),
}
