//! Background tasks owned by the gatekeeper.

mod sweeper;

pub use sweeper::CacheSweeper;
