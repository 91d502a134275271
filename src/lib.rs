//! # etcd2-client
//!
//! Async client for the etcd v2 HTTP key/value API.
//!
//! - Reads, writes, compare-and-swap updates, deletes and in-order queue
//!   appends through [`EtcdClient`]
//! - Transparent leader tracking: `307` redirects move the client to the new
//!   leader without surfacing an error
//! - [`EtcdClient::watch`]: snapshot plus an ordered stream of changes that
//!   survives transient failures, leader changes and long-poll timeouts
//!
//! Configuration comes from [`ClientConfig`] (defaults, `CONFIG_PATH` file,
//! `ETCD_CLIENT__*` environment variables) or from [`ClientBuilder`] setters.

mod client;
mod config;
mod errors;
mod network;
mod node;
pub(crate) mod utils;

pub use client::*;
pub use config::*;
pub use errors::*;
pub use network::*;
pub use node::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
mod errors_test;
#[cfg(test)]
pub(crate) mod test_utils;
