//! Kubestrap - bootstrap Kubernetes clusters over SSH with kubeadm
//!
//! Master-0 is initialized first, the pod network is installed from it, the
//! remaining masters and the workers join concurrently, and finally master-0
//! waits for every node to report Ready. With several masters each joining
//! worker can run its own nginx proxy in front of all API servers, so no
//! external load balancer is needed.
//!
//! # Modules
//!
//! - [`cluster`] - Nodes, kubeadm settings, HA and network plugin choices
//! - [`config`] - The TOML cluster file and defaults
//! - [`fanout`] - Bounded concurrent execution of per-node tasks
//! - [`phases`] - Procedures run on individual nodes
//! - [`bootstrap`] - The init, network, join and readiness sequence
//! - [`resolve`] - Control-plane name resolution on nodes
//! - [`templates`] - Shell commands and files rendered for nodes

pub mod bootstrap;
pub mod cluster;
pub mod config;
pub mod error;
pub mod fanout;
pub mod phases;
pub mod resolve;
pub mod templates;
pub mod utils;

#[cfg(test)]
mod testing;

pub use bootstrap::{bootstrap, join_other_masters, join_workers};
pub use error::{Error, Result};
