//! Error types for cluster bootstrap

use std::time::Duration;

use thiserror::Error;

/// Main error type for bootstrap operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A remote command failed or the transport broke
    #[error("[{host}] [{phase}] {message}")]
    Remote {
        host: String,
        phase: &'static str,
        message: String,
    },

    /// A polling loop ran out of budget
    #[error("[{host}] [{phase}] timed out after {budget:?} waiting for {what}")]
    Timeout {
        host: String,
        phase: &'static str,
        what: String,
        budget: Duration,
    },

    /// The cluster has no master nodes
    #[error("no master nodes configured")]
    NoMasters,

    /// `kubeadm init` output did not contain usable join credentials
    #[error("malformed kubeadm init output: {0}")]
    MalformedInitOutput(String),

    /// A task tried to run a command on a node without a command channel
    #[error("[{host}] no remote command channel attached")]
    NotConnected { host: String },

    /// Configuration file or validation error
    #[error("configuration error: {0}")]
    Config(String),

    /// A fan-out task panicked or was cancelled by the runtime
    #[error("task failed to complete: {0}")]
    Task(String),
}

impl Error {
    /// Wrap a collaborator error with the node address and phase it came from
    pub fn remote(host: impl Into<String>, phase: &'static str, err: anyhow::Error) -> Self {
        Self::Remote {
            host: host.into(),
            phase,
            message: format!("{:#}", err),
        }
    }

    /// Create a timeout error for a polling loop
    pub fn timeout(
        host: impl Into<String>,
        phase: &'static str,
        what: impl Into<String>,
        budget: Duration,
    ) -> Self {
        Self::Timeout {
            host: host.into(),
            phase,
            what: what.into(),
            budget,
        }
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a malformed-init-output error with the given message
    pub fn malformed_init_output(msg: impl Into<String>) -> Self {
        Self::MalformedInitOutput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
