//! Pointing the control-plane domain at an address on a node
//!
//! The whole HA bootstrap hinges on this: a node reaches "the control plane"
//! through a domain name whose local resolution we rewrite as phases progress.

use crate::cluster::Node;
use crate::templates::system;
use anyhow::Result;

pub trait NameResolver: Send + Sync {
    /// Make `domain` resolve to `address` on `node`
    fn point(&self, node: &Node, domain: &str, address: &str) -> Result<()>;

    /// Drop any local override for `domain` on `node`
    fn forget(&self, node: &Node, domain: &str) -> Result<()>;
}

/// Rewrites `/etc/hosts`
#[derive(Debug, Default, Clone, Copy)]
pub struct HostsFile;

impl NameResolver for HostsFile {
    fn point(&self, node: &Node, domain: &str, address: &str) -> Result<()> {
        node.runner()?.run(&system::set_hosts(address, domain))
    }

    fn forget(&self, node: &Node, domain: &str) -> Result<()> {
        node.runner()?.run(&system::reset_hosts(domain))
    }
}
