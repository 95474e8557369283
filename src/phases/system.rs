//! Host preparation steps shared by init and join

use crate::cluster::Node;
use crate::error::{Error, Result};
use crate::resolve::NameResolver;
use crate::templates::system;
use tracing::debug;

/// Point the control-plane domain at `ip` on this node
pub fn set_host(node: &Node, resolver: &dyn NameResolver, ip: &str, domain: &str) -> Result<()> {
    debug!(host = %node.addr(), "[host] {} -> {}", domain, ip);
    resolver
        .point(node, domain, ip)
        .map_err(|e| Error::remote(node.addr(), "host", e.context("Failed to set /etc/hosts")))
}

pub fn swap_off(node: &Node) -> Result<()> {
    debug!(host = %node.addr(), "[swap] Disable swap");
    node.run("swap", &system::swap_off())
}

/// Kernel forwarding and bridge-netfilter settings kubeadm preflight expects
pub fn configure_networking(node: &Node) -> Result<()> {
    debug!(host = %node.addr(), "[iptables] Set up iptables");
    node.write_file("iptables", system::SYSCTL_CONF_PATH, system::sysctl_conf())?;
    node.run("iptables", &system::apply_sysctl())
}

pub fn restart(node: &Node, service: &str) -> Result<()> {
    debug!(host = %node.addr(), "[restart] Restart {}", service);
    node.run("restart", &system::restart(service))
}

/// Make kubectl usable for the SSH user on this node
pub fn copy_admin_config(node: &Node) -> Result<()> {
    let user = &node.host_info.user;
    debug!(host = %node.addr(), "[kubectl-config] Copy admin.conf to ~{}/.kube/config", user);
    node.run(
        "kubectl-config",
        &system::copy_admin_config(user, !node.is_root()),
    )
}
