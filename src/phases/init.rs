//! Bootstrap master initialization

use crate::cluster::{Cluster, Node};
use crate::config::constants::LOOPBACK_ADDRESS;
use crate::error::Result;
use crate::phases::system;
use crate::templates::kubeadm;
use tracing::{debug, info};

/// Run `kubeadm init` on master-0 and return its combined output.
///
/// The control-plane domain is pointed at loopback first, since the API
/// server being created is local.
pub fn init_master(node: &Node, cluster: &Cluster) -> Result<String> {
    let domain = cluster.kubeadm.api_domain()?;

    system::set_host(node, cluster.resolver.as_ref(), LOOPBACK_ADDRESS, domain)?;
    system::swap_off(node)?;
    system::configure_networking(node)?;

    info!(host = %node.addr(), "[kubeadm-init] Initializing master0");
    let output = node.run_out("kubeadm-init", &kubeadm::init(&node.name, &cluster.kubeadm))?;
    debug!(host = %node.addr(), "[kubeadm-init] {}", output);

    system::copy_admin_config(node)?;
    Ok(output)
}
