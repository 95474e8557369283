//! Local software load balancer on a joining node
//!
//! Before kubeadm has configured kubelet on this node, kubelet is restarted
//! in a standalone mode that only runs static pods, so an nginx proxy pod can
//! come up on loopback and forward to every master. Once the proxy answers,
//! the override is removed and kubelet returns to its packaged configuration
//! ready for `kubeadm join`. The nginx pod is left in place and keeps
//! running as a regular static pod afterwards.

use crate::cluster::{Cluster, LocalSlb, Node};
use crate::config::constants::{
    DEFAULT_CGROUP_DRIVER, KUBELET_OVERRIDE_PATH, NGINX_CONF_PATH, NGINX_MANIFEST_PATH,
};
use crate::error::{Error, Result};
use crate::phases::system;
use crate::templates::slb;
use crate::utils::wait::poll_immediate;
use tracing::{debug, info};

const PHASE: &str = "slb";

/// Bring up the per-node nginx proxy and hand kubelet back to kubeadm.
///
/// Expects the control-plane domain to already resolve to loopback on `node`.
pub fn setup_local_slb(node: &Node, cluster: &Cluster, slb_cfg: &LocalSlb) -> Result<()> {
    let nginx = &slb_cfg.nginx;
    info!(host = %node.addr(), "[slb] Setting up local nginx proxy");

    let conf = slb::nginx_conf(
        &cluster.nodes.master_hosts(),
        nginx.port,
        cluster.kubeadm.bind_port,
    );
    node.write_file(PHASE, NGINX_CONF_PATH, &conf)?;
    node.write_file(
        PHASE,
        NGINX_MANIFEST_PATH,
        &slb::nginx_manifest(&nginx.image.reference()),
    )?;

    let driver = cgroup_driver(node)?;
    debug!(host = %node.addr(), "[slb] Using cgroup driver {}", driver);
    node.write_file(
        PHASE,
        KUBELET_OVERRIDE_PATH,
        &slb::kubelet_override(&cluster.kubeadm.pause_image(), &driver),
    )?;
    system::restart(node, "kubelet")?;

    wait_healthy(node, cluster)?;

    node.remove_file(PHASE, KUBELET_OVERRIDE_PATH)?;
    system::restart(node, "kubelet")?;
    info!(host = %node.addr(), "[slb] Local nginx proxy is healthy");
    Ok(())
}

/// Container runtime's cgroup driver, falling back to the default when the
/// runtime does not say
fn cgroup_driver(node: &Node) -> Result<String> {
    let out = node.run_out(PHASE, slb::docker_cgroup_driver())?;
    let driver = out.trim();
    if driver.is_empty() {
        Ok(DEFAULT_CGROUP_DRIVER.to_string())
    } else {
        Ok(driver.to_string())
    }
}

/// Poll the API health endpoint through the proxy until it answers `ok`.
///
/// Transport errors count as "not yet" and the poll carries on.
fn wait_healthy(node: &Node, cluster: &Cluster) -> Result<()> {
    let poll = cluster.settings.slb_poll;
    let probe = slb::healthz(&cluster.kubeadm.control_plane_endpoint);

    let healthy = poll_immediate(&poll, || match node.run_out(PHASE, &probe) {
        Ok(body) => body.trim() == "ok",
        Err(e) => {
            debug!(host = %node.addr(), "[slb] healthz not ready: {}", e);
            false
        }
    });

    if healthy {
        Ok(())
    } else {
        Err(Error::timeout(
            node.addr(),
            PHASE,
            format!(
                "https://{}/healthz to return ok",
                cluster.kubeadm.control_plane_endpoint
            ),
            poll.timeout,
        ))
    }
}
