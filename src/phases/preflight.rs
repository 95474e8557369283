//! Preflight: command channels and host facts gathered before bootstrap

use crate::cluster::{Cluster, Node, PackageManager};
use crate::error::{Error, Result};
use crate::fanout::Fanout;
use crate::templates::system;
use crate::utils::ssh::SshConnection;
use std::sync::Arc;
use tracing::debug;

/// Attach an SSH command channel to every node that has none yet
pub fn connect(cluster: &Cluster) {
    for node in cluster.nodes.all() {
        if node.is_connected() {
            continue;
        }
        let info = &node.host_info;
        let conn = SshConnection::new(
            &info.host,
            info.port,
            &info.user,
            info.password.clone(),
            info.key.clone(),
        );
        node.attach_runner(Arc::new(conn));
        debug!(host = %node.addr(), "[preflight] SSH channel ready as {}", info.user);
    }
}

fn detect_package_manager(node: &Node) -> Result<()> {
    let out = node.run_out("preflight", system::detect_package_manager())?;
    let kind = match out.trim() {
        "apt" => PackageManager::Apt,
        "yum" => PackageManager::Yum,
        other => {
            return Err(Error::Remote {
                host: node.addr().to_string(),
                phase: "preflight",
                message: format!("no supported package manager found (got '{}')", other),
            });
        }
    };
    node.set_package_manager(kind);
    debug!(host = %node.addr(), "[preflight] Package manager is {}", kind);
    Ok(())
}

/// Record each node's package manager
pub async fn detect_package_managers(cluster: &Cluster, fanout: &Fanout) -> Result<()> {
    fanout.on_all(&cluster.nodes, detect_package_manager).await
}
