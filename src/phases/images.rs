//! Loading container images shipped with offline packages

use crate::cluster::{Cluster, InstallMode, Node};
use crate::config::constants::OFFLINE_IMAGES_DIR;
use crate::error::{Error, Result};
use crate::fanout::Fanout;
use tracing::debug;

const PHASE: &str = "images";

fn load(node: &Node, script: &str) -> Result<()> {
    if node.install_mode != InstallMode::Offline {
        return Ok(());
    }
    if !node.is_sent() {
        return Err(Error::config(format!(
            "{} is offline but its packages were never transferred",
            node.addr()
        )));
    }

    let path = format!("{}/{}", OFFLINE_IMAGES_DIR, script);
    if !node.file_exists(PHASE, &path)? {
        return Err(Error::Remote {
            host: node.addr().to_string(),
            phase: PHASE,
            message: format!("{} not found, offline packages are incomplete", path),
        });
    }
    debug!(host = %node.addr(), "[images] Loading {}", path);
    node.run(PHASE, &format!("sh {}", path))
}

/// Load control-plane images on offline masters, then node images on every
/// offline node. Online nodes pull their own.
pub async fn load_offline_images(cluster: &Cluster, fanout: &Fanout) -> Result<()> {
    fanout
        .on_masters(&cluster.nodes, |node| load(node, "master.sh"))
        .await?;
    fanout
        .on_all(&cluster.nodes, |node| load(node, "node.sh"))
        .await
}
