// Command module routing
//
// One file per subcommand; add the match arm in `handle_command`.

pub mod init;
pub mod join;
pub mod reset;
pub mod token;

use crate::Commands::{self, *};
use anyhow::{Context, Result};
use kubestrap::cluster::Cluster;
use kubestrap::config::ClusterFile;
use std::path::Path;

/// Dispatch command to appropriate handler
pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Init {
            config,
            packages_present,
        } => init::handle_init(&config, packages_present)?,
        Join { target } => join::handle_join(target)?,
        Reset {
            config,
            remove_kube_components,
        } => reset::handle_reset(&config, remove_kube_components)?,
        Token { file } => token::handle_token(&file)?,
    }
    Ok(())
}

/// Load and validate the cluster file
pub(crate) fn load_cluster(path: &Path) -> Result<Cluster> {
    let file = ClusterFile::load(path)?;
    let cluster = file
        .into_cluster()
        .with_context(|| format!("Invalid cluster file: {}", path.display()))?;

    println!("Cluster file: {}", path.display());
    println!("  masters: {}", cluster.nodes.masters.len());
    println!("  workers: {}", cluster.nodes.workers.len());
    println!("  endpoint: {}", cluster.kubeadm.control_plane_endpoint);
    println!();
    Ok(cluster)
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}
