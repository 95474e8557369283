//! Build a cluster from the cluster file

use crate::commands::{load_cluster, runtime};
use anyhow::{Context, Result};
use kubestrap::fanout::Fanout;
use kubestrap::phases::preflight;
use kubestrap::utils::banner;
use std::path::Path;
use std::sync::Arc;

pub fn handle_init(config: &Path, packages_present: bool) -> Result<()> {
    let cluster = Arc::new(load_cluster(config)?);

    if packages_present {
        for node in cluster.nodes.all() {
            node.mark_sent();
        }
    }

    banner("Preflight");
    preflight::connect(&cluster);
    let rt = runtime()?;
    rt.block_on(preflight::detect_package_managers(
        &cluster,
        &Fanout::new(cluster.settings.parallelism),
    ))
    .context("Preflight failed")?;
    println!("✓ All {} nodes reachable", cluster.nodes.all().len());
    println!();

    rt.block_on(kubestrap::bootstrap(&cluster))
        .context("Cluster bootstrap failed")?;

    println!();
    println!("✓ Cluster is up. kubectl is configured on {}", cluster.nodes.first_master()?.addr());
    Ok(())
}
