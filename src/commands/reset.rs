//! Tear the cluster down

use crate::commands::{load_cluster, runtime};
use anyhow::{Context, Result};
use kubestrap::fanout::Fanout;
use kubestrap::phases::{preflight, reset};
use kubestrap::utils::banner;

pub fn handle_reset(config: &std::path::Path, remove_kube_components: bool) -> Result<()> {
    let cluster = load_cluster(config)?;
    let fanout = Fanout::new(cluster.settings.parallelism);

    preflight::connect(&cluster);
    let rt = runtime()?;
    if remove_kube_components {
        rt.block_on(preflight::detect_package_managers(&cluster, &fanout))
            .context("Preflight failed")?;
    }

    banner("Resetting cluster nodes");
    rt.block_on(reset::reset(&cluster, &fanout, remove_kube_components))
        .context("Reset failed")?;
    println!("✓ {} nodes reset", cluster.nodes.all().len());
    Ok(())
}
