//! Cluster bootstrap sequence
//!
//! init master-0 -> network plugin -> {other masters, workers} -> readiness.
//! The two join branches run concurrently and are both awaited before the
//! result is decided. Nothing is rolled back on failure.

use crate::cluster::{Cluster, Token};
use crate::error::Result;
use crate::fanout::Fanout;
use crate::phases::{images, init, join, network, ready, token};
use crate::utils::banner;
use std::sync::Arc;
use tracing::info;

/// Build a cluster from scratch on nodes that already have a command channel
pub async fn bootstrap(cluster: &Arc<Cluster>) -> Result<()> {
    let master0 = Arc::clone(cluster.nodes.first_master()?);
    let fanout = Fanout::new(cluster.settings.parallelism);

    images::load_offline_images(cluster, &fanout).await?;

    banner(&format!("Initializing master0 ({})", master0.addr()));
    let c = Arc::clone(cluster);
    let output = fanout
        .on_first_master(&cluster.nodes, move |node| init::init_master(node, &c))
        .await?;
    let token = token::from_init_output(&output)?;
    println!("✓ master0 initialized");
    println!();

    banner("Installing network plugin");
    let c = Arc::clone(cluster);
    fanout
        .on_first_master(&cluster.nodes, move |node| network::deploy_network(node, &c))
        .await?;
    println!("✓ Network plugin handled");
    println!();

    let (masters, workers) = tokio::join!(
        join_other_masters(cluster, &token, &fanout),
        join_workers(cluster, &token, &fanout)
    );
    masters?;
    workers?;

    banner("Waiting for nodes to be Ready");
    let c = Arc::clone(cluster);
    let listing = fanout
        .on_first_master(&cluster.nodes, move |node| ready::check_ready(node, &c))
        .await?;
    println!("✓ All {} nodes are Ready", cluster.nodes.names().len());
    println!();
    println!("{}", listing.trim_end());
    info!("cluster bootstrap complete");
    Ok(())
}

/// Join every master after master-0 as a control-plane node, drawing from
/// `fanout`'s permit pool
pub async fn join_other_masters(
    cluster: &Arc<Cluster>,
    token: &Token,
    fanout: &Fanout,
) -> Result<()> {
    if cluster.nodes.other_masters().is_empty() {
        return Ok(());
    }
    banner("Joining other masters");
    let c = Arc::clone(cluster);
    let token = token.clone();
    fanout
        .on_other_masters(&cluster.nodes, move |node| {
            join::join_master(node, &c, &token)?;
            println!("✓ [{}] joined as master", node.addr());
            Ok(())
        })
        .await
}

/// Join every worker, drawing from `fanout`'s permit pool
pub async fn join_workers(cluster: &Arc<Cluster>, token: &Token, fanout: &Fanout) -> Result<()> {
    if cluster.nodes.workers.is_empty() {
        return Ok(());
    }
    banner("Joining workers");
    let c = Arc::clone(cluster);
    let token = token.clone();
    fanout
        .on_workers(&cluster.nodes, move |node| {
            join::join_worker(node, &c, &token)?;
            println!("✓ [{}] joined as worker", node.addr());
            Ok(())
        })
        .await
}
