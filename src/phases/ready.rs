//! Waiting for every node to register and report Ready

use crate::cluster::{Cluster, NetworkPlugin, Node};
use crate::error::{Error, Result};
use crate::templates::kubeadm;
use crate::utils::wait::poll_immediate;
use std::collections::HashMap;
use tracing::debug;

const PHASE: &str = "check-ready";

/// Node name to status column from `kubectl get nodes` output
fn parse_nodes(output: &str) -> HashMap<&str, &str> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            Some((cols.next()?, cols.next()?))
        })
        .filter(|(name, _)| *name != "NAME")
        .collect()
}

/// `Ready` or e.g. `Ready,SchedulingDisabled`, but not `NotReady`
fn is_ready(status: &str) -> bool {
    status.split(',').any(|s| s == "Ready")
}

/// Whether every expected node is listed, and Ready unless `presence_only`
pub fn all_ready(output: &str, expected: &[String], presence_only: bool) -> bool {
    let nodes = parse_nodes(output);
    expected.iter().all(|name| match nodes.get(name.as_str()) {
        Some(status) => presence_only || is_ready(status),
        None => false,
    })
}

/// Poll the node list on master-0 until every cluster node is Ready, and
/// return the listing that satisfied it.
///
/// Without a network plugin nodes never leave NotReady, so only their
/// registration is awaited.
pub fn check_ready(node: &Node, cluster: &Cluster) -> Result<String> {
    let expected = cluster.nodes.names();
    let presence_only = cluster.network == NetworkPlugin::None;
    let poll = cluster.settings.ready_poll;
    let mut listing = String::new();

    let ready = poll_immediate(&poll, || match node.run_out(PHASE, kubeadm::get_nodes()) {
        Ok(out) => {
            debug!(host = %node.addr(), "[check-ready]\n{}", out);
            let done = all_ready(&out, &expected, presence_only);
            listing = out;
            done
        }
        Err(e) => {
            debug!(host = %node.addr(), "[check-ready] kubectl failed: {}", e);
            false
        }
    });

    if ready {
        Ok(listing)
    } else {
        Err(Error::timeout(
            node.addr(),
            PHASE,
            format!("nodes {} to be Ready", expected.join(", ")),
            poll.timeout,
        ))
    }
}
