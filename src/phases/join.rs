//! Per-node join procedures for workers and additional masters

use crate::cluster::{Cluster, HaMode, Node, Token};
use crate::config::constants::LOOPBACK_ADDRESS;
use crate::error::Result;
use crate::phases::{slb, system};
use crate::templates::kubeadm;
use tracing::{info, warn};

/// Make the control-plane domain reachable from `node` according to the HA
/// mode, before it attempts a join
pub fn ha_dispatch(node: &Node, cluster: &Cluster) -> Result<()> {
    let domain = cluster.kubeadm.api_domain()?;
    let master0 = cluster.nodes.first_master()?;

    match cluster.effective_ha() {
        HaMode::None => {
            system::set_host(node, cluster.resolver.as_ref(), master0.addr(), domain)
        }
        HaMode::LocalSlb(slb_cfg) => {
            system::set_host(node, cluster.resolver.as_ref(), LOOPBACK_ADDRESS, domain)?;
            slb::setup_local_slb(node, cluster, &slb_cfg)
        }
        HaMode::ExternalSlb => {
            warn!(host = %node.addr(), "[ha] external load balancer is not supported yet, leaving name resolution untouched");
            Ok(())
        }
    }
}

pub fn join_worker(node: &Node, cluster: &Cluster, token: &Token) -> Result<()> {
    system::swap_off(node)?;
    system::configure_networking(node)?;
    ha_dispatch(node, cluster)?;

    info!(host = %node.addr(), "[kubeadm-join] Joining worker {}", node.name);
    node.run(
        "kubeadm-join",
        &kubeadm::join_worker(&node.name, &cluster.kubeadm, token),
    )
}

/// Join an additional control-plane node.
///
/// It talks to master-0 during the join and to its own API server after.
pub fn join_master(node: &Node, cluster: &Cluster, token: &Token) -> Result<()> {
    let domain = cluster.kubeadm.api_domain()?;
    let master0 = cluster.nodes.first_master()?;

    system::set_host(node, cluster.resolver.as_ref(), master0.addr(), domain)?;
    system::swap_off(node)?;
    system::configure_networking(node)?;

    info!(host = %node.addr(), "[kubeadm-join] Joining master {}", node.name);
    node.run(
        "kubeadm-join",
        &kubeadm::join_control_plane(&node.name, &cluster.kubeadm, token),
    )?;

    system::copy_admin_config(node)?;
    system::set_host(node, cluster.resolver.as_ref(), LOOPBACK_ADDRESS, domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterNodes, KubeadmConfig, LocalSlb};
    use crate::phases::token::fixtures;
    use crate::testing::{Journal, connected_node};
    use std::sync::Arc;

    fn token() -> Token {
        Token {
            token: fixtures::TOKEN.to_string(),
            ca_cert_hash: fixtures::HASH.to_string(),
            certificate_key: fixtures::CERT_KEY.to_string(),
        }
    }

    fn cluster(journal: &Arc<Journal>, masters: &[&str], workers: &[&str], ha: HaMode) -> Cluster {
        let connect = |h: &&str| connected_node(h, journal).0;
        Cluster::new(
            ClusterNodes {
                masters: masters.iter().map(connect).collect(),
                workers: workers.iter().map(connect).collect(),
            },
            KubeadmConfig::default(),
        )
        .with_ha(ha)
    }

    #[test]
    fn worker_without_ha_points_at_master0() {
        let journal = Journal::new();
        let c = cluster(&journal, &["10.0.0.1"], &["10.0.0.10"], HaMode::None);
        let w0 = c.nodes.workers[0].clone();
        join_worker(&w0, &c, &token()).unwrap();

        let cmds = journal.commands("10.0.0.10");
        assert!(cmds[0].starts_with("swapoff -a"));
        assert!(cmds.iter().any(|c| c.contains("echo '10.0.0.1 apiserver.k8s.local'")));
        assert!(cmds.last().unwrap().starts_with("kubeadm join apiserver.k8s.local:6443"));
        assert!(!cmds.last().unwrap().contains("--control-plane"));
        assert!(journal.first("10.0.0.10", "kubelet").is_none());
    }

    #[test]
    fn external_slb_leaves_hosts_alone() {
        let journal = Journal::new();
        let c = cluster(
            &journal,
            &["10.0.0.1", "10.0.0.2"],
            &["10.0.0.10"],
            HaMode::ExternalSlb,
        );
        let w0 = c.nodes.workers[0].clone();
        join_worker(&w0, &c, &token()).unwrap();
        assert!(journal.first("10.0.0.10", "/etc/hosts").is_none());
        assert!(journal.first("10.0.0.10", "kubeadm join").is_some());
    }

    #[test]
    fn single_master_ignores_configured_local_slb() {
        let journal = Journal::new();
        let c = cluster(
            &journal,
            &["10.0.0.1"],
            &["10.0.0.10"],
            HaMode::LocalSlb(LocalSlb::default()),
        );
        let w0 = c.nodes.workers[0].clone();
        join_worker(&w0, &c, &token()).unwrap();
        assert!(journal.first("10.0.0.10", "echo '10.0.0.1 apiserver.k8s.local'").is_some());
        assert!(journal.first("10.0.0.10", "restart kubelet").is_none());
    }

    #[derive(Default)]
    struct Recorded(std::sync::Mutex<Vec<(String, String)>>);

    impl crate::resolve::NameResolver for Recorded {
        fn point(&self, node: &Node, domain: &str, address: &str) -> anyhow::Result<()> {
            self.0
                .lock()
                .unwrap()
                .push((node.addr().to_string(), format!("{} {}", address, domain)));
            Ok(())
        }

        fn forget(&self, _node: &Node, _domain: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn name_resolution_goes_through_the_resolver() {
        let journal = Journal::new();
        let resolver = Arc::new(Recorded::default());
        let c = cluster(&journal, &["10.0.0.1", "10.0.0.2"], &[], HaMode::None)
            .with_resolver(resolver.clone());
        let m1 = c.nodes.masters[1].clone();
        join_master(&m1, &c, &token()).unwrap();

        assert!(journal.first("10.0.0.2", "/etc/hosts").is_none());
        let recorded = resolver.0.lock().unwrap().clone();
        assert_eq!(
            recorded,
            [
                ("10.0.0.2".to_string(), "10.0.0.1 apiserver.k8s.local".to_string()),
                ("10.0.0.2".to_string(), "127.0.0.1 apiserver.k8s.local".to_string()),
            ]
        );
    }

    #[test]
    fn other_master_switches_to_loopback_after_joining() {
        let journal = Journal::new();
        let c = cluster(
            &journal,
            &["10.0.0.1", "10.0.0.2"],
            &[],
            HaMode::LocalSlb(LocalSlb::default()),
        );
        let m1 = c.nodes.masters[1].clone();
        join_master(&m1, &c, &token()).unwrap();

        let to_master0 = journal
            .first("10.0.0.2", "echo '10.0.0.1 apiserver.k8s.local'")
            .unwrap();
        let join = journal.first("10.0.0.2", "kubeadm join").unwrap();
        let admin = journal.first("10.0.0.2", "admin.conf").unwrap();
        let to_loopback = journal
            .last("10.0.0.2", "echo '127.0.0.1 apiserver.k8s.local'")
            .unwrap();
        assert!(to_master0 < join);
        assert!(join < admin);
        assert!(admin < to_loopback);

        let cmds = journal.commands("10.0.0.2");
        let join_cmd = cmds.iter().find(|c| c.starts_with("kubeadm join")).unwrap();
        assert!(join_cmd.contains(&format!("--certificate-key {}", fixtures::CERT_KEY)));
        assert!(journal.first("10.0.0.2", "restart kubelet").is_none());
    }
}
