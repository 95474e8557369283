//! Tearing a bootstrapped cluster back down

use crate::cluster::{Cluster, Node, PackageManager};
use crate::config::constants::{KUBELET_OVERRIDE_PATH, NGINX_CONF_PATH, NGINX_MANIFEST_PATH};
use crate::error::{Error, Result};
use crate::fanout::Fanout;
use crate::resolve::NameResolver;
use crate::templates::{kubeadm, system};
use std::sync::Arc;
use tracing::debug;

const PHASE: &str = "reset";

fn reset_node(
    node: &Node,
    resolver: &dyn NameResolver,
    domain: &str,
    remove_components: bool,
) -> Result<()> {
    debug!(host = %node.addr(), "[reset] kubeadm reset");
    node.run(PHASE, kubeadm::reset())?;

    resolver
        .forget(node, domain)
        .map_err(|e| Error::remote(node.addr(), PHASE, e))?;

    for path in [KUBELET_OVERRIDE_PATH, NGINX_MANIFEST_PATH, NGINX_CONF_PATH] {
        node.remove_file(PHASE, path)?;
    }

    if remove_components {
        let apt = match node.package_manager() {
            Some(PackageManager::Apt) => true,
            Some(PackageManager::Yum) => false,
            None => {
                return Err(Error::Remote {
                    host: node.addr().to_string(),
                    phase: PHASE,
                    message: "package manager unknown, run preflight first".to_string(),
                });
            }
        };
        debug!(host = %node.addr(), "[reset] Removing kubelet, kubeadm and kubectl");
        node.run(PHASE, &system::remove_kube_components(apt))?;
    }
    Ok(())
}

/// Undo init and join on every node
pub async fn reset(cluster: &Cluster, fanout: &Fanout, remove_components: bool) -> Result<()> {
    let domain = cluster.kubeadm.api_domain()?.to_string();
    let resolver = Arc::clone(&cluster.resolver);
    fanout
        .on_all(&cluster.nodes, move |node| {
            reset_node(node, resolver.as_ref(), &domain, remove_components)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterNodes, KubeadmConfig};
    use crate::testing::{Call, Journal, connected_node};

    fn cluster(journal: &Arc<Journal>) -> Cluster {
        let (m0, _) = connected_node("m0", journal);
        let (w0, _) = connected_node("w0", journal);
        Cluster::new(
            ClusterNodes {
                masters: vec![m0],
                workers: vec![w0],
            },
            KubeadmConfig::default(),
        )
    }

    #[tokio::test]
    async fn every_node_is_reset_and_slb_files_removed() {
        let journal = Journal::new();
        let c = cluster(&journal);
        reset(&c, &Fanout::default(), false).await.unwrap();

        for host in ["m0", "w0"] {
            let calls = journal.calls(host);
            assert_eq!(calls[0], Call::Run("kubeadm reset -f".to_string()));
            assert_eq!(
                calls[1],
                Call::Run("sed -i '/apiserver\\.k8s\\.local/d' /etc/hosts".to_string())
            );
            assert!(calls.contains(&Call::Remove(KUBELET_OVERRIDE_PATH.to_string())));
            assert!(calls.contains(&Call::Remove(NGINX_MANIFEST_PATH.to_string())));
            assert_eq!(calls.len(), 5);
        }
    }

    #[tokio::test]
    async fn component_removal_uses_the_detected_package_manager() {
        let journal = Journal::new();
        let c = cluster(&journal);
        c.nodes.masters[0].set_package_manager(PackageManager::Apt);
        c.nodes.workers[0].set_package_manager(PackageManager::Yum);
        reset(&c, &Fanout::default(), true).await.unwrap();

        assert!(journal.last("m0", "apt-get").is_some());
        assert!(journal.last("w0", "yum remove").is_some());
    }

    #[tokio::test]
    async fn component_removal_needs_preflight() {
        let journal = Journal::new();
        let c = cluster(&journal);
        let err = reset(&c, &Fanout::default(), true).await.unwrap_err();
        assert!(err.to_string().contains("run preflight first"));
    }
}
