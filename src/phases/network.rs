//! Pod network plugin installation, run on master-0 after init

use crate::cluster::{Cluster, NetworkPlugin, Node};
use crate::config::constants::FLANNEL_MANIFEST_PATH;
use crate::error::Result;
use crate::templates::flannel;
use tracing::{info, warn};

pub fn deploy_network(node: &Node, cluster: &Cluster) -> Result<()> {
    match &cluster.network {
        NetworkPlugin::Flannel(cfg) => {
            info!(host = %node.addr(), "[network] Deploying flannel");
            let manifest = flannel::manifest(
                &cluster.kubeadm.pod_network_cidr,
                &cfg.image.reference(),
                &cfg.backend,
            );
            node.write_file("network", FLANNEL_MANIFEST_PATH, &manifest)?;
            node.run("network", &flannel::apply(FLANNEL_MANIFEST_PATH))
        }
        NetworkPlugin::None => {
            println!("Network plugin is none, install one yourself, e.g.:");
            println!("  kubectl apply -f <your-cni-manifest.yml>");
            Ok(())
        }
        NetworkPlugin::Calico => {
            warn!(host = %node.addr(), "[network] calico is not supported yet, skipping");
            Ok(())
        }
    }
}
