//! Cluster data model
//!
//! A `Cluster` is assembled once from the configuration file and is
//! read-only while bootstrap runs. `Masters[0]` is always the bootstrap master.

mod ha;
mod kubeadm;
mod node;

pub use ha::{Flannel, HaMode, LocalSlb, NetworkPlugin, Nginx};
pub use kubeadm::{Image, KubeadmConfig, Token, split_host_port};
pub use node::{HostInfo, InstallMode, Node, PackageManager};

use crate::config::constants;
use crate::error::{Error, Result};
use crate::resolve::{HostsFile, NameResolver};
use crate::utils::wait::PollSettings;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ClusterNodes {
    pub masters: Vec<Arc<Node>>,
    pub workers: Vec<Arc<Node>>,
}

impl ClusterNodes {
    pub fn first_master(&self) -> Result<&Arc<Node>> {
        self.masters.first().ok_or(Error::NoMasters)
    }

    /// Masters after the bootstrap master
    pub fn other_masters(&self) -> &[Arc<Node>] {
        self.masters.get(1..).unwrap_or(&[])
    }

    pub fn all(&self) -> Vec<Arc<Node>> {
        self.masters
            .iter()
            .chain(self.workers.iter())
            .cloned()
            .collect()
    }

    pub fn master_hosts(&self) -> Vec<String> {
        self.masters.iter().map(|m| m.addr().to_string()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.masters
            .iter()
            .chain(self.workers.iter())
            .map(|n| n.name.clone())
            .collect()
    }
}

/// Fan-out width and polling budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub parallelism: usize,
    pub slb_poll: PollSettings,
    pub ready_poll: PollSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallelism: constants::DEFAULT_PARALLELISM,
            slb_poll: PollSettings::new(
                constants::DEFAULT_LOCAL_SLB_INTERVAL,
                constants::DEFAULT_LOCAL_SLB_TIMEOUT,
            ),
            ready_poll: PollSettings::new(
                constants::DEFAULT_WAIT_NODE_INTERVAL,
                constants::DEFAULT_WAIT_NODE_TIMEOUT,
            ),
        }
    }
}

pub struct Cluster {
    pub nodes: ClusterNodes,
    pub kubeadm: KubeadmConfig,
    pub ha: HaMode,
    pub network: NetworkPlugin,
    pub settings: Settings,
    pub resolver: Arc<dyn NameResolver>,
}

impl Cluster {
    pub fn new(nodes: ClusterNodes, kubeadm: KubeadmConfig) -> Self {
        Self {
            nodes,
            kubeadm,
            ha: HaMode::None,
            network: NetworkPlugin::default(),
            settings: Settings::default(),
            resolver: Arc::new(HostsFile),
        }
    }

    pub fn with_ha(mut self, ha: HaMode) -> Self {
        self.ha = ha;
        self
    }

    pub fn with_network(mut self, network: NetworkPlugin) -> Self {
        self.network = network;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// HA mode joins actually use: with a single master there is nothing to
    /// balance across, so it is always `None`.
    pub fn effective_ha(&self) -> HaMode {
        if self.nodes.masters.len() <= 1 {
            HaMode::None
        } else {
            self.ha.clone()
        }
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("nodes", &self.nodes)
            .field("kubeadm", &self.kubeadm)
            .field("ha", &self.ha)
            .field("network", &self.network)
            .field("settings", &self.settings)
            .finish()
    }
}
