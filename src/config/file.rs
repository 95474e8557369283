//! The cluster description file
//!
//! ```toml
//! [ssh]
//! user = "ubuntu"
//! key = "~/.ssh/id_ed25519"
//!
//! [[masters]]
//! host = "10.0.0.1"
//! name = "m0"
//!
//! [[workers]]
//! host = "10.0.0.10"
//! install = "offline"
//!
//! [ha]
//! type = "local"
//! ```

use crate::cluster::{
    Cluster, ClusterNodes, Flannel, HaMode, HostInfo, Image, InstallMode, KubeadmConfig, LocalSlb,
    NetworkPlugin, Nginx, Node, Settings, split_host_port,
};
use crate::config::constants;
use crate::error::{Error, Result};
use crate::utils::wait::PollSettings;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterFile {
    pub ssh: SshSection,
    pub masters: Vec<NodeEntry>,
    pub workers: Vec<NodeEntry>,
    pub kubeadm: KubeadmSection,
    pub ha: HaSection,
    pub network: NetworkSection,
    pub timeouts: TimeoutSection,
}

/// Connection defaults every node inherits
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshSection {
    pub user: String,
    pub port: u16,
    pub password: Option<String>,
    pub key: Option<String>,
    /// Most nodes worked on at once
    pub parallelism: usize,
}

impl Default for SshSection {
    fn default() -> Self {
        Self {
            user: constants::DEFAULT_SSH_USER.to_string(),
            port: constants::DEFAULT_SSH_PORT,
            password: None,
            key: None,
            parallelism: constants::DEFAULT_PARALLELISM,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Install {
    #[default]
    Online,
    Offline,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeEntry {
    pub host: String,
    pub name: Option<String>,
    #[serde(default)]
    pub install: Install,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KubeadmSection {
    pub control_plane_endpoint: String,
    pub pod_network_cidr: String,
    pub service_cidr: String,
    pub image_repository: String,
    pub bind_port: u16,
    pub pause_image_tag: String,
}

impl Default for KubeadmSection {
    fn default() -> Self {
        let d = KubeadmConfig::default();
        Self {
            control_plane_endpoint: d.control_plane_endpoint,
            pod_network_cidr: d.pod_network_cidr,
            service_cidr: d.service_cidr,
            image_repository: d.image_repository,
            bind_port: d.bind_port,
            pause_image_tag: d.pause_image_tag,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HaType {
    #[default]
    None,
    Local,
    External,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HaSection {
    #[serde(rename = "type")]
    pub kind: HaType,
    pub nginx: NginxSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NginxSection {
    pub port: u16,
    pub image: String,
}

impl Default for NginxSection {
    fn default() -> Self {
        let d = Nginx::default();
        Self {
            port: d.port,
            image: d.image.reference(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    None,
    #[default]
    Flannel,
    Calico,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    #[serde(rename = "type")]
    pub kind: NetworkType,
    pub flannel: FlannelSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlannelSection {
    pub image: String,
    pub backend: String,
}

impl Default for FlannelSection {
    fn default() -> Self {
        let d = Flannel::default();
        Self {
            image: d.image.reference(),
            backend: d.backend,
        }
    }
}

/// Polling budgets, in seconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSection {
    pub local_slb_interval: u64,
    pub local_slb_timeout: u64,
    pub wait_node_interval: u64,
    pub wait_node_timeout: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            local_slb_interval: constants::DEFAULT_LOCAL_SLB_INTERVAL.as_secs(),
            local_slb_timeout: constants::DEFAULT_LOCAL_SLB_TIMEOUT.as_secs(),
            wait_node_interval: constants::DEFAULT_WAIT_NODE_INTERVAL.as_secs(),
            wait_node_timeout: constants::DEFAULT_WAIT_NODE_TIMEOUT.as_secs(),
        }
    }
}

impl ClusterFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: ClusterFile =
            toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> Result<()> {
        if self.masters.is_empty() {
            return Err(Error::config("at least one master is required"));
        }
        if self.ssh.parallelism == 0 {
            return Err(Error::config("ssh.parallelism must be at least 1"));
        }
        let (_, endpoint_port) = split_host_port(&self.kubeadm.control_plane_endpoint)?;

        // Joining nodes reach the endpoint through the local proxy
        if self.ha.kind == HaType::Local && self.ha.nginx.port != endpoint_port {
            return Err(Error::config(format!(
                "ha.nginx.port {} must match the control plane endpoint port {}",
                self.ha.nginx.port, endpoint_port
            )));
        }

        let mut seen = HashSet::new();
        for entry in self.masters.iter().chain(self.workers.iter()) {
            if entry.host.trim().is_empty() {
                return Err(Error::config("node host must not be empty"));
            }
            let name = entry
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(&entry.host);
            if !seen.insert(name.to_string()) {
                return Err(Error::config(format!("duplicate node name '{}'", name)));
            }
        }
        Ok(())
    }

    /// Build the cluster, taking the SSH password from the environment when
    /// the file has none
    pub fn into_cluster(self) -> Result<Cluster> {
        let env_password = std::env::var(constants::SSH_PASSWORD_ENV).ok();
        self.build(env_password)
    }

    fn build(self, env_password: Option<String>) -> Result<Cluster> {
        self.validate()?;
        let ssh = &self.ssh;
        let password = ssh.password.clone().or(env_password);

        let node = |entry: &NodeEntry| {
            let info = HostInfo {
                host: entry.host.trim().to_string(),
                port: entry.port.unwrap_or(ssh.port),
                user: entry.user.clone().unwrap_or_else(|| ssh.user.clone()),
                password: entry.password.clone().or_else(|| password.clone()),
                key: entry.key.clone().or_else(|| ssh.key.clone()),
            };
            let mode = match entry.install {
                Install::Online => InstallMode::Online,
                Install::Offline => InstallMode::Offline,
            };
            Arc::new(Node::new(info, entry.name.clone(), mode))
        };
        let nodes = ClusterNodes {
            masters: self.masters.iter().map(&node).collect(),
            workers: self.workers.iter().map(&node).collect(),
        };

        let k = &self.kubeadm;
        let kubeadm = KubeadmConfig {
            control_plane_endpoint: k.control_plane_endpoint.clone(),
            pod_network_cidr: k.pod_network_cidr.clone(),
            service_cidr: k.service_cidr.clone(),
            image_repository: k.image_repository.clone(),
            bind_port: k.bind_port,
            pause_image_tag: k.pause_image_tag.clone(),
        };

        let ha = match self.ha.kind {
            HaType::None => HaMode::None,
            HaType::Local => HaMode::LocalSlb(LocalSlb {
                nginx: Nginx {
                    port: self.ha.nginx.port,
                    image: Image::parse(&self.ha.nginx.image)?,
                },
            }),
            HaType::External => HaMode::ExternalSlb,
        };

        let network = match self.network.kind {
            NetworkType::None => NetworkPlugin::None,
            NetworkType::Flannel => NetworkPlugin::Flannel(Flannel {
                image: Image::parse(&self.network.flannel.image)?,
                backend: self.network.flannel.backend.clone(),
            }),
            NetworkType::Calico => NetworkPlugin::Calico,
        };

        let t = &self.timeouts;
        let settings = Settings {
            parallelism: ssh.parallelism,
            slb_poll: PollSettings::new(
                Duration::from_secs(t.local_slb_interval),
                Duration::from_secs(t.local_slb_timeout),
            ),
            ready_poll: PollSettings::new(
                Duration::from_secs(t.wait_node_interval),
                Duration::from_secs(t.wait_node_timeout),
            ),
        };

        Ok(Cluster::new(nodes, kubeadm)
            .with_ha(ha)
            .with_network(network)
            .with_settings(settings))
    }
}
