//! HA and network plugin choices

use crate::cluster::kubeadm::Image;
use crate::config::constants;

/// How nodes reach the control plane
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HaMode {
    /// Every node talks to master-0 directly
    #[default]
    None,
    /// Each joining node runs its own reverse proxy in front of all masters
    LocalSlb(LocalSlb),
    /// An external load balancer fronts the masters (not implemented)
    ExternalSlb,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalSlb {
    pub nginx: Nginx,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nginx {
    /// Port the proxy listens on at 127.0.0.1
    pub port: u16,
    pub image: Image,
}

impl Default for Nginx {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_NGINX_PORT,
            image: Image::new(
                constants::DEFAULT_NGINX_IMAGE_REPOSITORY,
                constants::DEFAULT_NGINX_IMAGE_NAME,
                constants::DEFAULT_NGINX_VERSION,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkPlugin {
    None,
    Flannel(Flannel),
    /// Not implemented
    Calico,
}

impl Default for NetworkPlugin {
    fn default() -> Self {
        NetworkPlugin::Flannel(Flannel::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flannel {
    pub image: Image,
    pub backend: String,
}

impl Default for Flannel {
    fn default() -> Self {
        Self {
            image: Image::new(
                constants::DEFAULT_FLANNEL_IMAGE_REPOSITORY,
                constants::DEFAULT_FLANNEL_IMAGE_NAME,
                constants::DEFAULT_FLANNEL_VERSION,
            ),
            backend: constants::DEFAULT_FLANNEL_BACKEND.to_string(),
        }
    }
}
