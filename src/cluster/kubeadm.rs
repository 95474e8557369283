//! kubeadm settings and join credentials

use crate::config::constants;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeadmConfig {
    /// `domain:port` every node uses to reach the API
    pub control_plane_endpoint: String,
    pub pod_network_cidr: String,
    pub service_cidr: String,
    pub image_repository: String,
    /// Port each API server binds on its own host
    pub bind_port: u16,
    pub pause_image_tag: String,
}

impl Default for KubeadmConfig {
    fn default() -> Self {
        Self {
            control_plane_endpoint: constants::DEFAULT_CONTROL_PLANE_ENDPOINT.to_string(),
            pod_network_cidr: constants::DEFAULT_POD_NETWORK_CIDR.to_string(),
            service_cidr: constants::DEFAULT_SERVICE_CIDR.to_string(),
            image_repository: constants::DEFAULT_IMAGE_REPOSITORY.to_string(),
            bind_port: constants::DEFAULT_API_BIND_PORT,
            pause_image_tag: constants::DEFAULT_PAUSE_IMAGE_TAG.to_string(),
        }
    }
}

impl KubeadmConfig {
    /// The domain part of the control-plane endpoint
    pub fn api_domain(&self) -> Result<&str> {
        split_host_port(&self.control_plane_endpoint).map(|(host, _)| host)
    }

    pub fn pause_image(&self) -> String {
        format!("{}/pause:{}", self.image_repository, self.pause_image_tag)
    }
}

/// Split `host:port`, rejecting anything else
pub fn split_host_port(endpoint: &str) -> Result<(&str, u16)> {
    let (host, port) = endpoint.rsplit_once(':').ok_or_else(|| {
        Error::config(format!(
            "control plane endpoint '{}' must be host:port",
            endpoint
        ))
    })?;
    if host.is_empty() {
        return Err(Error::config(format!(
            "control plane endpoint '{}' has an empty host",
            endpoint
        )));
    }
    let port = port.parse::<u16>().map_err(|_| {
        Error::config(format!(
            "control plane endpoint '{}' has an invalid port",
            endpoint
        ))
    })?;
    Ok((host, port))
}

/// Credentials a new node presents to join the cluster.
///
/// Built once from master-0's init output and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub token: String,
    pub ca_cert_hash: String,
    pub certificate_key: String,
}

/// A container image reference split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub repository: String,
    pub name: String,
    pub tag: String,
}

impl Image {
    pub fn new(repository: &str, name: &str, tag: &str) -> Self {
        Self {
            repository: repository.to_string(),
            name: name.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Split `repo/path/name:tag`; a missing tag means `latest`
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let (path, tag) = match reference.rsplit_once(':') {
            Some((path, tag)) if !tag.contains('/') => (path, tag),
            _ => (reference, "latest"),
        };
        let (repository, name) = path.rsplit_once('/').unwrap_or(("", path));
        if name.is_empty() || tag.is_empty() {
            return Err(Error::config(format!(
                "'{}' is not a valid image reference",
                reference
            )));
        }
        Ok(Self::new(repository, name, tag))
    }

    /// Full reference, omitting the repository when it is empty
    pub fn reference(&self) -> String {
        if self.repository.is_empty() {
            format!("{}:{}", self.name, self.tag)
        } else {
            format!("{}/{}:{}", self.repository, self.name, self.tag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_domain_strips_the_port() {
        let cfg = KubeadmConfig::default();
        assert_eq!(cfg.api_domain().unwrap(), "apiserver.k8s.local");
    }

    #[test]
    fn endpoints_without_a_port_are_rejected() {
        assert!(split_host_port("apiserver.k8s.local").is_err());
        assert!(split_host_port(":6443").is_err());
        assert!(split_host_port("apiserver:http").is_err());
        assert_eq!(split_host_port("api.example:8443").unwrap(), ("api.example", 8443));
    }

    #[test]
    fn pause_image_lives_in_the_image_repository() {
        let cfg = KubeadmConfig {
            image_repository: "registry.local/k8s".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.pause_image(), "registry.local/k8s/pause:3.1");
    }

    #[test]
    fn image_references_are_split_into_parts() {
        let img = Image::parse("quay.io/coreos/flannel:v0.11.0-amd64").unwrap();
        assert_eq!(img, Image::new("quay.io/coreos", "flannel", "v0.11.0-amd64"));
        assert_eq!(Image::parse("nginx:1.19.9").unwrap(), Image::new("", "nginx", "1.19.9"));
        assert_eq!(
            Image::parse("registry.local:5000/nginx").unwrap(),
            Image::new("registry.local:5000", "nginx", "latest")
        );
        assert!(Image::parse("nginx:").is_err());
        assert!(Image::parse("").is_err());
    }

    #[test]
    fn image_reference_without_repository() {
        assert_eq!(Image::new("", "nginx", "1.19.9").reference(), "nginx:1.19.9");
        assert_eq!(
            Image::new("quay.io/coreos", "flannel", "v0.11.0-amd64").reference(),
            "quay.io/coreos/flannel:v0.11.0-amd64"
        );
    }
}
