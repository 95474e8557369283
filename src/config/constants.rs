//! Defaults and well-known paths

use std::time::Duration;

// ssh
pub const DEFAULT_SSH_USER: &str = "root";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const SSH_PASSWORD_ENV: &str = "KUBESTRAP_SSH_PASSWORD";

/// Fan-out ceiling: never more than this many nodes are worked on at once
pub const DEFAULT_PARALLELISM: usize = 20;

// kubeadm
pub const DEFAULT_CONTROL_PLANE_ENDPOINT: &str = "apiserver.k8s.local:6443";
pub const DEFAULT_POD_NETWORK_CIDR: &str = "10.244.0.0/16";
pub const DEFAULT_SERVICE_CIDR: &str = "10.96.0.0/12";
pub const DEFAULT_IMAGE_REPOSITORY: &str = "k8s.gcr.io";
pub const DEFAULT_API_BIND_PORT: u16 = 6443;
pub const DEFAULT_PAUSE_IMAGE_TAG: &str = "3.1";
pub const DEFAULT_CGROUP_DRIVER: &str = "cgroupfs";

pub const DEFAULT_LOCAL_SLB_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_LOCAL_SLB_TIMEOUT: Duration = Duration::from_secs(6 * 60);
pub const DEFAULT_WAIT_NODE_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_WAIT_NODE_TIMEOUT: Duration = Duration::from_secs(6 * 60);

// ha
pub const LOOPBACK_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_NGINX_PORT: u16 = 6443;
pub const DEFAULT_NGINX_IMAGE_REPOSITORY: &str = "";
pub const DEFAULT_NGINX_IMAGE_NAME: &str = "nginx";
pub const DEFAULT_NGINX_VERSION: &str = "1.19.9";

// network plugin
pub const DEFAULT_FLANNEL_IMAGE_REPOSITORY: &str = "quay.io/coreos";
pub const DEFAULT_FLANNEL_IMAGE_NAME: &str = "flannel";
pub const DEFAULT_FLANNEL_VERSION: &str = "v0.11.0-amd64";
pub const DEFAULT_FLANNEL_BACKEND: &str = "vxlan";

// on-node paths
pub const HOSTS_FILE: &str = "/etc/hosts";
pub const NGINX_CONF_PATH: &str = "/etc/kubernetes/nginx.conf";
pub const STATIC_POD_DIR: &str = "/etc/kubernetes/manifests";
pub const NGINX_MANIFEST_PATH: &str = "/etc/kubernetes/manifests/nginx-proxy.yml";
pub const KUBELET_OVERRIDE_PATH: &str =
    "/etc/systemd/system/kubelet.service.d/20-ha-service-manager.conf";
pub const ADMIN_CONF_PATH: &str = "/etc/kubernetes/admin.conf";
pub const FLANNEL_MANIFEST_PATH: &str = "/tmp/.kubestrap/kube-flannel.yml";
pub const OFFLINE_IMAGES_DIR: &str = "/tmp/.kubestrap/images";
