use crate::cluster::{KubeadmConfig, Token};

pub fn init(node_name: &str, cfg: &KubeadmConfig) -> String {
    format!(
        "kubeadm init \\\n  \
         --image-repository {} \\\n  \
         --pod-network-cidr {} \\\n  \
         --service-cidr {} \\\n  \
         --apiserver-bind-port {} \\\n  \
         --upload-certs \\\n  \
         --control-plane-endpoint {} \\\n  \
         --node-name {}",
        cfg.image_repository,
        cfg.pod_network_cidr,
        cfg.service_cidr,
        cfg.bind_port,
        cfg.control_plane_endpoint,
        node_name,
    )
}

pub fn join_worker(node_name: &str, cfg: &KubeadmConfig, token: &Token) -> String {
    format!(
        "kubeadm join {} \\\n  \
         --token {} \\\n  \
         --discovery-token-ca-cert-hash sha256:{} \\\n  \
         --node-name {} \\\n  \
         --ignore-preflight-errors=DirAvailable--etc-kubernetes-manifests",
        cfg.control_plane_endpoint, token.token, token.ca_cert_hash, node_name,
    )
}

pub fn join_control_plane(node_name: &str, cfg: &KubeadmConfig, token: &Token) -> String {
    format!(
        "kubeadm join {} \\\n  \
         --token {} \\\n  \
         --discovery-token-ca-cert-hash sha256:{} \\\n  \
         --certificate-key {} \\\n  \
         --control-plane \\\n  \
         --apiserver-bind-port {} \\\n  \
         --node-name {}",
        cfg.control_plane_endpoint,
        token.token,
        token.ca_cert_hash,
        token.certificate_key,
        cfg.bind_port,
        node_name,
    )
}

pub fn reset() -> &'static str {
    "kubeadm reset -f"
}

pub fn get_nodes() -> &'static str {
    "kubectl get nodes -o wide"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token {
            token: "abcdef.0123456789abcdef".to_string(),
            ca_cert_hash: "a".repeat(64),
            certificate_key: "b".repeat(64),
        }
    }

    #[test]
    fn init_uploads_certs_behind_the_endpoint() {
        let cmd = init("m0", &KubeadmConfig::default());
        assert!(cmd.starts_with("kubeadm init \\\n  --image-repository k8s.gcr.io \\\n"));
        assert!(cmd.contains("--upload-certs"));
        assert!(cmd.contains("--control-plane-endpoint apiserver.k8s.local:6443"));
        assert!(cmd.ends_with("--node-name m0"));
    }

    #[test]
    fn worker_join_uses_token_and_hash_only() {
        let cmd = join_worker("w0", &KubeadmConfig::default(), &token());
        assert!(cmd.starts_with("kubeadm join apiserver.k8s.local:6443"));
        assert!(cmd.contains("--token abcdef.0123456789abcdef"));
        assert!(cmd.contains(&format!("sha256:{}", "a".repeat(64))));
        assert!(!cmd.contains("--certificate-key"));
        assert!(!cmd.contains("--control-plane "));
    }

    #[test]
    fn control_plane_join_carries_certificate_key() {
        let cmd = join_control_plane("m1", &KubeadmConfig::default(), &token());
        assert!(cmd.contains(&format!("--certificate-key {}", "b".repeat(64))));
        assert!(cmd.contains("--control-plane \\\n"));
        assert!(cmd.ends_with("--node-name m1"));
    }
}
