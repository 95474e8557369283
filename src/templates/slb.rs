//! Files that make up the local software load balancer

use crate::config::constants::{NGINX_CONF_PATH, STATIC_POD_DIR};

/// nginx stream proxy listening on loopback and balancing across all masters
pub fn nginx_conf(masters: &[String], nginx_port: u16, master_port: u16) -> String {
    let upstreams: String = masters
        .iter()
        .map(|m| format!("    server {}:{};\n", m, master_port))
        .collect();

    format!(
        r#"error_log stderr notice;

worker_processes 2;
worker_rlimit_nofile 130048;
worker_shutdown_timeout 10s;

events {{
  multi_accept on;
  use epoll;
  worker_connections 16384;
}}

stream {{
  upstream kube_apiserver {{
    least_conn;
{upstreams}  }}

  server {{
    listen        127.0.0.1:{nginx_port};
    proxy_pass    kube_apiserver;
    proxy_timeout 10m;
    proxy_connect_timeout 1s;
  }}
}}

http {{
  aio threads;
  aio_write on;
  tcp_nopush on;
  tcp_nodelay on;

  keepalive_timeout 5m;
  keepalive_requests 100;
  reset_timedout_connection on;
  server_tokens off;
  autoindex off;
}}
"#
    )
}

/// Static pod running the proxy with host networking
pub fn nginx_manifest(image: &str) -> String {
    format!(
        r#"apiVersion: v1
kind: Pod
metadata:
  name: nginx-proxy
  namespace: kube-system
  labels:
    addonmanager.kubernetes.io/mode: Reconcile
    k8s-app: kube-nginx
spec:
  hostNetwork: true
  dnsPolicy: ClusterFirstWithHostNet
  nodeSelector:
    kubernetes.io/os: linux
  priorityClassName: system-node-critical
  containers:
  - name: nginx-proxy
    image: {image}
    imagePullPolicy: IfNotPresent
    resources:
      requests:
        cpu: 25m
        memory: 32M
    securityContext:
      privileged: true
    volumeMounts:
    - mountPath: /etc/nginx/nginx.conf
      name: nginx-conf
      readOnly: true
  volumes:
  - name: nginx-conf
    hostPath:
      path: {conf}
      type: FileOrCreate
"#,
        image = image,
        conf = NGINX_CONF_PATH,
    )
}

/// systemd drop-in that turns kubelet into a standalone static-pod runner
pub fn kubelet_override(pause_image: &str, cgroup_driver: &str) -> String {
    format!(
        "[Service]\n\
         ExecStart=\n\
         ExecStart=/usr/bin/kubelet --address=127.0.0.1 --pod-manifest-path={} \
         --pod-infra-container-image={} --cgroup-driver={}\n\
         Restart=always\n",
        STATIC_POD_DIR, pause_image, cgroup_driver
    )
}

pub fn docker_cgroup_driver() -> &'static str {
    "docker info --format '{{.CgroupDriver}}'"
}

/// Health request to the API through whatever `domain` resolves to locally
pub fn healthz(control_plane_endpoint: &str) -> String {
    format!("curl -k -s https://{}/healthz", control_plane_endpoint)
}
