use crate::config::constants::{ADMIN_CONF_PATH, HOSTS_FILE};

/// Escape a domain for use inside a sed address
fn sed_pattern(domain: &str) -> String {
    domain.replace('.', "\\.")
}

/// Replace any hosts entry for `domain` with one pointing at `ip`
pub fn set_hosts(ip: &str, domain: &str) -> String {
    format!(
        "sed -i '/{pattern}/d' {hosts}\necho '{ip} {domain}' >> {hosts}",
        pattern = sed_pattern(domain),
        hosts = HOSTS_FILE,
        ip = ip,
        domain = domain,
    )
}

pub fn reset_hosts(domain: &str) -> String {
    format!("sed -i '/{}/d' {}", sed_pattern(domain), HOSTS_FILE)
}

pub fn swap_off() -> String {
    "swapoff -a && sysctl -w vm.swappiness=0\nsed -i '/swap/ s/^#*/#/' /etc/fstab".to_string()
}

pub const SYSCTL_CONF_PATH: &str = "/etc/sysctl.d/99-k8s-sysctl.conf";

pub fn sysctl_conf() -> &'static str {
    "net.ipv4.ip_forward=1\n\
     net.bridge.bridge-nf-call-iptables=1\n\
     net.bridge.bridge-nf-call-arptables=1\n\
     net.bridge.bridge-nf-call-ip6tables=1\n"
}

pub fn apply_sysctl() -> String {
    "modprobe br_netfilter || true\nsysctl --system".to_string()
}

pub fn restart(service: &str) -> String {
    format!(
        "systemctl daemon-reload && systemctl enable {0} && systemctl restart {0}",
        service
    )
}

/// Home directory of `user` from the passwd database; sudo may have reset
/// `$HOME` to root's
fn user_home(user: &str) -> String {
    format!("$(getent passwd {} | cut -d: -f6)", user)
}

/// Copy admin.conf into `user`'s `~/.kube/config`, handing the directory to
/// them when `chown` is set
pub fn copy_admin_config(user: &str, chown: bool) -> String {
    install_kube_config(&user_home(user), ADMIN_CONF_PATH, chown.then_some(user))
}

fn install_kube_config(home: &str, admin_conf: &str, owner: Option<&str>) -> String {
    let mut script = format!(
        "home=\"{home}\"\ntest -n \"$home\"\nmkdir -p \"$home/.kube\"\ncp -f {admin_conf} \"$home/.kube/config\"",
    );
    if let Some(user) = owner {
        script.push_str(&format!(
            "\nchown -R {0}:$(id -g {0}) \"$home/.kube\"",
            user
        ));
    }
    script
}

pub fn detect_package_manager() -> &'static str {
    "if command -v apt-get >/dev/null 2>&1; then echo apt; \
     elif command -v yum >/dev/null 2>&1; then echo yum; \
     else echo unknown; fi"
}

pub fn remove_kube_components(apt: bool) -> String {
    if apt {
        "apt-mark unhold kubelet kubeadm kubectl || true\n\
         DEBIAN_FRONTEND=noninteractive apt-get -y purge -qq kubelet kubeadm kubectl"
            .to_string()
    } else {
        "yum remove -y -q kubelet kubeadm kubectl".to_string()
    }
}
