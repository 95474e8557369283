//! Shell command and file text sent to nodes

pub mod flannel;
pub mod kubeadm;
pub mod slb;
pub mod system;
