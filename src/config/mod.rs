pub mod constants;
mod file;

pub use file::{
    ClusterFile, FlannelSection, HaSection, HaType, Install, KubeadmSection, NetworkSection,
    NetworkType, NginxSection, NodeEntry, SshSection, TimeoutSection,
};
