//! A remote machine taking part in the cluster

use crate::error::{Error, Result};
use crate::utils::exec::Runner;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// How to reach a node over SSH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Yum,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageManager::Apt => write!(f, "apt"),
            PackageManager::Yum => write!(f, "yum"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    #[default]
    Online,
    Offline,
}

/// One remote machine.
///
/// Shared between fan-out tasks as `Arc<Node>`; the fields filled in after
/// construction (command channel, package manager, transfer marker) are
/// write-once or atomic so concurrent tasks only ever read settled values.
pub struct Node {
    pub host_info: HostInfo,
    pub name: String,
    pub install_mode: InstallMode,
    package_manager: OnceLock<PackageManager>,
    sent: AtomicBool,
    runner: OnceLock<Arc<dyn Runner>>,
}

impl Node {
    /// Create a node; `name` defaults to the host address
    pub fn new(host_info: HostInfo, name: Option<String>, install_mode: InstallMode) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| host_info.host.clone());
        Self {
            host_info,
            name,
            install_mode,
            package_manager: OnceLock::new(),
            sent: AtomicBool::new(false),
            runner: OnceLock::new(),
        }
    }

    /// Address used in every log line and error
    pub fn addr(&self) -> &str {
        &self.host_info.host
    }

    pub fn is_root(&self) -> bool {
        self.host_info.user == "root"
    }

    /// Attach the command channel. Returns false if one was already attached.
    pub fn attach_runner(&self, runner: Arc<dyn Runner>) -> bool {
        self.runner.set(runner).is_ok()
    }

    pub fn is_connected(&self) -> bool {
        self.runner.get().is_some()
    }

    pub fn runner(&self) -> Result<&dyn Runner> {
        self.runner
            .get()
            .map(|r| r.as_ref())
            .ok_or_else(|| Error::NotConnected {
                host: self.addr().to_string(),
            })
    }

    pub fn package_manager(&self) -> Option<PackageManager> {
        self.package_manager.get().copied()
    }

    pub fn set_package_manager(&self, kind: PackageManager) {
        let _ = self.package_manager.set(kind);
    }

    /// Offline packages have been transferred to this node
    pub fn is_sent(&self) -> bool {
        self.sent.load(Ordering::Acquire)
    }

    pub fn mark_sent(&self) {
        self.sent.store(true, Ordering::Release);
    }

    /// Run a command, attributing failures to this node and `phase`
    pub fn run(&self, phase: &'static str, command: &str) -> Result<()> {
        self.runner()?
            .run(command)
            .map_err(|e| Error::remote(self.addr(), phase, e))
    }

    /// Run a command and return its stdout as text
    pub fn run_out(&self, phase: &'static str, command: &str) -> Result<String> {
        let out = self
            .runner()?
            .run_out(command)
            .map_err(|e| Error::remote(self.addr(), phase, e))?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn write_file(&self, phase: &'static str, path: &str, content: &str) -> Result<()> {
        self.runner()?
            .write_file(path, content.as_bytes())
            .map_err(|e| Error::remote(self.addr(), phase, e))
    }

    pub fn file_exists(&self, phase: &'static str, path: &str) -> Result<bool> {
        self.runner()?
            .file_exists(path)
            .map_err(|e| Error::remote(self.addr(), phase, e))
    }

    pub fn remove_file(&self, phase: &'static str, path: &str) -> Result<()> {
        self.runner()?
            .remove_file(path)
            .map_err(|e| Error::remote(self.addr(), phase, e))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("host", &self.host_info.host)
            .field("name", &self.name)
            .field("install_mode", &self.install_mode)
            .field("package_manager", &self.package_manager())
            .field("connected", &self.is_connected())
            .finish()
    }
}
