//! Scripted runners for exercising phases without SSH

use crate::cluster::{HostInfo, InstallMode, Node};
use crate::utils::exec::Runner;
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Run(String),
    RunOut(String),
    Write(String, String),
    Remove(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Event {
    pub host: String,
    pub call: Call,
}

impl Event {
    pub fn command(&self) -> Option<&str> {
        match &self.call {
            Call::Run(c) | Call::RunOut(c) => Some(c),
            _ => None,
        }
    }
}

/// Every remote call across all fake nodes, in the order it happened
#[derive(Debug, Default)]
pub(crate) struct Journal {
    events: Mutex<Vec<Event>>,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, host: &str, call: Call) {
        self.events.lock().unwrap().push(Event {
            host: host.to_string(),
            call,
        });
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn calls(&self, host: &str) -> Vec<Call> {
        self.events()
            .into_iter()
            .filter(|e| e.host == host)
            .map(|e| e.call)
            .collect()
    }

    /// Shell commands run on `host`, in order
    pub fn commands(&self, host: &str) -> Vec<String> {
        self.events()
            .iter()
            .filter(|e| e.host == host)
            .filter_map(|e| e.command().map(str::to_string))
            .collect()
    }

    /// Index of the first event on `host` whose command contains `needle`
    pub fn first(&self, host: &str, needle: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| e.host == host && e.command().is_some_and(|c| c.contains(needle)))
    }

    /// Index of the last event on `host` whose command contains `needle`
    pub fn last(&self, host: &str, needle: &str) -> Option<usize> {
        self.events()
            .iter()
            .rposition(|e| e.host == host && e.command().is_some_and(|c| c.contains(needle)))
    }
}

enum Response {
    Always(String),
    /// Answer only while `path` exists on the fake filesystem
    WhileFile(String, String),
}

pub(crate) struct FakeRunner {
    host: String,
    journal: Arc<Journal>,
    files: Mutex<BTreeMap<String, String>>,
    responses: Mutex<Vec<(String, Response)>>,
    failures: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new(host: &str, journal: &Arc<Journal>) -> Self {
        Self {
            host: host.to_string(),
            journal: Arc::clone(journal),
            files: Mutex::new(BTreeMap::new()),
            responses: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, pattern: &str, output: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), Response::Always(output.to_string())));
    }

    pub fn respond_while_file(&self, pattern: &str, path: &str, output: &str) {
        self.responses.lock().unwrap().push((
            pattern.to_string(),
            Response::WhileFile(path.to_string(), output.to_string()),
        ));
    }

    pub fn fail_when(&self, pattern: &str) {
        self.failures.lock().unwrap().push(pattern.to_string());
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    fn check_failure(&self, command: &str) -> Result<()> {
        if let Some(p) = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|p| command.contains(p.as_str()))
        {
            anyhow::bail!("scripted failure on '{}'", p);
        }
        Ok(())
    }

    fn output_for(&self, command: &str) -> String {
        let responses = self.responses.lock().unwrap();
        for (pattern, response) in responses.iter() {
            if !command.contains(pattern.as_str()) {
                continue;
            }
            match response {
                Response::Always(out) => return out.clone(),
                Response::WhileFile(path, out) => {
                    if self.has_file(path) {
                        return out.clone();
                    }
                    return String::new();
                }
            }
        }
        String::new()
    }
}

impl Runner for FakeRunner {
    fn run(&self, command: &str) -> Result<()> {
        self.journal.record(&self.host, Call::Run(command.to_string()));
        self.check_failure(command)
    }

    fn run_out(&self, command: &str) -> Result<Vec<u8>> {
        self.journal
            .record(&self.host, Call::RunOut(command.to_string()));
        self.check_failure(command)?;
        Ok(self.output_for(command).into_bytes())
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let content = String::from_utf8_lossy(content).into_owned();
        self.journal
            .record(&self.host, Call::Write(path.to_string(), content.clone()));
        self.check_failure(path)?;
        self.files.lock().unwrap().insert(path.to_string(), content);
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        self.journal
            .record(&self.host, Call::Remove(path.to_string()));
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.has_file(path))
    }
}

/// A root-user node with no command channel
pub(crate) fn node(host: &str) -> Node {
    Node::new(
        HostInfo {
            host: host.to_string(),
            port: 22,
            user: "root".to_string(),
            password: None,
            key: None,
        },
        None,
        InstallMode::Online,
    )
}

/// A node wired to a fresh fake runner recording into `journal`
pub(crate) fn connected_node(host: &str, journal: &Arc<Journal>) -> (Arc<Node>, Arc<FakeRunner>) {
    let runner = Arc::new(FakeRunner::new(host, journal));
    let node = Arc::new(node(host));
    node.attach_runner(runner.clone());
    (node, runner)
}
