//! Bounded fan-out of blocking per-node tasks
//!
//! Every task runs to completion even when a sibling fails: there is no
//! cancellation of remote commands already in flight. The error returned is
//! the first one to *complete*, so which node it names can differ from run to
//! run when several fail.
//!
//! A `Fanout` owns one permit pool. Runs on the same `Fanout`, or on its
//! clones, draw from that pool even when they overlap.

use crate::cluster::{ClusterNodes, Node};
use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Fanout {
    limit: usize,
    permits: Arc<Semaphore>,
}

impl Fanout {
    /// `limit` is the most tasks in flight at once; zero is treated as one
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            permits: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `task` once per node, wait for all of them, return the first error
    pub async fn run<F>(&self, nodes: &[Arc<Node>], task: F) -> Result<()>
    where
        F: Fn(&Node) -> Result<()> + Send + Sync + 'static,
    {
        let task = Arc::new(task);
        let mut set = JoinSet::new();

        for node in nodes {
            let node = Arc::clone(node);
            let task = Arc::clone(&task);
            let permits = Arc::clone(&self.permits);
            set.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Task(e.to_string()))?;
                tokio::task::spawn_blocking(move || task(node.as_ref()))
                    .await
                    .map_err(|e| Error::Task(e.to_string()))?
            });
        }

        let mut first: Option<Error> = None;
        while let Some(joined) = set.join_next().await {
            let outcome = joined
                .map_err(|e| Error::Task(e.to_string()))
                .and_then(|r| r);
            if let Err(err) = outcome {
                match first {
                    None => first = Some(err),
                    Some(_) => warn!(error = %err, "additional node task failed"),
                }
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run `task` on a single node and hand back its result
    pub async fn run_one<F, T>(&self, node: &Arc<Node>, task: F) -> Result<T>
    where
        F: FnOnce(&Node) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let node = Arc::clone(node);
        tokio::task::spawn_blocking(move || task(node.as_ref()))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    pub async fn on_all<F>(&self, nodes: &ClusterNodes, task: F) -> Result<()>
    where
        F: Fn(&Node) -> Result<()> + Send + Sync + 'static,
    {
        self.run(&nodes.all(), task).await
    }

    pub async fn on_masters<F>(&self, nodes: &ClusterNodes, task: F) -> Result<()>
    where
        F: Fn(&Node) -> Result<()> + Send + Sync + 'static,
    {
        self.run(&nodes.masters, task).await
    }

    pub async fn on_workers<F>(&self, nodes: &ClusterNodes, task: F) -> Result<()>
    where
        F: Fn(&Node) -> Result<()> + Send + Sync + 'static,
    {
        self.run(&nodes.workers, task).await
    }

    /// Fails with `NoMasters` before doing anything if there is no master
    pub async fn on_first_master<F, T>(&self, nodes: &ClusterNodes, task: F) -> Result<T>
    where
        F: FnOnce(&Node) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let first = nodes.first_master()?;
        self.run_one(first, task).await
    }

    /// No-op with one master or none
    pub async fn on_other_masters<F>(&self, nodes: &ClusterNodes, task: F) -> Result<()>
    where
        F: Fn(&Node) -> Result<()> + Send + Sync + 'static,
    {
        let others = nodes.other_masters();
        if others.is_empty() {
            return Ok(());
        }
        self.run(others, task).await
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new(crate::config::constants::DEFAULT_PARALLELISM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::node;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn nodes(hosts: &[&str]) -> Vec<Arc<Node>> {
        hosts.iter().map(|h| Arc::new(node(h))).collect()
    }

    #[tokio::test]
    async fn succeeds_when_every_task_succeeds() {
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        Fanout::new(4)
            .run(&nodes(&["a", "b", "c", "d", "e"]), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn zero_limit_still_makes_progress() {
        assert_eq!(Fanout::new(0).limit(), 1);
        assert_eq!(Fanout::default().limit(), 20);
    }

    #[tokio::test]
    async fn empty_node_list_is_a_no_op() {
        Fanout::default()
            .run(&[], |_| -> Result<()> { panic!("no node to run on") })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_siblings() {
        let finished = Arc::new(Mutex::new(HashSet::new()));
        let seen = Arc::clone(&finished);
        let err = Fanout::new(8)
            .run(&nodes(&["a", "b", "k", "c", "d"]), move |node| {
                if node.addr() == "k" {
                    return Err(Error::config("boom on k"));
                }
                // Siblings are still working when k fails
                std::thread::sleep(Duration::from_millis(50));
                seen.lock().unwrap().insert(node.addr().to_string());
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("boom on k"));
        let finished = finished.lock().unwrap();
        assert_eq!(finished.len(), 4);
        assert!(!finished.contains("k"));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_the_limit() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (cur, pk) = (Arc::clone(&current), Arc::clone(&peak));
        let hosts: Vec<String> = (0..12).map(|i| format!("n{}", i)).collect();
        let hosts: Vec<&str> = hosts.iter().map(String::as_str).collect();

        Fanout::new(3)
            .run(&nodes(&hosts), move |_| {
                let now = cur.fetch_add(1, Ordering::SeqCst) + 1;
                pk.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(20));
                cur.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {}", peak);
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn overlapping_runs_share_the_limit() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        fn track(
            current: Arc<AtomicUsize>,
            peak: Arc<AtomicUsize>,
        ) -> impl Fn(&Node) -> Result<()> + Send + Sync + 'static {
            move |_| {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(30));
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let fanout = Fanout::new(2);
        let other = fanout.clone();
        let (left, right) = (nodes(&["a", "b", "c"]), nodes(&["x", "y", "z"]));
        let (l, r) = tokio::join!(
            fanout.run(&left, track(Arc::clone(&current), Arc::clone(&peak))),
            other.run(&right, track(Arc::clone(&current), Arc::clone(&peak)))
        );
        l.unwrap();
        r.unwrap();

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak concurrency was {}", peak);
    }

    #[tokio::test]
    async fn first_master_requires_a_master() {
        let empty = ClusterNodes::default();
        let err = Fanout::default()
            .on_first_master(&empty, |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoMasters));
    }

    #[tokio::test]
    async fn first_master_returns_the_task_value() {
        let cluster = ClusterNodes {
            masters: nodes(&["m0", "m1"]),
            workers: vec![],
        };
        let addr = Fanout::default()
            .on_first_master(&cluster, |node| Ok(node.addr().to_string()))
            .await
            .unwrap();
        assert_eq!(addr, "m0");
    }

    #[tokio::test]
    async fn other_masters_skip_single_master_clusters() {
        let cluster = ClusterNodes {
            masters: nodes(&["m0"]),
            workers: nodes(&["w0"]),
        };
        Fanout::default()
            .on_other_masters(&cluster, |_| -> Result<()> { panic!("must not run") })
            .await
            .unwrap();

        let cluster = ClusterNodes {
            masters: nodes(&["m0", "m1", "m2"]),
            workers: vec![],
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        Fanout::default()
            .on_other_masters(&cluster, move |node| {
                s.lock().unwrap().push(node.addr().to_string());
                Ok(())
            })
            .await
            .unwrap();
        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, ["m1", "m2"]);
    }

    #[tokio::test]
    async fn masters_and_workers_variants_pick_their_group() {
        let cluster = ClusterNodes {
            masters: nodes(&["m0", "m1"]),
            workers: nodes(&["w0", "w1", "w2"]),
        };
        for (expected, which) in [(2, 0), (3, 1), (5, 2)] {
            let count = Arc::new(AtomicUsize::new(0));
            let c = Arc::clone(&count);
            let task = move |_: &Node| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            };
            let fanout = Fanout::default();
            match which {
                0 => fanout.on_masters(&cluster, task).await.unwrap(),
                1 => fanout.on_workers(&cluster, task).await.unwrap(),
                _ => fanout.on_all(&cluster, task).await.unwrap(),
            }
            assert_eq!(count.load(Ordering::SeqCst), expected);
        }
    }
}
