//! Admission-controlled publisher.
//!
//! One [`Publisher::publish`] call runs a cycle per configured [`HostOption`], concurrently:
//! 1. read up to `limit` completed jobs;
//! 2. read up to `limit + completed` queued/in-progress jobs (capacity about to be freed by the
//!    completed jobs is handed out in the same cycle);
//! 3. nothing observed → done;
//! 4. only in-progress jobs observed → nothing to notify or commit;
//! 5. otherwise send one batch (completed, then queued) and, once delivered, commit one
//!    transaction marking queued jobs in progress and deleting completed ones.
//!
//! A failed delivery leaves the store untouched, so the next cycle re-reads the same jobs.
//! Cycles share one cancellation token: the first failure cancels the hosts still reading or
//! sending, and that failure is the result of the whole call. After every host finished, a
//! single self-trigger is requested if any host observed work.
mod cycle;
pub use cycle::CycleReport;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ephem_model::HostOption;
use tokio::{sync::Mutex, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    bus::NotificationBus,
    error::CoreError,
    metrics::{MetricsHandle, noop_metrics},
    store::JobStore,
};
use cycle::HostCycle;

pub struct Publisher {
    hosts: Vec<HostOption>,
    store: Arc<dyn JobStore>,
    bus: Arc<dyn NotificationBus>,
    metrics: MetricsHandle,
    running: Mutex<()>,
}

impl Publisher {
    pub fn new(
        hosts: Vec<HostOption>,
        store: Arc<dyn JobStore>,
        bus: Arc<dyn NotificationBus>,
    ) -> Self {
        Self {
            hosts,
            store,
            bus,
            metrics: noop_metrics(),
            running: Mutex::new(()),
        }
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn hosts(&self) -> &[HostOption] {
        &self.hosts
    }

    /// Run one publish cycle for every host.
    ///
    /// Returns the reports of all hosts, or the first host failure. Hosts that committed before
    /// the failure stay committed. Cancelling `cancel` stops cycles that have not reached their
    /// commit and suppresses the self-trigger.
    ///
    /// Calls on the same publisher run one at a time.
    #[instrument(level = "debug", skip_all, fields(hosts = self.hosts.len()))]
    pub async fn publish(&self, cancel: &CancellationToken) -> Result<Vec<CycleReport>, CoreError> {
        let _running = self.running.lock().await;
        let group = cancel.child_token();
        let observed = Arc::new(AtomicBool::new(false));

        let mut set = JoinSet::new();
        for opt in &self.hosts {
            let host = opt.host.clone();
            let cycle = HostCycle {
                opt: opt.clone(),
                store: Arc::clone(&self.store),
                bus: Arc::clone(&self.bus),
                metrics: Arc::clone(&self.metrics),
                observed: Arc::clone(&observed),
            };
            let token = group.child_token();
            set.spawn(async move { (host, cycle.run(token).await) });
        }

        let mut reports = Vec::with_capacity(self.hosts.len());
        let mut first: Option<CoreError> = None;
        while let Some(joined) = set.join_next().await {
            let (host, res) = match joined {
                Ok(out) => out,
                Err(e) => (String::new(), Err(CoreError::Join(e.to_string()))),
            };
            match res {
                Ok(report) => {
                    info!(
                        host = %report.host,
                        admitted = report.admitted,
                        reaped = report.reaped,
                        in_progress = report.in_progress,
                        "cycle finished"
                    );
                    reports.push(report);
                }
                Err(e) => {
                    group.cancel();
                    if !matches!(e, CoreError::Canceled) {
                        self.metrics.record_cycle_error(&host);
                    }
                    first = match first {
                        None => Some(e),
                        Some(CoreError::Canceled) if !matches!(e, CoreError::Canceled) => Some(e),
                        keep => keep,
                    };
                }
            }
        }

        if observed.load(Ordering::Acquire) && !cancel.is_cancelled() {
            if let Err(e) = self.bus.self_trigger().await {
                warn!(error = %e, "self-trigger failed");
            }
        }

        match first {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusError, Message};
    use crate::store::{GetJobsInput, PutOutcome, StoreError, UpdateJobsInput};

    use async_trait::async_trait;
    use ephem_model::{Job, JobContent, JobId, JobStatus};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn job(id: JobId, host: &str, status: JobStatus) -> Job {
        Job {
            id,
            host: host.into(),
            os: "ubuntu".into(),
            status,
            content: JobContent::from_bytes(vec![id as u8]),
            created_at_ms: 0,
        }
    }

    /// Store returning fixed slices per host; `failing` hosts error after a delay.
    #[derive(Default)]
    struct ScriptedStore {
        completed: HashMap<String, Vec<Job>>,
        active: HashMap<String, Vec<Job>>,
        failing: Vec<String>,
        gets: Mutex<Vec<GetJobsInput>>,
        updates: Mutex<Vec<(String, UpdateJobsInput)>>,
    }

    impl ScriptedStore {
        fn host(mut self, host: &str, completed: Vec<Job>, active: Vec<Job>) -> Self {
            self.completed.insert(host.into(), completed);
            self.active.insert(host.into(), active);
            self
        }

        fn updates_for(&self, host: &str) -> Vec<UpdateJobsInput> {
            self.updates
                .lock()
                .unwrap()
                .iter()
                .filter(|(h, _)| h == host)
                .map(|(_, u)| u.clone())
                .collect()
        }
    }

    #[async_trait]
    impl JobStore for ScriptedStore {
        async fn get_jobs(&self, input: GetJobsInput) -> Result<Vec<Job>, StoreError> {
            self.gets.lock().unwrap().push(input.clone());
            if self.failing.contains(&input.host) {
                tokio::time::sleep(Duration::from_millis(50)).await;
                return Err(StoreError::Unavailable("timeout".into()));
            }
            let table = if input.statuses == [JobStatus::Completed] {
                &self.completed
            } else {
                &self.active
            };
            Ok(table.get(&input.host).cloned().unwrap_or_default())
        }

        async fn update_jobs(&self, input: UpdateJobsInput) -> Result<(), StoreError> {
            let host = self
                .completed
                .iter()
                .chain(self.active.iter())
                .find(|(_, jobs)| {
                    jobs.iter().any(|j| {
                        input.delete.contains(&j.id) || input.update.iter().any(|u| u.id == j.id)
                    })
                })
                .map(|(h, _)| h.clone())
                .unwrap_or_default();
            self.updates.lock().unwrap().push((host, input));
            Ok(())
        }

        async fn put_job(&self, _job: Job) -> Result<PutOutcome, StoreError> {
            Ok(PutOutcome::Inserted)
        }

        async fn set_completed(&self, _id: JobId) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingBus {
        batches: Mutex<Vec<Vec<Message>>>,
        triggers: Mutex<usize>,
        fail_send: bool,
        fail_trigger: bool,
    }

    #[async_trait]
    impl NotificationBus for RecordingBus {
        async fn send_batch(&self, messages: Vec<Message>) -> Result<(), BusError> {
            if self.fail_send {
                return Err(BusError::Transport("queue unavailable".into()));
            }
            self.batches.lock().unwrap().push(messages);
            Ok(())
        }

        async fn self_trigger(&self) -> Result<(), BusError> {
            *self.triggers.lock().unwrap() += 1;
            if self.fail_trigger {
                return Err(BusError::Transport("queue unavailable".into()));
            }
            Ok(())
        }
    }

    fn publisher(hosts: &[(&str, i32)], store: Arc<ScriptedStore>, bus: Arc<RecordingBus>) -> Publisher {
        let hosts = hosts.iter().map(|(h, l)| HostOption::new(*h, *l)).collect();
        Publisher::new(hosts, store, bus)
    }

    #[tokio::test]
    async fn inflated_limit_admits_freed_capacity() {
        let store = Arc::new(ScriptedStore::default().host(
            "vm",
            vec![job(10, "vm", JobStatus::Completed)],
            vec![
                job(1, "vm", JobStatus::InProgress),
                job(2, "vm", JobStatus::Queued),
                job(3, "vm", JobStatus::Queued),
            ],
        ));
        let bus = Arc::new(RecordingBus::default());
        let p = publisher(&[("vm", 2)], store.clone(), bus.clone());

        let reports = p.publish(&CancellationToken::new()).await.unwrap();

        let gets = store.gets.lock().unwrap().clone();
        assert_eq!(gets.len(), 2);
        assert_eq!(gets[0].statuses, vec![JobStatus::Completed]);
        assert_eq!(gets[0].limit, 2);
        assert_eq!(gets[1].statuses, JobStatus::ACTIVE.to_vec());
        assert_eq!(gets[1].limit, 3);

        let updates = store.updates_for("vm");
        assert_eq!(updates.len(), 1);
        let mut marked: Vec<_> = updates[0].update.iter().map(|u| u.id).collect();
        marked.sort_unstable();
        assert_eq!(marked, vec![2, 3]);
        assert!(updates[0].update.iter().all(|u| u.status == JobStatus::InProgress));
        assert_eq!(updates[0].delete, vec![10]);

        let batches = bus.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        let ids: Vec<_> = batches[0].iter().map(|m| m.dedup_id.as_str()).collect();
        assert_eq!(ids, vec!["10", "2", "3"]);

        assert_eq!(
            reports,
            vec![CycleReport {
                host: "vm".into(),
                admitted: 2,
                reaped: 1,
                in_progress: 1,
            }]
        );
        assert_eq!(*bus.triggers.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_host_is_a_no_op() {
        let store = Arc::new(ScriptedStore::default().host("vm", vec![], vec![]));
        let bus = Arc::new(RecordingBus::default());
        let p = publisher(&[("vm", 2)], store.clone(), bus.clone());

        p.publish(&CancellationToken::new()).await.unwrap();

        assert!(bus.batches.lock().unwrap().is_empty());
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(*bus.triggers.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn in_progress_only_still_self_triggers() {
        let store = Arc::new(ScriptedStore::default().host(
            "vm",
            vec![],
            vec![job(1, "vm", JobStatus::InProgress)],
        ));
        let bus = Arc::new(RecordingBus::default());
        let p = publisher(&[("vm", 2)], store.clone(), bus.clone());

        let reports = p.publish(&CancellationToken::new()).await.unwrap();

        assert!(bus.batches.lock().unwrap().is_empty());
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(*bus.triggers.lock().unwrap(), 1);
        assert_eq!(reports[0].in_progress, 1);
        assert_eq!(reports[0].admitted, 0);
    }

    #[tokio::test]
    async fn failed_delivery_skips_commit_but_still_triggers() {
        let store = Arc::new(ScriptedStore::default().host(
            "vm",
            vec![],
            vec![job(1, "vm", JobStatus::Queued)],
        ));
        let bus = Arc::new(RecordingBus {
            fail_send: true,
            ..Default::default()
        });
        let p = publisher(&[("vm", 2)], store.clone(), bus.clone());

        let err = p.publish(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, CoreError::Bus(BusError::Transport(_))));
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(*bus.triggers.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn one_host_failure_does_not_undo_another() {
        let mut store = ScriptedStore::default().host(
            "vm",
            vec![],
            vec![job(1, "vm", JobStatus::Queued)],
        );
        store.failing.push("pod".into());
        let store = Arc::new(store);
        let bus = Arc::new(RecordingBus::default());
        let p = publisher(&[("vm", 2), ("pod", 2)], store.clone(), bus.clone());

        let err = p.publish(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, CoreError::Store(StoreError::Unavailable(_))));
        assert_eq!(store.updates_for("vm").len(), 1);
        assert_eq!(*bus.triggers.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn self_trigger_failure_is_not_escalated() {
        let store = Arc::new(ScriptedStore::default().host(
            "vm",
            vec![job(1, "vm", JobStatus::Completed)],
            vec![],
        ));
        let bus = Arc::new(RecordingBus {
            fail_trigger: true,
            ..Default::default()
        });
        let p = publisher(&[("vm", 1)], store.clone(), bus.clone());

        let reports = p.publish(&CancellationToken::new()).await.unwrap();
        assert_eq!(reports[0].reaped, 1);
        assert_eq!(*bus.triggers.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn cancelled_publish_does_nothing() {
        let store = Arc::new(ScriptedStore::default().host(
            "vm",
            vec![],
            vec![job(1, "vm", JobStatus::Queued)],
        ));
        let bus = Arc::new(RecordingBus::default());
        let p = publisher(&[("vm", 2)], store.clone(), bus.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = p.publish(&cancel).await.unwrap_err();

        assert!(matches!(err, CoreError::Canceled));
        assert!(bus.batches.lock().unwrap().is_empty());
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(*bus.triggers.lock().unwrap(), 0);
    }
}
