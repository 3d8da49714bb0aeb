//! Background certificate delivery.
//!
//! A send request becomes a [`DeliveryJob`] on a bounded channel. One worker task
//! drains the channel, attaches the stored artifact, hands it to the [`Mailer`]
//! and appends exactly one row to the [`ReportLog`] per job. Callers get a job id
//! back immediately and can poll [`DeliveryQueue::status`] for the outcome.
//! Only the most recent finished jobs are remembered; older outcomes remain in
//! the [`ReportLog`].

use parking_lot::RwLock;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    mailer::{certificate_mail, Mailer},
    models::{DeliveryStatus, Outcome, Student},
    reports::ReportLog,
    storage::ArtifactStore,
};

#[derive(Debug, Clone)]
pub struct DeliveryJob {
    pub job_id: Uuid,
    pub student: Student,
    /// Artifact handle in the store.
    pub artifact: String,
}

/// Job statuses. Pending jobs are always kept; finished ones are evicted oldest
/// first once more than `retain` of them are held.
#[derive(Debug)]
struct StatusBook {
    entries: HashMap<Uuid, DeliveryStatus>,
    finished: VecDeque<Uuid>,
    retain: usize,
}

impl StatusBook {
    fn new(retain: usize) -> Self { Self { entries: HashMap::new(), finished: VecDeque::new(), retain } }

    fn set(&mut self, job_id: Uuid, status: DeliveryStatus) {
        let terminal = status.is_terminal();
        if self.entries.insert(job_id, status).is_some_and(|old| old.is_terminal()) || !terminal {
            return;
        }
        self.finished.push_back(job_id);
        while self.finished.len() > self.retain {
            if let Some(old) = self.finished.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    fn len(&self) -> usize { self.entries.len() }
}

#[derive(Clone)]
pub struct DeliveryQueue {
    statuses: Arc<RwLock<StatusBook>>,
    tx: mpsc::Sender<DeliveryJob>,
}

impl DeliveryQueue {
    /// Creates the queue and spawns its worker on the current runtime. At most `retain`
    /// finished job statuses are kept for polling.
    pub fn start(
        capacity: usize,
        retain: usize,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn ArtifactStore>,
        reports: Arc<ReportLog>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Self { statuses: Arc::new(RwLock::new(StatusBook::new(retain))), tx };
        let worker = DeliveryWorker { statuses: queue.statuses.clone(), mailer, store, reports };
        tokio::spawn(worker.run(rx));
        queue
    }

    pub async fn enqueue(&self, student: Student, artifact: String) -> Result<Uuid, ServiceError> {
        let job_id = Uuid::new_v4();
        self.statuses.write().set(job_id, DeliveryStatus::Pending);
        let job = DeliveryJob { job_id, student, artifact };
        if self.tx.send(job).await.is_err() {
            self.statuses.write().entries.remove(&job_id);
            return Err(ServiceError::QueueClosed);
        }
        Ok(job_id)
    }

    pub fn status(&self, job_id: Uuid) -> Option<DeliveryStatus> { self.statuses.read().entries.get(&job_id).cloned() }

    /// Number of job statuses currently held.
    pub fn tracked(&self) -> usize { self.statuses.read().len() }
}

struct DeliveryWorker {
    statuses: Arc<RwLock<StatusBook>>,
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn ArtifactStore>,
    reports: Arc<ReportLog>,
}

impl DeliveryWorker {
    async fn run(self, mut rx: mpsc::Receiver<DeliveryJob>) {
        while let Some(job) = rx.recv().await {
            self.process(job).await;
        }
        info!("Delivery queue closed, worker exiting");
    }

    async fn process(&self, job: DeliveryJob) {
        let student_id = job.student.id;
        let result = self.attempt(&job).await;
        let status = match &result {
            Ok(()) => {
                info!("📧 Certificate {} sent to {}", job.student.certificate_id, job.student.email);
                self.reports.record(student_id, Outcome::Success, None);
                DeliveryStatus::Success
            }
            Err(reason) => {
                error!("❌ Certificate {} delivery failed: {}", job.student.certificate_id, reason);
                self.reports.record(student_id, Outcome::Failed, Some(reason.clone()));
                DeliveryStatus::Failed(reason.clone())
            }
        };
        self.statuses.write().set(job.job_id, status);
    }

    async fn attempt(&self, job: &DeliveryJob) -> Result<(), String> {
        let pdf = self
            .store
            .open(&job.artifact)
            .map_err(|e| format!("attachment missing: {}", e))?;
        let mail = certificate_mail(&job.student, pdf.to_vec());
        self.mailer.send(mail).await.map_err(|e| e.to_string())
    }
}
