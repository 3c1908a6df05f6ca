//! The job-queue seam used by long-running analyses.
//!
//! Nothing here talks to a broker. [`JobQueue`] describes what an
//! implementation backed by one must provide, and adds the idempotent
//! enqueue and best-effort delete policies on top.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The registry a job is tracked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Finished,
}

impl JobState {
    /// Removal order used by [`JobQueue::delete_job`].
    pub const ALL: [JobState; 3] = [JobState::Finished, JobState::Pending, JobState::Running];
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Finished => "finished",
        })
    }
}

/// A queue of named jobs with pending, running and finished registries.
///
/// Implementors provide registry listing plus raw push and remove; the
/// provided methods build the queue policy on top.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use parking_lot::Mutex;
/// use runstore::Result;
/// use runstore::queue::{JobQueue, JobState};
///
/// #[derive(Default)]
/// struct Local(Mutex<Vec<(String, JobState)>>);
///
/// impl JobQueue for Local {
///     type Job = ();
///
///     fn ready(&self) -> bool {
///         true
///     }
///
///     fn job_ids(&self, state: JobState) -> Vec<String> {
///         self.0.lock().iter().filter(|(_, s)| *s == state).map(|(id, _)| id.clone()).collect()
///     }
///
///     fn push(
///         &self,
///         job_id: &str,
///         _job: (),
///         _meta: BTreeMap<String, serde_json::Value>,
///     ) -> Result<()> {
///         self.0.lock().push((job_id.to_string(), JobState::Pending));
///         Ok(())
///     }
///
///     fn remove(&self, job_id: &str, state: JobState) -> Result<()> {
///         self.0.lock().retain(|(id, s)| !(id == job_id && *s == state));
///         Ok(())
///     }
/// }
///
/// let queue = Local::default();
/// assert!(queue.enqueue("importance-run1", (), BTreeMap::new()).unwrap());
/// assert!(!queue.enqueue("importance-run1", (), BTreeMap::new()).unwrap());
/// assert!(queue.is_pending("importance-run1"));
///
/// queue.delete_job("importance-run1");
/// assert!(!queue.is_processed("importance-run1"));
/// ```
pub trait JobQueue {
    /// The work a job carries: a function and its arguments in whatever form the backend accepts.
    type Job;

    /// Whether at least one worker is attached.
    fn ready(&self) -> bool;

    /// Ids of the jobs currently in `state`.
    fn job_ids(&self, state: JobState) -> Vec<String>;

    /// Put a job into the pending registry unconditionally.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn push(&self, job_id: &str, job: Self::Job, meta: BTreeMap<String, Value>) -> Result<()>;

    /// Remove a job from one registry.
    ///
    /// # Errors
    ///
    /// Backend-specific, including a job that is not in `state`.
    fn remove(&self, job_id: &str, state: JobState) -> Result<()>;

    fn is_pending(&self, job_id: &str) -> bool {
        self.job_ids(JobState::Pending).iter().any(|id| id == job_id)
    }

    fn is_running(&self, job_id: &str) -> bool {
        self.job_ids(JobState::Running).iter().any(|id| id == job_id)
    }

    fn is_finished(&self, job_id: &str) -> bool {
        self.job_ids(JobState::Finished).iter().any(|id| id == job_id)
    }

    /// Whether the job is known in any registry.
    fn is_processed(&self, job_id: &str) -> bool {
        self.is_running(job_id) || self.is_pending(job_id) || self.is_finished(job_id)
    }

    /// Push a job unless `job_id` is already processed.
    ///
    /// Returns whether the job was pushed.
    ///
    /// # Errors
    ///
    /// Errors of [`push`](Self::push).
    fn enqueue(&self, job_id: &str, job: Self::Job, meta: BTreeMap<String, Value>) -> Result<bool> {
        if self.is_processed(job_id) {
            trace_debug!(job_id, "job not added, already processed");
            return Ok(false);
        }
        self.push(job_id, job, meta)?;
        Ok(true)
    }

    /// Remove a job from every registry, ignoring failures.
    fn delete_job(&self, job_id: &str) {
        for state in JobState::ALL {
            if self.remove(job_id, state).is_err() {
                trace_debug!(job_id, %state, "job not removed");
            }
        }
    }
}
