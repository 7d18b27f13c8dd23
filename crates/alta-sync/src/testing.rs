//! Scriptable [`RemoteStore`] for tests.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use alta_core::StoredSubmission;

use crate::error::ReplicationError;
use crate::remote::RemoteStore;

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(ReplicationError),
    Hang(Duration),
}

/// Remote store whose next outcome is set by the test.
#[derive(Debug)]
pub struct ScriptedRemote {
    behavior: Mutex<Behavior>,
    next_id: AtomicI64,
    calls: AtomicUsize,
    replicated: Mutex<Vec<StoredSubmission>>,
}

impl ScriptedRemote {
    pub fn new(behavior: Behavior) -> Self {
        ScriptedRemote {
            behavior: Mutex::new(behavior),
            next_id: AtomicI64::new(1000),
            calls: AtomicUsize::new(0),
            replicated: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self::new(Behavior::Fail(ReplicationError::Unreachable(
            "connection refused".into(),
        )))
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn replicated(&self) -> Vec<StoredSubmission> {
        self.replicated.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for ScriptedRemote {
    async fn replicate(&self, submission: &StoredSubmission) -> Result<i64, ReplicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();

        match behavior {
            Behavior::Succeed => {
                self.replicated.lock().unwrap().push(submission.clone());
                Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
            }
            Behavior::Fail(err) => Err(err),
            Behavior::Hang(d) => {
                tokio::time::sleep(d).await;
                Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
            }
        }
    }
}
