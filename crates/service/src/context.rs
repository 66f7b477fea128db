use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use common::path::UserName;

/// Per-request identity and limits, passed explicitly to every operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    requester: UserName,
    deadline: Option<Instant>,
    correlation_id: Uuid,
}

impl RequestContext {
    pub fn new(requester: UserName) -> Self {
        Self {
            requester,
            deadline: None,
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = id;
        self
    }

    pub fn requester(&self) -> &UserName {
        &self.requester
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
