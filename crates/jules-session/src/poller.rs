//! Background task that surfaces new activities as agent messages.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use jules_client::JulesClient;
use jules_core::{Activity, ActivityId, ChatMessage, ClientError, SessionId};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{cursor, feeds::Feeds};

/// Lifecycle of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Waiting for the next cycle.
    Idle,
    /// Fetching and reconciling.
    Polling,
    /// Cancelled or failed; never restarts.
    Stopped,
}

/// Why a poller task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    Cancelled,
    Failed,
    /// The task panicked or was aborted by the runtime.
    Panicked,
}

struct Shared {
    cursor: Option<ActivityId>,
    state: PollerState,
}

/// Emission gate.
///
/// Every message push and cursor move happens under this lock after
/// re-checking the token, and [`PollerHandle::stop`] cancels under it too, so
/// nothing is emitted once `stop` has returned.
type Gate = Arc<Mutex<Shared>>;

fn lock(gate: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Polls one session's activity list on a fixed interval.
pub struct ActivityPoller {
    session_id: SessionId,
    client: JulesClient,
    feeds: Feeds,
    interval: Duration,
}

impl ActivityPoller {
    #[must_use]
    pub const fn new(
        session_id: SessionId,
        client: JulesClient,
        feeds: Feeds,
        interval: Duration,
    ) -> Self {
        Self {
            session_id,
            client,
            feeds,
            interval,
        }
    }

    /// Start polling on the current tokio runtime with an empty cursor.
    #[must_use]
    pub fn spawn(self) -> PollerHandle {
        let token = CancellationToken::new();
        let gate: Gate = Arc::new(Mutex::new(Shared {
            cursor: None,
            state: PollerState::Idle,
        }));
        let session_id = self.session_id.clone();

        tracing::info!(session_id = %session_id, interval = ?self.interval, "activity poller started");
        let task = tokio::spawn(self.run(token.clone(), Arc::clone(&gate)));

        PollerHandle {
            session_id,
            token,
            gate,
            task: Some(task),
        }
    }

    async fn run(self, token: CancellationToken, gate: Gate) -> PollerExit {
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => return PollerExit::Cancelled,
                () = tokio::time::sleep(self.interval) => {}
            }

            if !set_state(&gate, &token, PollerState::Polling) {
                return PollerExit::Cancelled;
            }

            let fetched = tokio::select! {
                biased;
                () = token.cancelled() => return PollerExit::Cancelled,
                result = self.client.list_all_activities(&self.session_id) => result,
            };

            match fetched {
                Ok(activities) => {
                    let Some(emitted) = self.reconcile(&gate, &token, &activities) else {
                        return PollerExit::Cancelled;
                    };
                    tracing::debug!(
                        session_id = %self.session_id,
                        fetched = activities.len(),
                        emitted,
                        "poll cycle complete"
                    );
                    if !set_state(&gate, &token, PollerState::Idle) {
                        return PollerExit::Cancelled;
                    }
                }
                Err(err) => {
                    self.fail(&gate, &token, &err);
                    return PollerExit::Failed;
                }
            }
        }
    }

    /// Emit one agent message per unseen activity, in server order.
    ///
    /// Returns the number emitted, or `None` if cancelled part way.
    fn reconcile(
        &self,
        gate: &Mutex<Shared>,
        token: &CancellationToken,
        activities: &[Activity],
    ) -> Option<usize> {
        let cursor = lock(gate).cursor.clone();
        if cursor::is_stale(activities, cursor.as_deref()) {
            tracing::warn!(
                session_id = %self.session_id,
                cursor = ?cursor,
                "last seen activity missing from fetched list; waiting for new activity"
            );
        }

        let fresh = cursor::unseen(activities, cursor.as_deref());
        for activity in fresh {
            let mut shared = lock(gate);
            if token.is_cancelled() {
                return None;
            }
            self.feeds.push_message(ChatMessage::from_activity(activity));
            shared.cursor = Some(activity.id.clone());
        }
        Some(fresh.len())
    }

    fn fail(&self, gate: &Mutex<Shared>, token: &CancellationToken, err: &ClientError) {
        let mut shared = lock(gate);
        if token.is_cancelled() {
            return;
        }
        shared.state = PollerState::Stopped;
        self.feeds
            .report_error(format!("Error polling activities: {err}"));
    }
}

/// Move to `state` unless the poller has been stopped.
fn set_state(gate: &Mutex<Shared>, token: &CancellationToken, state: PollerState) -> bool {
    let mut shared = lock(gate);
    if token.is_cancelled() {
        return false;
    }
    shared.state = state;
    true
}

/// Owner's handle on a running [`ActivityPoller`].
///
/// Dropping the handle stops the poller.
pub struct PollerHandle {
    session_id: SessionId,
    token: CancellationToken,
    gate: Gate,
    task: Option<JoinHandle<PollerExit>>,
}

impl std::fmt::Debug for PollerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerHandle")
            .field("session_id", &self.session_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PollerHandle {
    /// Session this poller is bound to.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Id of the last activity turned into a message.
    #[must_use]
    pub fn cursor(&self) -> Option<ActivityId> {
        lock(&self.gate).cursor.clone()
    }

    #[must_use]
    pub fn state(&self) -> PollerState {
        lock(&self.gate).state
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state() == PollerState::Stopped
    }

    /// Stop the poller. Idempotent.
    ///
    /// Once this returns the poller emits no more messages, moves its cursor
    /// no further and issues no new requests.
    pub fn stop(&self) {
        let mut shared = lock(&self.gate);
        if !self.token.is_cancelled() {
            tracing::info!(session_id = %self.session_id, "activity poller stopped");
        }
        self.token.cancel();
        shared.state = PollerState::Stopped;
    }

    /// Wait for the task to finish.
    pub async fn join(mut self) -> PollerExit {
        let Some(task) = self.task.take() else {
            return PollerExit::Cancelled;
        };
        match task.await {
            Ok(exit) => exit,
            Err(err) => {
                tracing::error!(session_id = %self.session_id, error = %err, "activity poller task did not finish cleanly");
                PollerExit::Panicked
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.stop();
        }
    }
}
