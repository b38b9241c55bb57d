#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Request-level orchestration over the session store.
//!
//! Each public method is one stateless external action: validate the
//! input, load the current snapshot, run the session transition, and
//! persist the full replacement document. Writes are optimistic,
//! compare-and-swapped on the document revision with a short retry loop,
//! which closes the lost-update window between concurrent movers,
//! spectators, and tick drivers without changing the action surface.
//! Read paths degrade to synthetic waiting snapshots instead of
//! propagating store failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use maze_chase_core::{
    Action, CounterField, Difficulty, Event, MoveDelta, PutMode, SabotageError, SabotageKind,
    SessionDocument, SessionStore, StateView, StoreError, ValidationError, WaitingState,
};
use maze_chase_session::{apply, started_session, ActionContext};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Conflicting optimistic writes are retried this many times per action.
const WRITE_ATTEMPTS: u32 = 3;

/// Epoch-millisecond clock consumed by the orchestrator.
pub trait Clock {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Failures surfaced by the orchestration layer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Malformed input rejected before any session load.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The store rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one successfully persisted action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionOutcome {
    /// The snapshot after the transition.
    pub document: SessionDocument,
    /// Events emitted by the transition, in order.
    pub events: Vec<Event>,
}

/// Result of a sabotage request; a refused sabotage is feedback for the
/// spectator, never an error.
#[derive(Clone, Debug, PartialEq)]
pub enum SabotageOutcome {
    /// The sabotage passed its preconditions and was persisted.
    Applied(ActionOutcome),
    /// The sabotage was refused; nothing about the runner changed.
    Rejected {
        /// The requested effect.
        kind: SabotageKind,
        /// Why the engine refused it.
        reason: SabotageError,
    },
}

/// Stateless session orchestrator over an abstract document store.
#[derive(Debug)]
pub struct SessionService<S, C> {
    store: S,
    clock: C,
    base_seed: u64,
    seed_nonce: AtomicU64,
}

impl<S: SessionStore, C: Clock> SessionService<S, C> {
    /// Creates a service over the given store and clock.
    ///
    /// `base_seed` feeds the per-session seed derivation; two services with
    /// different base seeds generate different mazes for the same room.
    #[must_use]
    pub fn new(store: S, clock: C, base_seed: u64) -> Self {
        Self {
            store,
            clock,
            base_seed,
            seed_nonce: AtomicU64::new(0),
        }
    }

    /// Shared access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts (or restarts) a session with a fresh maze and entities.
    pub fn start(
        &self,
        session_id: &str,
        difficulty: Difficulty,
    ) -> Result<ActionOutcome, ServiceError> {
        validate_session_id(session_id)?;

        let outcome = match self.mutate(session_id, Action::Start { difficulty }) {
            Ok(outcome) => outcome,
            Err(ServiceError::Store(StoreError::NotFound)) => {
                let ctx = self.action_context(session_id);
                let mut events = Vec::new();
                let document = started_session(difficulty, ctx, &mut events);
                self.store
                    .put(session_id, &document, PutMode::MergeExisting)?;
                ActionOutcome { document, events }
            }
            Err(error) => return Err(error),
        };

        info!(
            session_id,
            difficulty = difficulty.as_str(),
            enemies = outcome.document.enemies.len(),
            "session started"
        );
        Ok(outcome)
    }

    /// Attempts to move the runner by one validated step.
    pub fn move_player(
        &self,
        session_id: &str,
        dx: i32,
        dy: i32,
    ) -> Result<ActionOutcome, ServiceError> {
        validate_session_id(session_id)?;
        let delta = MoveDelta::try_new(dx, dy)?;

        let outcome = self.mutate(session_id, Action::Move { delta })?;
        debug!(
            session_id,
            x = outcome.document.player.x,
            y = outcome.document.player.y,
            "move processed"
        );
        Ok(outcome)
    }

    /// Advances enemies and the countdown one externally driven tick.
    pub fn tick(&self, session_id: &str) -> Result<ActionOutcome, ServiceError> {
        validate_session_id(session_id)?;
        self.mutate(session_id, Action::Tick)
    }

    /// Applies a sabotage on behalf of a spectator.
    pub fn sabotage(
        &self,
        session_id: &str,
        kind: SabotageKind,
    ) -> Result<SabotageOutcome, ServiceError> {
        validate_session_id(session_id)?;

        let outcome = self.mutate(session_id, Action::Sabotage { kind })?;
        let rejection = outcome.events.iter().find_map(|event| match event {
            Event::SabotageRejected { kind, reason } => Some((*kind, *reason)),
            _ => None,
        });

        match rejection {
            Some((kind, reason)) => {
                info!(session_id, kind = kind.as_str(), %reason, "sabotage rejected");
                Ok(SabotageOutcome::Rejected { kind, reason })
            }
            None => {
                info!(session_id, kind = kind.as_str(), "sabotage applied");
                Ok(SabotageOutcome::Applied(outcome))
            }
        }
    }

    /// Reads the current snapshot, folding in elapsed time and optionally
    /// counting a new spectator.
    ///
    /// Missing sessions and unreachable stores yield synthetic waiting
    /// snapshots; the read path never fails on either.
    pub fn state(
        &self,
        session_id: &str,
        is_new_viewer: bool,
    ) -> Result<StateView, ServiceError> {
        validate_session_id(session_id)?;

        let mut attempt = 0;
        let mut document = loop {
            let mut document = match self.store.get(session_id) {
                Ok(document) => document,
                Err(StoreError::NotFound) => {
                    debug!(session_id, "state read before start");
                    return Ok(StateView::Waiting(WaitingState::uninitialized()));
                }
                Err(StoreError::Unavailable(reason)) => {
                    warn!(session_id, %reason, "store unavailable, degrading state read");
                    return Ok(StateView::Waiting(WaitingState::unavailable()));
                }
                Err(error) => return Err(error.into()),
            };

            let loaded_revision = document.revision;
            let mut events = Vec::new();
            apply(
                &mut document,
                Action::StateRead,
                self.action_context(session_id),
                &mut events,
            );

            match self.store.put(
                session_id,
                &document,
                PutMode::ReplaceIfRevision(loaded_revision),
            ) {
                Ok(()) => break document,
                Err(StoreError::Conflict { .. }) if attempt + 1 < WRITE_ATTEMPTS => {
                    attempt += 1;
                }
                Err(StoreError::Conflict { .. }) | Err(StoreError::Unavailable(_)) => {
                    // Another writer owns the clock refresh; the computed
                    // snapshot is still the freshest view we have.
                    break document;
                }
                Err(error) => return Err(error.into()),
            }
        };

        if is_new_viewer {
            match self.store.increment(session_id, CounterField::Viewers, 1) {
                Ok(count) => document.viewers = count,
                Err(error) => {
                    warn!(session_id, %error, "viewer increment failed");
                }
            }
        }

        Ok(StateView::Session(document))
    }

    /// Registers a spectator joining the session.
    pub fn join_viewer(&self, session_id: &str) -> Result<u32, ServiceError> {
        validate_session_id(session_id)?;
        let count = self.store.increment(session_id, CounterField::Viewers, 1)?;
        debug!(session_id, viewers = count, "viewer joined");
        Ok(count)
    }

    /// Registers a spectator leaving the session; the counter never drops
    /// below zero however often leave is retried.
    pub fn leave_viewer(&self, session_id: &str) -> Result<u32, ServiceError> {
        validate_session_id(session_id)?;
        let count = self
            .store
            .increment(session_id, CounterField::Viewers, -1)?;
        debug!(session_id, viewers = count, "viewer left");
        Ok(count)
    }

    /// Load, transform, and conditionally persist one action.
    fn mutate(&self, session_id: &str, action: Action) -> Result<ActionOutcome, ServiceError> {
        let mut attempt = 0;
        loop {
            let mut document = self.store.get(session_id)?;
            let loaded_revision = document.revision;

            let mut events = Vec::new();
            apply(
                &mut document,
                action,
                self.action_context(session_id),
                &mut events,
            );

            match self.store.put(
                session_id,
                &document,
                PutMode::ReplaceIfRevision(loaded_revision),
            ) {
                Ok(()) => return Ok(ActionOutcome { document, events }),
                Err(StoreError::Conflict { expected, found })
                    if attempt + 1 < WRITE_ATTEMPTS =>
                {
                    debug!(
                        session_id,
                        expected, found, attempt, "optimistic write conflict, retrying"
                    );
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Clock and entropy inputs for one transition.
    fn action_context(&self, session_id: &str) -> ActionContext {
        let now_ms = self.clock.now_ms();
        let nonce = self.seed_nonce.fetch_add(1, Ordering::Relaxed);
        ActionContext::new(now_ms, derive_session_seed(self.base_seed, session_id, now_ms, nonce))
    }
}

fn validate_session_id(session_id: &str) -> Result<(), ValidationError> {
    if session_id.trim().is_empty() {
        return Err(ValidationError::EmptySessionId);
    }
    Ok(())
}

fn derive_session_seed(base_seed: u64, session_id: &str, now_ms: u64, nonce: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(session_id.as_bytes());
    hasher.update(now_ms.to_le_bytes());
    hasher.update(nonce.to_le_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}
