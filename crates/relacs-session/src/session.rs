use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use relacs_repro::Options;

use crate::error::{SessionError, SessionResult};

/// A reentrant-locked `Options` tree, for metadata/stimulus-data/settings
/// dictionaries a RePro may need to read-modify-write recursively from
/// the same thread (spec.md §4.8/§5: "lockMetaData" etc. are documented
/// as recursive; `std::sync::Mutex` is not, so `parking_lot::ReentrantMutex`
/// stands in, same as `AcquisitionEngine`'s use of `parking_lot` for its
/// own long-lived state).
#[derive(Clone)]
pub struct LockedOptions(Arc<ReentrantMutex<RefCell<Options>>>);

impl LockedOptions {
    pub fn new() -> Self {
        Self(Arc::new(ReentrantMutex::new(RefCell::new(Options::new()))))
    }

    pub fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<Options>> {
        self.0.lock()
    }
}

impl Default for LockedOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether [`Session::start_the_session`] has been called without a
/// matching [`Session::stop_the_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// Session-scoped metadata/stimulus-data/settings dictionaries and the
/// start/stop lifecycle around them (spec.md §4.8). Macro StartSession/
/// StopSession dispatch and RePros' `sessionStarted` hooks are the host's
/// responsibility — this type only tracks the state transition and the
/// per-session RePro run count those hooks key off of.
pub struct Session {
    metadata: LockedOptions,
    stimulus_data: LockedOptions,
    relacs_settings: LockedOptions,
    state: SessionState,
    repro_count: AtomicU32,
}

impl Session {
    pub fn new() -> Self {
        Self {
            metadata: LockedOptions::new(),
            stimulus_data: LockedOptions::new(),
            relacs_settings: LockedOptions::new(),
            state: SessionState::Idle,
            repro_count: AtomicU32::new(0),
        }
    }

    pub fn lock_meta_data(&self) -> ReentrantMutexGuard<'_, RefCell<Options>> {
        self.metadata.lock()
    }

    pub fn lock_stimulus_data(&self) -> ReentrantMutexGuard<'_, RefCell<Options>> {
        self.stimulus_data.lock()
    }

    pub fn lock_relacs_settings(&self) -> ReentrantMutexGuard<'_, RefCell<Options>> {
        self.relacs_settings.lock()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Opens the session: the host is expected to have already created
    /// the output directory/file before calling this (spec.md §4.8
    /// "opens files and invokes all StartSession macros and all RePros'
    /// sessionStarted hooks" — the macro/RePro dispatch itself happens
    /// above this crate, which only gates on and records the transition).
    pub fn start_the_session(&mut self) -> SessionResult<()> {
        if self.state == SessionState::Running {
            return Err(SessionError::AlreadyRunning);
        }
        self.state = SessionState::Running;
        self.repro_count.store(0, Ordering::SeqCst);
        Ok(())
    }

    pub fn stop_the_session(&mut self) -> SessionResult<()> {
        if self.state == SessionState::Idle {
            return Err(SessionError::NotRunning);
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Called by the host each time a RePro completes during a running
    /// session.
    pub fn record_repro_run(&self) {
        self.repro_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn repro_count(&self) -> u32 {
        self.repro_count.load(Ordering::SeqCst)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_twice_without_stopping_is_an_error() {
        let mut session = Session::new();
        session.start_the_session().unwrap();
        assert!(matches!(session.start_the_session(), Err(SessionError::AlreadyRunning)));
    }

    #[test]
    fn repro_count_resets_on_each_new_session() {
        let mut session = Session::new();
        session.start_the_session().unwrap();
        session.record_repro_run();
        session.record_repro_run();
        assert_eq!(session.repro_count(), 2);
        session.stop_the_session().unwrap();
        session.start_the_session().unwrap();
        assert_eq!(session.repro_count(), 0);
    }

    #[test]
    fn metadata_lock_is_reentrant_on_the_same_thread() {
        let session = Session::new();
        let outer = session.lock_meta_data();
        outer.borrow_mut().add_text("subject", "demo");
        let inner = session.lock_meta_data();
        assert_eq!(inner.borrow().text("subject").unwrap(), "demo");
    }
}
