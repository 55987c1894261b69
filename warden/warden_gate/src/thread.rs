//! Thread creation with inherited checking state.
//!
//! A child thread starts with the value its parent held for the checking flag
//! at the moment of creation. The value is a snapshot: later changes on either
//! side do not cross over. The re-entrancy guard is never inherited.

use std::io;
use std::thread::{self, JoinHandle};

use crate::state::{self, CheckingScope};

/// The inheritable part of a thread's gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    checking: bool,
}

impl GateSnapshot {
    /// Captures the current thread's inheritable state
    pub fn capture() -> Self {
        Self {
            checking: state::is_checking(),
        }
    }

    pub fn checking(&self) -> bool {
        self.checking
    }

    /// Wraps `f` so that it runs with this snapshot's state
    ///
    /// Useful for handing work to threads not created through [`spawn`], such
    /// as pool workers. The worker's own state is restored when `f` returns.
    pub fn wrap<F, T>(self, f: F) -> impl FnOnce() -> T
    where
        F: FnOnce() -> T,
    {
        move || {
            let _scope = CheckingScope::enter(self.checking);
            f()
        }
    }
}

/// Spawns a thread that inherits the caller's checking flag
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::spawn(GateSnapshot::capture().wrap(f))
}

/// Spawns a named thread that inherits the caller's checking flag
pub fn spawn_named<F, T>(name: impl Into<String>, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(GateSnapshot::capture().wrap(f))
}
