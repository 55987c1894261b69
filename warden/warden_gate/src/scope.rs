//! Switching checking on and off around a unit of work.
//!
//! Both operations restore the caller's checking flag when the work finishes,
//! whether it returns normally, returns an error, or unwinds.

use std::sync::Arc;

use tracing::trace;
use warden_capability::{bypass_permission, ProtectionDomain};

use crate::error::AccessError;
use crate::registry::{self, AccessController};
use crate::state::{self, CheckingScope};

/// Runs `work` with permission checking enabled on the current thread
///
/// If checking is already on, `work` simply runs: nesting is idempotent.
pub fn run_checked<T, F>(work: F) -> T
where
    F: FnOnce() -> T,
{
    if state::is_checking() {
        return work();
    }

    let _scope = CheckingScope::enter(true);
    work()
}

/// Runs `work` with permission checking disabled on the current thread
///
/// When checking is currently on and a controller is installed, the caller
/// must imply the bypass permission. Otherwise
/// [`AccessError::MissingBypassCapability`] is returned and `work` never runs.
/// When checking is already off, `work` simply runs.
///
/// If the installed controller is a [`SecurityGate`](crate::SecurityGate) the
/// decision is delegated to
/// [`SecurityGate::run_unchecked`](crate::SecurityGate::run_unchecked), which ignores `caller` when
/// the gate has a chain provider. In every other case `caller` is taken at
/// its word: it is only as trustworthy as the code that built it.
pub fn run_unchecked<T, F>(caller: &Arc<ProtectionDomain>, work: F) -> Result<T, AccessError>
where
    F: FnOnce() -> T,
{
    let installed = registry::installed();
    match installed.as_deref().and_then(|controller| controller.as_gate()) {
        Some(gate) => gate.run_unchecked(caller, work),
        None => unchecked(installed.is_some(), Some(caller), work),
    }
}

/// Like [`run_unchecked`], for work that can itself fail
///
/// A refused bypass is converted into the work's own error type; an error
/// returned by `work` is passed through unchanged.
pub fn try_run_unchecked<T, E, F>(caller: &Arc<ProtectionDomain>, work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<AccessError>,
{
    run_unchecked(caller, work)?
}

/// A `None` caller could not be resolved and is refused whenever `enforce` is set.
pub(crate) fn unchecked<T, F>(
    enforce: bool,
    caller: Option<&Arc<ProtectionDomain>>,
    work: F,
) -> Result<T, AccessError>
where
    F: FnOnce() -> T,
{
    if !state::is_checking() {
        return Ok(work());
    }

    if enforce {
        let bypass = bypass_permission();
        if !caller.is_some_and(|caller| caller.implies(&bypass)) {
            trace!(caller = ?caller.map(|c| c.id()), "bypass refused");
            return Err(AccessError::MissingBypassCapability {
                permission: bypass.to_string(),
                caller: caller.cloned(),
            });
        }
    }

    let _scope = CheckingScope::enter(false);
    Ok(work())
}
