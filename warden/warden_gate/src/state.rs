//! Per-thread gate state.
//!
//! Two flags live in thread-local storage:
//!
//! - `CHECKING`: whether permission checks are enforced on this thread. New
//!   threads start with it off unless spawned through [`crate::thread`], which
//!   copies the parent's value at creation time.
//! - `ENTERED`: the re-entrancy guard held while a decision walks a chain or
//!   reports a denial. Never inherited.
//!
//! Neither flag is shared between threads, so reading or writing them never
//! takes a lock. Writes only happen through the scope guards below, which put
//! the previous value back when dropped, including during unwinding.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static CHECKING: Cell<bool> = const { Cell::new(false) };
    static ENTERED: Cell<bool> = const { Cell::new(false) };
}

/// Whether permission checking is enabled on the current thread.
pub fn is_checking() -> bool {
    CHECKING.with(Cell::get)
}

/// Whether the current thread is inside a decision or a denial report.
pub fn is_guard_active() -> bool {
    ENTERED.with(Cell::get)
}

fn set_checking(value: bool) -> bool {
    CHECKING.with(|flag| flag.replace(value))
}

fn set_guard(value: bool) -> bool {
    ENTERED.with(|flag| flag.replace(value))
}

/// Forces the checking flag to a value until dropped.
///
/// The guard is `!Send`: it must be dropped on the thread that created it.
#[must_use]
pub(crate) struct CheckingScope {
    previous: bool,
    _not_send: PhantomData<*const ()>,
}

impl CheckingScope {
    pub(crate) fn enter(value: bool) -> Self {
        Self {
            previous: set_checking(value),
            _not_send: PhantomData,
        }
    }
}

impl Drop for CheckingScope {
    fn drop(&mut self) {
        set_checking(self.previous);
    }
}

/// Holds the re-entrancy guard until dropped.
#[must_use]
pub(crate) struct GuardScope {
    previous: bool,
    _not_send: PhantomData<*const ()>,
}

impl GuardScope {
    pub(crate) fn enter() -> Self {
        Self {
            previous: set_guard(true),
            _not_send: PhantomData,
        }
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        set_guard(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn test_defaults() {
        std::thread::spawn(|| {
            assert!(!is_checking());
            assert!(!is_guard_active());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_checking_scope_restores() {
        assert!(!is_checking());
        {
            let _on = CheckingScope::enter(true);
            assert!(is_checking());
            {
                let _off = CheckingScope::enter(false);
                assert!(!is_checking());
            }
            assert!(is_checking());
        }
        assert!(!is_checking());
    }

    #[test]
    fn test_guard_scope_restores_nested() {
        {
            let _outer = GuardScope::enter();
            assert!(is_guard_active());
            {
                let _inner = GuardScope::enter();
                assert!(is_guard_active());
            }
            // The inner scope restores the outer value, not false.
            assert!(is_guard_active());
        }
        assert!(!is_guard_active());
    }

    #[test]
    fn test_scopes_restore_on_panic() {
        let result = panic::catch_unwind(|| {
            let _checking = CheckingScope::enter(true);
            let _guard = GuardScope::enter();
            panic!("boom");
        });

        assert!(result.is_err());
        assert!(!is_checking());
        assert!(!is_guard_active());
    }
}
