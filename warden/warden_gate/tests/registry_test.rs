//! Integration tests for the process-wide controller registry.
//!
//! The registry is global, so every test here takes `SERIAL` first and leaves
//! the registry empty behind it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use warden_capability::{bypass_permission, CallChain, CodeSource, Permission, ProtectionDomain};
use warden_gate::{
    install, installed, is_checking_active, is_installed, run_checked, run_unchecked, spawn,
    try_run_unchecked, uninstall, AccessController, AccessError, DenialReason, SecurityGate,
};

static SERIAL: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Holds the serial lock and clears the registry on both ends
struct Isolated {
    _lock: MutexGuard<'static, ()>,
}

impl Isolated {
    fn new() -> Self {
        let lock = SERIAL.lock();
        uninstall();
        Self { _lock: lock }
    }
}

impl Drop for Isolated {
    fn drop(&mut self) {
        uninstall();
    }
}

/// A controller that is not a gate and allows everything
struct AllowAll;

impl AccessController for AllowAll {
    fn check_permission(
        &self,
        _permission: &dyn Permission,
        _chain: &CallChain,
    ) -> Result<(), AccessError> {
        Ok(())
    }
}

fn trusted() -> Arc<ProtectionDomain> {
    ProtectionDomain::builder(CodeSource::new("trusted"))
        .grant(bypass_permission())
        .build()
}

fn untrusted() -> Arc<ProtectionDomain> {
    ProtectionDomain::builder(CodeSource::new("untrusted")).build()
}

#[test]
fn test_install_twice_is_refused() {
    let _isolated = Isolated::new();

    install(Arc::new(SecurityGate::silent())).unwrap();
    let err = install(Arc::new(AllowAll)).unwrap_err();
    assert_eq!(err.reason(), DenialReason::SelfProtection);

    // The first controller is still the one installed.
    assert!(installed().unwrap().as_gate().is_some());
}

#[test]
fn test_uninstall_then_reinstall() {
    let _isolated = Isolated::new();

    assert!(!is_installed());
    assert!(uninstall().is_none());

    install(Arc::new(AllowAll)).unwrap();
    assert!(is_installed());
    assert!(uninstall().is_some());
    assert!(!is_installed());

    install(Arc::new(SecurityGate::silent())).unwrap();
    assert!(is_installed());
}

#[test]
fn test_is_checking_active() {
    let _isolated = Isolated::new();

    // Nothing installed: nothing is checked, whatever the thread flag says.
    assert!(!is_checking_active());
    assert!(!run_checked(is_checking_active));

    install(Arc::new(SecurityGate::silent())).unwrap();
    assert!(!is_checking_active());
    assert!(run_checked(is_checking_active));

    uninstall();
    install(Arc::new(AllowAll)).unwrap();
    assert!(is_checking_active());
}

#[test]
fn test_child_thread_sees_parent_flag_through_registry() {
    let _isolated = Isolated::new();
    install(Arc::new(SecurityGate::silent())).unwrap();

    let checked_child = run_checked(|| spawn(is_checking_active));
    let unchecked_child = spawn(is_checking_active);

    assert!(checked_child.join().unwrap());
    assert!(!unchecked_child.join().unwrap());
}

#[test]
fn test_installed_controller_decides() {
    let _isolated = Isolated::new();
    install(Arc::new(SecurityGate::silent())).unwrap();

    let controller = installed().unwrap();
    let chain = CallChain::new(vec![untrusted()]);
    let request = warden_capability::RuntimePermission::new("exitVM");

    assert!(controller.check_permission(&request, &chain).is_ok());
    let err = run_checked(|| controller.check_permission(&request, &chain)).unwrap_err();
    assert_eq!(err.reason(), DenialReason::PolicyViolation);
}

#[test]
fn test_run_unchecked_enforced_only_when_installed() {
    let _isolated = Isolated::new();
    let calls = AtomicUsize::new(0);

    // No controller: the bypass is not verified.
    let inside = run_checked(|| run_unchecked(&untrusted(), SecurityGate::is_checking)).unwrap();
    assert!(!inside);

    install(Arc::new(SecurityGate::silent())).unwrap();

    let err = run_checked(|| {
        run_unchecked(&untrusted(), || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    })
    .unwrap_err();
    assert_eq!(err.reason(), DenialReason::MissingBypassCapability);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    run_checked(|| {
        let inside = run_unchecked(&trusted(), SecurityGate::is_checking).unwrap();
        assert!(!inside);
        assert!(SecurityGate::is_checking());
    });

    // Already unchecked: nothing to verify.
    assert!(run_unchecked(&untrusted(), || ()).is_ok());
}

#[derive(Debug)]
enum TaskError {
    Denied(DenialReason),
    Io(String),
}

impl From<AccessError> for TaskError {
    fn from(e: AccessError) -> Self {
        TaskError::Denied(e.reason())
    }
}

#[test]
fn test_try_run_unchecked_flattens_errors() {
    let _isolated = Isolated::new();
    install(Arc::new(SecurityGate::silent())).unwrap();

    let refused: Result<(), TaskError> =
        run_checked(|| try_run_unchecked(&untrusted(), || Ok(())));
    assert!(matches!(
        refused,
        Err(TaskError::Denied(DenialReason::MissingBypassCapability))
    ));

    let failed: Result<(), TaskError> = run_checked(|| {
        try_run_unchecked(&trusted(), || Err(TaskError::Io("broken pipe".to_string())))
    });
    assert!(matches!(failed, Err(TaskError::Io(ref msg)) if msg == "broken pipe"));
    assert!(!SecurityGate::is_checking());
}

#[test]
fn test_installed_gate_ignores_forged_caller() {
    let _isolated = Isolated::new();
    let plugin = untrusted();
    let gate = SecurityGate::silent().with_chain_provider(Arc::new(
        warden_capability::FixedChainProvider::new(CallChain::new(vec![plugin.clone()])),
    ));
    install(Arc::new(gate)).unwrap();

    let forged = ProtectionDomain::privileged(CodeSource::new("anything"));
    let calls = AtomicUsize::new(0);

    let err = run_checked(|| {
        run_unchecked(&forged, || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    })
    .unwrap_err();

    assert_eq!(err.reason(), DenialReason::MissingBypassCapability);
    assert_eq!(err.domain().map(|d| d.id()), Some(plugin.id()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
