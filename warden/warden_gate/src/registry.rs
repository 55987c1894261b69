//! The process-wide access controller.
//!
//! At most one controller is installed at a time. Installing over an existing
//! controller is refused: a running gate cannot be replaced through this
//! registry. [`uninstall`] exists for orderly teardown by whoever owns the
//! process lifecycle.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info};
use warden_capability::{gate_permission, CallChain, Permission};

use crate::engine::SecurityGate;
use crate::error::AccessError;

/// Something that can decide a permission request against a call chain
pub trait AccessController: Send + Sync {
    fn check_permission(
        &self,
        permission: &dyn Permission,
        chain: &CallChain,
    ) -> Result<(), AccessError>;

    /// Downcast hook: `Some` when this controller is a [`SecurityGate`]
    fn as_gate(&self) -> Option<&SecurityGate> {
        None
    }
}

static INSTALLED: Lazy<RwLock<Option<Arc<dyn AccessController>>>> =
    Lazy::new(|| RwLock::new(None));

/// Installs `controller` as the process-wide access controller
///
/// Fails with [`AccessError::SelfProtection`] if a controller is already
/// installed.
pub fn install(controller: Arc<dyn AccessController>) -> Result<(), AccessError> {
    let mut slot = INSTALLED.write();
    if slot.is_some() {
        debug!("refusing to install over an existing controller");
        return Err(AccessError::SelfProtection {
            permission: gate_permission().to_string(),
        });
    }

    info!(
        is_gate = controller.as_gate().is_some(),
        "installed access controller"
    );
    *slot = Some(controller);
    Ok(())
}

/// Removes the installed controller, returning it
pub fn uninstall() -> Option<Arc<dyn AccessController>> {
    let previous = INSTALLED.write().take();
    if previous.is_some() {
        info!("uninstalled access controller");
    }
    previous
}

/// The installed controller, if any
pub fn installed() -> Option<Arc<dyn AccessController>> {
    INSTALLED.read().clone()
}

pub fn is_installed() -> bool {
    INSTALLED.read().is_some()
}

/// Whether checking is in force on the current thread
///
/// With a [`SecurityGate`] installed this is the thread's checking flag. A
/// foreign controller is assumed to check always, and with nothing installed
/// nothing is checked.
pub fn is_checking_active() -> bool {
    match INSTALLED.read().as_ref() {
        Some(controller) if controller.as_gate().is_some() => SecurityGate::is_checking(),
        Some(_) => true,
        None => false,
    }
}
