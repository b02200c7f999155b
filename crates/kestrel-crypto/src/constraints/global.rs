//! The process-wide [`ConstraintRegistry`].
//!
//! Until [`install`] is called, [`registry`] returns a
//! permissive registry.

use spin::Once;

use super::ConstraintRegistry;

static REGISTRY: Once<ConstraintRegistry> = Once::new();
static PERMISSIVE: ConstraintRegistry = ConstraintRegistry::permissive();

/// Returned by [`install`] when a registry has already been
/// installed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("a global constraint registry is already installed")]
pub struct AlreadyInstalled;

/// Installs the process-wide registry.
///
/// Only the first call succeeds.
pub fn install(registry: ConstraintRegistry) -> Result<(), AlreadyInstalled> {
    let mut installed = false;
    REGISTRY.call_once(|| {
        installed = true;
        registry
    });
    if installed {
        tracing::debug!("installed global constraint registry");
        Ok(())
    } else {
        Err(AlreadyInstalled)
    }
}

/// Returns the process-wide registry.
pub fn registry() -> &'static ConstraintRegistry {
    REGISTRY.get().unwrap_or(&PERMISSIVE)
}
