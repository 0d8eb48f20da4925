use crate::Result;
use tracing::info;

/// OS "run at login" registration for the current executable.
///
/// All three operations are idempotent.
pub trait Autostart {
    /// # Errors
    ///
    /// Returns [`crate::Error::Autostart`] when the registration cannot be read.
    fn is_registered(&self) -> Result<bool>;

    /// # Errors
    ///
    /// Returns [`crate::Error::Autostart`] when the registration cannot be written.
    fn register(&self) -> Result<()>;

    /// # Errors
    ///
    /// Returns [`crate::Error::Autostart`] when the registration cannot be removed.
    fn unregister(&self) -> Result<()>;
}

/// Bring the OS registration in line with `wanted`.
///
/// Returns true when the registration was changed.
///
/// # Errors
///
/// Propagates errors from the autostart backend.
pub fn reconcile(autostart: &dyn Autostart, wanted: bool) -> Result<bool> {
    if autostart.is_registered()? == wanted {
        return Ok(false);
    }
    if wanted {
        autostart.register()?;
        info!("Registered to start at login");
    } else {
        autostart.unregister()?;
        info!("Removed start-at-login registration");
    }
    Ok(true)
}
