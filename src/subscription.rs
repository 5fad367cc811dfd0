//! Disposable collaborator subscriptions.

use core::fmt;

/// Handle to a listener registered with a collaborator.
///
/// Disposal runs once, either explicitly or on drop.
pub struct Subscription {
    label: &'static str,
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F>(label: &'static str, dispose: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            label,
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_active(&self) -> bool {
        self.dispose.is_some()
    }

    /// Unregister the listener. Later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            log::trace!("disposing subscription {}", self.label);
            dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}
