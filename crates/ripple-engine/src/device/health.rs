use std::sync::{Mutex, PoisonError};

/// Device-loss flag shared between the device-lost callback and waiters.
#[derive(Debug, Default)]
pub struct DeviceHealth {
    lost: Mutex<Option<String>>,
}

impl DeviceHealth {
    /// Records device loss. The first reason wins.
    pub fn mark_lost(&self, reason: impl Into<String>) {
        let mut lost = self.lost.lock().unwrap_or_else(PoisonError::into_inner);
        if lost.is_none() {
            *lost = Some(reason.into());
        }
    }

    pub fn lost_reason(&self) -> Option<String> {
        self.lost.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_lost(&self) -> bool {
        self.lost_reason().is_some()
    }
}
