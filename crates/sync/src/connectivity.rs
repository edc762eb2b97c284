//! Online/offline state shared by the submission path.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

/// Whether the remote procedures are currently reachable.
#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
}

impl Connectivity {
    /// Creates the flag in the given state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// True if submissions should go to the remote procedures.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Records a connectivity change. Returns true if the device just came back online.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::AcqRel);
        if previous != online {
            info!(online, "connectivity changed");
        }
        online && !previous
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
