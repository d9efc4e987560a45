//! Fallback reminder alerts via notify-rust (D-Bus).
//!
//! Used when a reminder could not be spoken. The alert is a critical,
//! non-expiring desktop notification and is always written to the log as
//! well, so it cannot vanish silently.

use notify_rust::{Notification, Timeout, Urgency};
use tracing::{error, warn};

/// Synchronous, user-visible alert.
pub trait Alert: Send + Sync {
    fn alert(&self, summary: &str, body: &str);
}

pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Alert for Notifier {
    fn alert(&self, summary: &str, body: &str) {
        error!("{summary}: {body}");

        if !self.enabled {
            return;
        }

        if let Err(e) = Notification::new()
            .summary(summary)
            .body(body)
            .icon("appointment-soon")
            .urgency(Urgency::Critical)
            .timeout(Timeout::Never)
            .show()
        {
            warn!("Failed to show notification: {e}");
        }
    }
}
