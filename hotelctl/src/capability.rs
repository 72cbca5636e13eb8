//! Guard around optional external collaborators.
//!
//! A failing collaborator is marked degraded and skipped for a cooldown, so requests that merely
//! use it as an enrichment do not wait on a dead dependency every time.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Capability {
    name: &'static str,
    cooldown: Duration,
    degraded_until: Mutex<Option<Instant>>,
}

impl Capability {
    pub fn new(name: &'static str, cooldown: Duration) -> Self {
        Self {
            name,
            cooldown,
            degraded_until: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// False while inside a degraded cooldown
    pub fn is_available(&self) -> bool {
        let mut degraded_until = self.degraded_until.lock();
        match *degraded_until {
            Some(until) if Instant::now() < until => false,
            Some(_) => {
                tracing::info!(capability = self.name, "Cooldown elapsed, capability available again");
                *degraded_until = None;
                true
            }
            None => true,
        }
    }

    pub fn mark_degraded(&self, reason: &str) {
        *self.degraded_until.lock() = Some(Instant::now() + self.cooldown);
        metrics::counter!("hotelctl_capability_degraded_total", "capability" => self.name).increment(1);
        tracing::warn!(capability = self.name, cooldown = ?self.cooldown, reason, "Capability degraded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_degraded_until_cooldown_elapses() {
        let capability = Capability::new("face_recognition", Duration::from_secs(60));
        assert_eq!(capability.name(), "face_recognition");
        assert!(capability.is_available());

        capability.mark_degraded("timeout");
        assert!(!capability.is_available());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!capability.is_available());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(capability.is_available());
    }
}
