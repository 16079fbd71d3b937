//! Collector-discipline stand-in (§5 "Collector discipline").
//!
//! The real engine suspends the host VM's automatic collector for the
//! duration of an unpersist call, so that transient placeholders (a
//! partially-filled table, a closure with still-nil upvalue slots) stay
//! reachable purely through the reader's own work stack without being
//! swept mid-decode. This facade is reference-counted rather than
//! garbage-collected, so there is no real collector to suspend — the guard
//! exists to keep the suspend/resume discipline visible and logged, and as
//! the place a real embedding would plug into.

/// RAII guard modeling "suspend automatic collection ... resume at the end"
/// (§5). Resumes unconditionally on drop, including on the error path, by
/// construction.
pub struct CollectorGuard {
    active: bool,
}

impl CollectorGuard {
    pub fn suspend() -> Self {
        log::trace!("suspending collector for unpersist");
        CollectorGuard { active: true }
    }
}

impl Drop for CollectorGuard {
    fn drop(&mut self) {
        if self.active {
            log::trace!("resuming collector after unpersist");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_can_be_constructed_and_dropped() {
        let guard = CollectorGuard::suspend();
        drop(guard);
    }
}
