// src/pipeline/gate.rs
//
// Admission control for classifier dispatches. At most one inference may
// be in flight; while one runs, new frames are skipped rather than queued,
// so sustained overload sheds frames instead of building a backlog. A
// minimum spacing additionally caps the classifier rate on fast devices.

#[derive(Debug)]
pub struct InferenceGate {
    min_interval: f64,
    last_dispatch: Option<f64>,
    in_flight: bool,
}

impl InferenceGate {
    pub fn new(min_interval: f64) -> Self {
        Self {
            min_interval,
            last_dispatch: None,
            in_flight: false,
        }
    }

    /// Claim the gate for a new dispatch at time `now`. Returns false when
    /// a run is still in flight or the interval has not elapsed.
    pub fn try_dispatch(&mut self, now: f64) -> bool {
        if self.in_flight {
            return false;
        }
        if let Some(last) = self.last_dispatch {
            if now - last < self.min_interval {
                return false;
            }
        }
        self.in_flight = true;
        self.last_dispatch = Some(now);
        true
    }

    /// Mark the in-flight run finished (success or failure alike).
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_dispatch_always_allowed() {
        let mut gate = InferenceGate::new(0.1);
        assert!(gate.try_dispatch(0.0));
        assert!(gate.is_busy());
    }

    #[test]
    fn test_skips_while_in_flight() {
        let mut gate = InferenceGate::new(0.1);
        assert!(gate.try_dispatch(0.0));
        // Plenty of time has passed but the previous run never finished
        assert!(!gate.try_dispatch(5.0));
        gate.complete();
        assert!(gate.try_dispatch(5.1));
    }

    #[test]
    fn test_enforces_min_interval() {
        let mut gate = InferenceGate::new(0.1);
        assert!(gate.try_dispatch(0.0));
        gate.complete();
        assert!(!gate.try_dispatch(0.05));
        assert!(gate.try_dispatch(0.11));
    }

    #[test]
    fn test_failed_run_releases_gate() {
        let mut gate = InferenceGate::new(0.1);
        assert!(gate.try_dispatch(0.0));
        gate.complete();
        assert!(!gate.is_busy());
    }
}
