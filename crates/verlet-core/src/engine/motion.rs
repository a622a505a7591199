use crate::core::crystal::Crystal;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum MotionState {
    /// No list has been built yet, or the last build failed.
    AwaitingBuild,
    /// Asymmetric-unit coordinates that produced the current lists.
    Built { snapshot: Vec<f64> },
}

/// Decides whether the lists are still valid for the current coordinates.
///
/// Lists built with a buffer `B` stay complete as long as no atom has moved more than `B / 2`
/// from the position it had when they were built: two atoms approaching each other close at
/// most `B` between them.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    state: MotionState,
    threshold_squared: f64,
}

impl MotionDetector {
    pub fn new(buffer: f64) -> Self {
        let half = 0.5 * buffer;
        Self {
            state: MotionState::AwaitingBuild,
            threshold_squared: half * half,
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, MotionState::Built { .. })
    }

    /// `true` when forced, before the first build, or when any atom's minimum-image
    /// displacement from the snapshot exceeds half the buffer.
    pub fn needs_rebuild(&self, crystal: &dyn Crystal, current: &[f64], force: bool) -> bool {
        if force {
            trace!("Rebuild forced");
            return true;
        }
        let snapshot = match &self.state {
            MotionState::AwaitingBuild => {
                trace!("Rebuild required: no previous build");
                return true;
            }
            MotionState::Built { snapshot } => snapshot,
        };
        if snapshot.len() != current.len() {
            return true;
        }

        let moved = snapshot
            .chunks_exact(3)
            .zip(current.chunks_exact(3))
            .position(|(old, new)| {
                crystal.image(new[0] - old[0], new[1] - old[1], new[2] - old[2])
                    > self.threshold_squared
            });
        match moved {
            Some(atom) => {
                trace!(atom, "Rebuild required: atom moved more than half the buffer");
                true
            }
            None => false,
        }
    }

    /// Stores the coordinates the lists were just built from.
    pub fn record(&mut self, coordinates: &[f64]) {
        if let MotionState::Built { snapshot } = &mut self.state {
            if snapshot.len() == coordinates.len() {
                snapshot.copy_from_slice(coordinates);
                return;
            }
        }
        self.state = MotionState::Built {
            snapshot: coordinates.to_vec(),
        };
    }

    pub fn invalidate(&mut self) {
        self.state = MotionState::AwaitingBuild;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crystal::UnitCell;

    const EPS: f64 = 1e-6;

    fn built(coordinates: &[f64]) -> MotionDetector {
        let mut detector = MotionDetector::new(2.0);
        detector.record(coordinates);
        detector
    }

    #[test]
    fn first_call_always_rebuilds() {
        let cell = UnitCell::cubic(30.0).unwrap();
        let detector = MotionDetector::new(2.0);
        assert!(!detector.is_built());
        assert!(detector.needs_rebuild(&cell, &[1.0, 1.0, 1.0], false));
    }

    #[test]
    fn displacement_just_below_half_buffer_keeps_lists() {
        let cell = UnitCell::cubic(30.0).unwrap();
        let start = [5.0, 5.0, 5.0, 10.0, 10.0, 10.0];
        let detector = built(&start);

        let mut moved = start;
        moved[3] += 1.0 - EPS;
        assert!(!detector.needs_rebuild(&cell, &moved, false));
    }

    #[test]
    fn displacement_just_above_half_buffer_rebuilds() {
        let cell = UnitCell::cubic(30.0).unwrap();
        let start = [5.0, 5.0, 5.0, 10.0, 10.0, 10.0];
        let detector = built(&start);

        let mut moved = start;
        moved[3] += 1.0 + EPS;
        assert!(detector.needs_rebuild(&cell, &moved, false));
    }

    #[test]
    fn displacement_uses_minimum_image() {
        let cell = UnitCell::cubic(30.0).unwrap();
        let detector = built(&[0.2, 5.0, 5.0]);
        // Crossing the boundary moves the atom 0.5 A, not 29.5 A.
        assert!(!detector.needs_rebuild(&cell, &[29.7, 5.0, 5.0], false));
    }

    #[test]
    fn force_overrides_a_fresh_snapshot() {
        let cell = UnitCell::cubic(30.0).unwrap();
        let start = [5.0, 5.0, 5.0];
        let detector = built(&start);
        assert!(detector.needs_rebuild(&cell, &start, true));
    }

    #[test]
    fn record_overwrites_and_invalidate_resets() {
        let mut detector = built(&[1.0, 2.0, 3.0]);
        detector.record(&[4.0, 5.0, 6.0]);
        assert_eq!(
            detector.state(),
            &MotionState::Built {
                snapshot: vec![4.0, 5.0, 6.0]
            }
        );

        detector.invalidate();
        assert_eq!(detector.state(), &MotionState::AwaitingBuild);
    }
}
