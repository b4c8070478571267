// ==============================================================================
// history.rs - PHYSICS STATE RING BUFFER
// ------------------------------------------------------------------------------
// Observers push every locally simulated state here and look up "what did I
// have at time T" when an authoritative snapshot arrives.
//
// Entries are assumed to be appended in non-decreasing timestamp order. There
// is no reordering: only locally produced states are ever buffered.
// ==============================================================================

use crate::snapshot::VehiclePhysicsState;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct PhysicsStateRingBuffer {
    states: VecDeque<VehiclePhysicsState>,
    capacity: usize,
}

impl Default for PhysicsStateRingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl PhysicsStateRingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            states: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehiclePhysicsState> {
        self.states.iter()
    }

    /// Appends, evicting as many of the oldest entries as needed to fit.
    pub fn add(&mut self, state: VehiclePhysicsState) {
        if self.states.len() >= self.capacity {
            let excess = self.states.len() - self.capacity + 1;
            self.states.drain(..excess);
        }
        self.states.push_back(state);
    }

    /// Pops the oldest entry.
    pub fn pull(&mut self) -> Option<VehiclePhysicsState> {
        self.states.pop_front()
    }

    pub fn first(&self) -> VehiclePhysicsState {
        self.states.front().copied().unwrap_or_default()
    }

    pub fn last(&self) -> VehiclePhysicsState {
        self.states.back().copied().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// State the buffer held at `time`.
    ///
    /// Bracketed times interpolate between neighbours. Times newer or older
    /// than everything buffered fall back to the latest entry. Only an empty
    /// buffer yields `None`.
    pub fn suitable_state(&self, time: f64) -> Option<VehiclePhysicsState> {
        let latest = *self.states.back()?;

        let Some(end_idx) = self.states.iter().position(|s| s.timestamp > time) else {
            return Some(latest);
        };
        if end_idx == 0 {
            return Some(latest);
        }

        let begin = &self.states[end_idx - 1];
        let end = &self.states[end_idx];
        let span = end.timestamp - begin.timestamp;
        let alpha = if span > f64::EPSILON {
            ((time - begin.timestamp) / span).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };

        Some(VehiclePhysicsState::lerp(begin, end, alpha))
    }

    /// Evicts entries older than `time`, keeping one entry at or before it so a
    /// later lookup still has a lower bracket.
    pub fn clear_old_states(&mut self, time: f64) {
        let Some(idx) = self.states.iter().rposition(|s| s.timestamp < time) else {
            return;
        };
        let count = idx.saturating_sub(1).max(1).min(self.states.len());
        self.states.drain(..count);
    }
}
