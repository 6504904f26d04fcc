//! Velocity history recorded while a body is carried.

use bevy::math::Vec3;

use crate::physics_math::HOLD_HISTORY_LEN;

/// Fixed-size ring of smoothed per-tick displacements.
///
/// Samples are written at a rotating index. `average_of_first` reads by slot
/// index starting at slot 0, not by recency, so once the ring has wrapped
/// the average mixes old and new samples.
#[derive(Debug, Clone, Default)]
pub struct VelocityHistory {
    samples: [Vec3; HOLD_HISTORY_LEN],
    next: usize,
}

impl VelocityHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every slot and rewind the write index.
    pub fn reset(&mut self) {
        self.samples = [Vec3::ZERO; HOLD_HISTORY_LEN];
        self.next = 0;
    }

    /// Sample written most recently (slot before the write index).
    pub fn previous(&self) -> Vec3 {
        self.samples[(self.next + HOLD_HISTORY_LEN - 1) % HOLD_HISTORY_LEN]
    }

    pub fn push(&mut self, sample: Vec3) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % HOLD_HISTORY_LEN;
    }

    /// Mean of slots `0..n`, with `n` capped at the ring size.
    pub fn average_of_first(&self, n: usize) -> Vec3 {
        let n = n.min(HOLD_HISTORY_LEN);
        if n == 0 {
            return Vec3::ZERO;
        }
        self.samples[..n].iter().copied().sum::<Vec3>() / n as f32
    }

    pub fn samples(&self) -> &[Vec3; HOLD_HISTORY_LEN] {
        &self.samples
    }

    pub fn next_index(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_wraps_around() {
        let mut history = VelocityHistory::new();
        for i in 0..7 {
            history.push(Vec3::splat(i as f32));
        }

        assert_eq!(history.next_index(), 2);
        assert_eq!(history.previous(), Vec3::splat(6.0));
        assert_eq!(history.samples()[0], Vec3::splat(5.0));
        assert_eq!(history.samples()[4], Vec3::splat(4.0));
    }

    #[test]
    fn test_previous_of_empty_history_is_zero() {
        let history = VelocityHistory::new();
        assert_eq!(history.previous(), Vec3::ZERO);
    }

    #[test]
    fn test_average_reads_leading_slots_after_wrap() {
        let mut history = VelocityHistory::new();
        for i in 1..=6 {
            history.push(Vec3::new(i as f32, 0.0, 0.0));
        }
        // Slots are now [6, 2, 3, 4, 5]
        assert_eq!(history.average_of_first(2), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(history.average_of_first(10), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(history.average_of_first(0), Vec3::ZERO);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut history = VelocityHistory::new();
        history.push(Vec3::ONE);
        history.reset();

        assert_eq!(history.next_index(), 0);
        assert!(history.samples().iter().all(|s| *s == Vec3::ZERO));
    }
}
