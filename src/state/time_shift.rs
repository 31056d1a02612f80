//! Random time shift policy
//!
//! While a countdown runs, each tick has a small chance of consulting the
//! policy, which in turn has a further chance of moving the remaining time by
//! a uniformly drawn amount. A shift never leaves less than the floor.

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftPolicy {
    /// Chance per tick that the policy is consulted.
    pub tick_chance: f64,
    /// Chance that a consulted policy actually shifts.
    pub apply_chance: f64,
    /// Shift deltas are drawn from `-max_delta..=max_delta` seconds.
    pub max_delta: i64,
    /// Lowest remaining time a shift may produce.
    pub floor: u64,
}

impl ShiftPolicy {
    pub fn disabled() -> Self {
        Self {
            tick_chance: 0.0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tick_chance > 0.0 && self.apply_chance > 0.0
    }

    /// Clamp chances into `0.0..=1.0` and the range to a non-negative width.
    pub fn sanitized(self) -> Self {
        Self {
            tick_chance: clamp_chance(self.tick_chance),
            apply_chance: clamp_chance(self.apply_chance),
            max_delta: self.max_delta.max(0),
            floor: self.floor,
        }
    }
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self {
            tick_chance: 0.05,
            apply_chance: 0.3,
            max_delta: 300,
            floor: 10,
        }
    }
}

fn clamp_chance(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.clamp(0.0, 1.0)
    }
}

/// Add `delta` to `remaining`, never going below `floor`.
pub fn apply_shift(remaining: u64, delta: i64, floor: u64) -> u64 {
    let shifted = i128::from(remaining) + i128::from(delta);
    let shifted = u64::try_from(shifted.max(0)).unwrap_or(u64::MAX);
    shifted.max(floor)
}

/// A shift that took place during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub delta: i64,
    pub remaining: u64,
}

/// Draws shifts according to a [`ShiftPolicy`]
#[derive(Debug, Clone)]
pub struct TimeShifter {
    policy: ShiftPolicy,
    rng: StdRng,
}

impl TimeShifter {
    pub fn new(policy: ShiftPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    pub fn with_rng(policy: ShiftPolicy, rng: StdRng) -> Self {
        Self {
            policy: policy.sanitized(),
            rng,
        }
    }

    pub fn policy(&self) -> &ShiftPolicy {
        &self.policy
    }

    /// Roll the per-tick chance and, if it hits, the shift itself.
    /// Called at most once per tick.
    pub fn on_tick(&mut self, remaining: u64) -> Option<Shift> {
        if !self.policy.is_enabled() || !self.rng.gen_bool(self.policy.tick_chance) {
            return None;
        }
        self.shift(remaining)
    }

    /// The gated shift: with `apply_chance`, move `remaining` by a random delta.
    pub fn shift(&mut self, remaining: u64) -> Option<Shift> {
        if !self.rng.gen_bool(self.policy.apply_chance) {
            return None;
        }

        let max = self.policy.max_delta;
        let delta = self.rng.gen_range(-max..=max);
        let shifted = apply_shift(remaining, delta, self.policy.floor);
        info!(
            "Time shift of {:+}s: {}s -> {}s remaining",
            delta, remaining, shifted
        );
        Some(Shift {
            delta,
            remaining: shifted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(policy: ShiftPolicy, seed: u64) -> TimeShifter {
        TimeShifter::with_rng(policy, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn floor_holds_across_the_whole_delta_range() {
        for remaining in (0..=1_000).step_by(7) {
            for delta in -300..=300 {
                assert!(apply_shift(remaining, delta, 10) >= 10);
            }
        }
    }

    #[test]
    fn shift_adds_delta_above_the_floor() {
        assert_eq!(apply_shift(500, -120, 10), 380);
        assert_eq!(apply_shift(500, 300, 10), 800);
        assert_eq!(apply_shift(100, -300, 10), 10);
        assert_eq!(apply_shift(0, 0, 10), 10);
    }

    #[test]
    fn drawn_shifts_stay_in_range_and_above_floor() {
        let policy = ShiftPolicy {
            apply_chance: 1.0,
            ..ShiftPolicy::default()
        };
        let mut shifter = seeded(policy, 7);

        for remaining in 0..2_000u64 {
            let shift = shifter.shift(remaining).unwrap();
            assert!((-300..=300).contains(&shift.delta));
            assert!(shift.remaining >= 10);
        }
    }

    #[test]
    fn disabled_policy_never_shifts() {
        let mut shifter = seeded(ShiftPolicy::disabled(), 1);
        assert!((0..10_000).all(|_| shifter.on_tick(600).is_none()));
    }

    #[test]
    fn certain_policy_always_shifts() {
        let policy = ShiftPolicy {
            tick_chance: 1.0,
            apply_chance: 1.0,
            ..ShiftPolicy::default()
        };
        let mut shifter = seeded(policy, 3);
        assert!((0..100).all(|_| shifter.on_tick(600).is_some()));
    }

    #[test]
    fn default_rates_compose_to_roughly_one_and_a_half_percent() {
        let mut shifter = seeded(ShiftPolicy::default(), 42);
        let shifts = (0..100_000)
            .filter(|_| shifter.on_tick(600).is_some())
            .count();
        // 0.05 * 0.3 = 1.5%
        assert!((1_200..1_800).contains(&shifts), "got {} shifts", shifts);
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let policy = ShiftPolicy {
            tick_chance: 2.0,
            apply_chance: f64::NAN,
            max_delta: -5,
            floor: 10,
        }
        .sanitized();
        assert_eq!(policy.tick_chance, 1.0);
        assert_eq!(policy.apply_chance, 0.0);
        assert_eq!(policy.max_delta, 0);
    }
}
