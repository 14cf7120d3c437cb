//! Smooths discrete hand signals into the continuous [`AnimationState`].
//!
//! Expansion chases a 0/1 target with an exponential step whose gain is
//! clamped to `[0, 1]`, so it can never overshoot however large `dt` gets.
//! Rotation chases a target yaw that grows at a constant rate.  Both yaw
//! accumulators are `f64`: at 60 fps an `f32` target stops growing after a
//! few days of uptime.

use serde::{Deserialize, Serialize};
use tree_field::AnimationState;

/// Tuning constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolatorConfig {
    /// Per-second gain while expanding.
    pub open_rate:      f32,
    /// Per-second gain while reforming.
    pub close_rate:     f32,
    /// Target yaw speed in rad/s.
    pub rotation_speed: f32,
    /// Per-second gain of the yaw chase.
    pub rotation_rate:  f32,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        InterpolatorConfig {
            open_rate:      3.5,
            close_rate:     2.5,
            rotation_speed: 0.2,
            rotation_rate:  4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StateInterpolator {
    config:          InterpolatorConfig,
    state:           AnimationState,
    target_rotation: f64,
}

impl StateInterpolator {
    pub fn new(config: InterpolatorConfig) -> Self {
        StateInterpolator {
            config,
            state:           AnimationState::default(),
            target_rotation: 0.0,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn target_rotation(&self) -> f64 {
        self.target_rotation
    }

    /// Advance by `dt` seconds toward `target_expansion` (clamped to
    /// `[0, 1]`).  A non-positive or non-finite `dt` leaves everything as is.
    pub fn advance(&mut self, target_expansion: f32, dt: f32) -> AnimationState {
        if !(dt.is_finite() && dt > 0.0) {
            return self.state;
        }
        let target = if target_expansion.is_finite() { target_expansion.clamp(0.0, 1.0) } else { 0.0 };

        let e = self.state.expansion;
        let rate = if target > e { self.config.open_rate } else { self.config.close_rate };
        let k = (rate * dt).clamp(0.0, 1.0);
        self.state.expansion = (e + (target - e) * k).clamp(0.0, 1.0);

        let dt = dt as f64;
        self.target_rotation += self.config.rotation_speed as f64 * dt;
        let k = (self.config.rotation_rate as f64 * dt).clamp(0.0, 1.0);
        self.state.rotation += (self.target_rotation - self.state.rotation) * k;

        self.state
    }

    /// Target expansion for the control hand: open → 1, otherwise 0.
    pub fn target_for(left_open: bool) -> f32 {
        if left_open { 1.0 } else { 0.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn interp() -> StateInterpolator {
        StateInterpolator::new(InterpolatorConfig::default())
    }

    #[test]
    fn starts_formed_and_still() {
        let s = interp().state();
        assert_eq!(s.expansion, 0.0);
        assert_eq!(s.rotation, 0.0);
    }

    #[test]
    fn opens_faster_than_it_closes() {
        let mut up = interp();
        up.advance(1.0, 0.1);
        let opened = up.state().expansion;

        let mut down = interp();
        for _ in 0..600 { down.advance(1.0, 1.0 / 60.0); }
        let before = down.state().expansion;
        down.advance(0.0, 0.1);
        let closed = before - down.state().expansion;

        assert!((opened - 0.35).abs() < 1e-6);
        assert!((closed - 0.25 * before).abs() < 1e-5);
        assert!(opened > closed);
    }

    #[test]
    fn huge_dt_snaps_without_overshoot() {
        let mut i = interp();
        i.advance(1.0, 100.0);
        assert_eq!(i.state().expansion, 1.0);
        i.advance(0.0, 100.0);
        assert_eq!(i.state().expansion, 0.0);
    }

    #[test]
    fn bad_dt_is_a_no_op() {
        let mut i = interp();
        i.advance(1.0, 0.5);
        let before = i.clone();
        for dt in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            i.advance(0.0, dt);
            assert_eq!(i, before);
        }
    }

    #[test]
    fn rotation_chases_growing_target() {
        let mut i = interp();
        for _ in 0..600 { i.advance(0.0, 1.0 / 60.0); }
        // After 10 s the target is at 2 rad; the lag settles near speed / rate.
        assert!((i.target_rotation() - 2.0).abs() < 1e-3);
        let lag = i.target_rotation() - i.state().rotation;
        assert!(lag > 0.0 && lag < 0.06, "lag {}", lag);
    }

    #[test]
    fn rotation_keeps_growing_after_days() {
        let mut i = interp();
        let dt = 1.0 / 60.0;
        // Four simulated days at 60 fps.
        for _ in 0..(4 * 86_400 * 60) { i.advance(0.0, dt); }
        let expected = 0.2 * 4.0 * 86_400.0;
        assert!((i.target_rotation() - expected).abs() / expected < 1e-6);

        let before = (i.target_rotation(), i.state().rotation);
        i.advance(0.0, dt);
        assert!(i.target_rotation() > before.0);
        assert!(i.state().rotation > before.1);
    }

    #[test]
    fn target_for_control_hand() {
        assert_eq!(StateInterpolator::target_for(true), 1.0);
        assert_eq!(StateInterpolator::target_for(false), 0.0);
    }

    proptest! {
        #[test]
        fn expansion_stays_bounded(
            steps in prop::collection::vec((any::<bool>(), 0.0f32..0.5), 1..200)
        ) {
            let mut i = interp();
            for (open, dt) in steps {
                let e = i.advance(StateInterpolator::target_for(open), dt).expansion;
                prop_assert!((0.0..=1.0).contains(&e));
            }
        }

        #[test]
        fn expansion_moves_monotonically_toward_target(
            start in prop::collection::vec(0.0f32..0.1, 0..20),
            open in any::<bool>(),
            dts in prop::collection::vec(0.0f32..0.5, 1..100),
        ) {
            let mut i = interp();
            for dt in start { i.advance(1.0, dt); }
            let target = StateInterpolator::target_for(open);
            let mut prev = i.state().expansion;
            for dt in dts {
                let e = i.advance(target, dt).expansion;
                prop_assert!((target - e).abs() <= (target - prev).abs() + 1e-6);
                if open { prop_assert!(e >= prev); } else { prop_assert!(e <= prev); }
                prev = e;
            }
        }

        #[test]
        fn constant_target_converges(open in any::<bool>(), dt in 0.005f32..0.1) {
            let mut i = interp();
            if !open { i.advance(1.0, 10.0); }
            let target = StateInterpolator::target_for(open);
            let steps = (10.0 / dt) as usize;
            for _ in 0..steps { i.advance(target, dt); }
            prop_assert!((i.state().expansion - target).abs() < 0.01);
        }

        #[test]
        fn same_inputs_same_outputs(
            seq in prop::collection::vec((any::<bool>(), 0.0f32..0.2), 1..50)
        ) {
            let mut a = interp();
            let mut b = interp();
            for (open, dt) in seq {
                let t = StateInterpolator::target_for(open);
                prop_assert_eq!(a.advance(t, dt), b.advance(t, dt));
            }
        }
    }
}
