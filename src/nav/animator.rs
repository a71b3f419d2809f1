//! Eased scroll animation.
//!
//! The animator owns no timer. The event loop calls [`ScrollAnimator::tick`]
//! at [`AnimationConfig::tick_interval`] while [`ScrollAnimator::phase`] is
//! `Animating`, which keeps exactly one animation alive: a second
//! `animate_to` retargets the running one.

use std::time::Duration;

use super::viewport::ScrollMetrics;

/// Default tick interval, roughly 60Hz.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(17);
pub const DEFAULT_EASING_DIVISOR: f64 = 8.0;
pub const DEFAULT_SNAP_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    pub tick_interval: Duration,
    /// Each tick closes `1 / easing_divisor` of the remaining distance.
    pub easing_divisor: f64,
    /// A step smaller than this snaps to the target and ends the animation.
    pub snap_epsilon: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            easing_divisor: DEFAULT_EASING_DIVISOR,
            snap_epsilon: DEFAULT_SNAP_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPhase {
    Idle,
    Animating,
}

/// Live animation state; only exists while animating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub current: f64,
    pub target: f64,
}

/// Outcome of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Nothing is animating.
    Idle,
    /// Move the scroll position here and keep ticking.
    Step(f64),
    /// Snap to this position; the animation is over and lazy loading may
    /// run again.
    Finished(f64),
}

#[derive(Debug, Clone, Default)]
pub struct ScrollAnimator {
    config: AnimationConfig,
    state: Option<ScrollState>,
}

impl ScrollAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config: sanitize(config),
            state: None,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn phase(&self) -> ScrollPhase {
        if self.state.is_some() {
            ScrollPhase::Animating
        } else {
            ScrollPhase::Idle
        }
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<ScrollState> {
        self.state
    }

    /// Start (or retarget) an animation toward `target`.
    ///
    /// The target is clamped to `[0, content_height]`. A running animation
    /// keeps its current position and only changes target. Returns `false`
    /// when the target is not a finite number.
    pub fn animate_to(&mut self, target: f64, metrics: ScrollMetrics) -> bool {
        if !target.is_finite() {
            return false;
        }
        let target = target.clamp(0.0, metrics.content_height.max(0.0));

        match self.state.as_mut() {
            Some(state) => state.target = target,
            None => {
                self.state = Some(ScrollState {
                    current: metrics.current_top,
                    target,
                });
            }
        }
        true
    }

    pub fn tick(&mut self) -> Tick {
        let Some(state) = self.state.as_mut() else {
            return Tick::Idle;
        };

        let next = state.current + (state.target - state.current) / self.config.easing_divisor;
        if (next - state.current).abs() < self.config.snap_epsilon {
            let target = state.target;
            self.state = None;
            return Tick::Finished(target);
        }

        state.current = next;
        Tick::Step(next)
    }

    /// Abandon the running animation without snapping.
    pub fn cancel(&mut self) {
        self.state = None;
    }
}

/// Guard against configs that would never converge.
fn sanitize(mut config: AnimationConfig) -> AnimationConfig {
    if !(config.easing_divisor.is_finite() && config.easing_divisor >= 1.0) {
        config.easing_divisor = DEFAULT_EASING_DIVISOR;
    }
    if !(config.snap_epsilon.is_finite() && config.snap_epsilon > 0.0) {
        config.snap_epsilon = DEFAULT_SNAP_EPSILON;
    }
    if config.tick_interval.is_zero() {
        config.tick_interval = DEFAULT_TICK_INTERVAL;
    }
    config
}
