//! Map transition effects.
//!
//! A transition plays in the OUT direction on the old map, then the maps are
//! swapped and the same style plays IN on the new one. While a transition is
//! active the game is suspended and the hero invisible during the loading
//! gap between OUT end and IN start.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Visual style of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    /// No effect: the maps are swapped between two frames.
    Immediate,
    #[default]
    Fade,
    /// The camera slides from the edge the hero came from.
    Scrolling,
}

impl TransitionStyle {
    pub fn parse(name: &str) -> Self {
        match name {
            "immediate" => TransitionStyle::Immediate,
            "fade" => TransitionStyle::Fade,
            "scrolling" => TransitionStyle::Scrolling,
            other => panic!("unknown transition style '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDirection {
    Out,
    In,
}

/// A transition in progress.
#[derive(Debug, Clone)]
pub struct Transition {
    pub style: TransitionStyle,
    pub direction: TransitionDirection,
    pub start_date: u32,
    pub duration: u32,
}

const FADE_DURATION: u32 = 300;
const SCROLL_DURATION: u32 = 400;

impl Transition {
    pub fn start(style: TransitionStyle, direction: TransitionDirection, now: u32) -> Self {
        let duration = match style {
            TransitionStyle::Immediate => 0,
            TransitionStyle::Fade => FADE_DURATION,
            TransitionStyle::Scrolling => SCROLL_DURATION,
        };
        Transition {
            style,
            direction,
            start_date: now,
            duration,
        }
    }

    /// Progress 0.0 → 1.0 at `now`.
    pub fn progress(&self, now: u32) -> f32 {
        if self.duration == 0 {
            return 1.0;
        }
        ((now - self.start_date) as f32 / self.duration as f32).min(1.0)
    }

    pub fn is_finished(&self, now: u32) -> bool {
        now >= self.start_date + self.duration
    }

    /// Screen opacity 0-255 implied by the transition at `now`.
    pub fn alpha(&self, now: u32) -> i32 {
        let progress = self.progress(now);
        let alpha = match self.direction {
            TransitionDirection::Out => 1.0 - progress,
            TransitionDirection::In => progress,
        };
        (alpha * 255.0) as i32
    }
}

/// The transition currently playing, if any.
#[derive(Resource, Debug, Clone, Default)]
pub struct CurrentTransition(pub Option<Transition>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_out_darkens_then_finishes() {
        let transition = Transition::start(TransitionStyle::Fade, TransitionDirection::Out, 1000);
        assert_eq!(transition.alpha(1000), 255);
        assert!(transition.alpha(1150) < 255);
        assert!(transition.is_finished(1300));
        assert_eq!(transition.alpha(1300), 0);
    }

    #[test]
    fn immediate_is_instant() {
        let transition =
            Transition::start(TransitionStyle::Immediate, TransitionDirection::In, 500);
        assert!(transition.is_finished(500));
        assert_eq!(transition.alpha(500), 255);
    }
}
