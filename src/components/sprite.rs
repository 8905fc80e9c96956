//! Sprite animation state.
//!
//! A [`Sprite`] is one animated view of an entity: it names an animation set
//! (shared, immutable data in the
//! [`AnimationStore`](crate::resources::animations::AnimationStore)) and
//! carries the mutable per-instance state: current animation, direction,
//! frame, frame clock, blink and fade. Entities hold their sprites in a
//! [`SpriteSet`], drawn in insertion order.

use bevy_ecs::prelude::Component;

use crate::resources::animations::AnimationSet;

/// Mutable animation state over a shared animation set.
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Id of the animation set in the store.
    pub animation_set_id: String,
    /// Name of the current animation in the set.
    pub animation: String,
    /// Current direction, within the set's direction count.
    pub direction: i32,
    /// Current frame, always within the current animation's frame count.
    pub frame: i32,
    /// Clock date of the next frame change, in ms.
    pub next_frame_date: u32,
    /// Per-instance frame delay override in ms; 0 keeps the set's delay.
    pub frame_delay_override: u32,
    /// True once a non-looping animation has played its last frame.
    pub finished: bool,
    /// Frozen frame clock.
    pub paused: bool,
    /// Keeps animating while the owning entity is suspended.
    pub ignore_suspend: bool,
    /// Blink period in ms; 0 when not blinking.
    pub blink_delay: u32,
    next_blink_date: u32,
    blink_visible: bool,
    /// Current opacity 0-255.
    pub alpha: i32,
    /// Per-tick alpha change while fading; 0 when not fading.
    pub alpha_delta: i32,
    /// Latch raised on every animation/frame change, consumed by
    /// pixel-collision queries to refresh their cached masks.
    pub has_frame_changed: bool,
}

impl Sprite {
    pub fn new(animation_set_id: impl Into<String>, animation: impl Into<String>) -> Self {
        Sprite {
            animation_set_id: animation_set_id.into(),
            animation: animation.into(),
            direction: 0,
            frame: 0,
            next_frame_date: 0,
            frame_delay_override: 0,
            finished: false,
            paused: false,
            ignore_suspend: false,
            blink_delay: 0,
            next_blink_date: 0,
            blink_visible: true,
            alpha: 255,
            alpha_delta: 0,
            has_frame_changed: false,
        }
    }

    /// Switch to another animation of the same set. Resets the frame to 0
    /// and raises the frame-changed latch. No-op when already current and
    /// still playing.
    pub fn set_animation(&mut self, animation: &str, now: u32, set: &AnimationSet) {
        if self.animation == animation && !self.finished {
            return;
        }
        self.animation = animation.to_string();
        self.frame = 0;
        self.finished = false;
        self.next_frame_date = now + self.frame_delay(set);
        self.has_frame_changed = true;
    }

    pub fn set_direction(&mut self, direction: i32) {
        if self.direction != direction {
            self.direction = direction;
            self.has_frame_changed = true;
        }
    }

    /// Restart the current animation from frame 0.
    pub fn restart(&mut self, now: u32, set: &AnimationSet) {
        self.frame = 0;
        self.finished = false;
        self.next_frame_date = now + self.frame_delay(set);
        self.has_frame_changed = true;
    }

    fn frame_delay(&self, set: &AnimationSet) -> u32 {
        if self.frame_delay_override > 0 {
            self.frame_delay_override
        } else {
            set.animation(&self.animation).frame_delay
        }
    }

    /// Advance the frame clock up to `now`. Returns true when the animation
    /// just finished this call.
    pub fn update(&mut self, now: u32, set: &AnimationSet) -> bool {
        let mut just_finished = false;
        let animation = set.animation(&self.animation);
        let nb_frames = animation.frame_count(self.direction);
        let delay = self.frame_delay(set);

        if !self.paused && !self.finished && delay > 0 {
            while now >= self.next_frame_date {
                let next = self.frame + 1;
                if next == nb_frames {
                    match animation.loop_on_frame {
                        Some(loop_frame) => self.frame = loop_frame,
                        None => {
                            self.finished = true;
                            just_finished = true;
                        }
                    }
                } else {
                    self.frame = next;
                }
                self.has_frame_changed = true;
                self.next_frame_date += delay;
                if self.finished {
                    break;
                }
            }
        }

        if self.blink_delay > 0 && now >= self.next_blink_date {
            self.blink_visible = !self.blink_visible;
            self.next_blink_date = now + self.blink_delay;
        }

        if self.alpha_delta != 0 {
            self.alpha = (self.alpha + self.alpha_delta).clamp(0, 255);
            if self.alpha == 0 || self.alpha == 255 {
                self.alpha_delta = 0;
            }
        }

        just_finished
    }

    /// Shift the frame clock by a suspension duration.
    pub fn shift_dates(&mut self, offset: u32) {
        self.next_frame_date += offset;
        if self.blink_delay > 0 {
            self.next_blink_date += offset;
        }
    }

    pub fn set_blinking(&mut self, delay: u32, now: u32) {
        self.blink_delay = delay;
        self.next_blink_date = now;
        if delay == 0 {
            self.blink_visible = true;
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.blink_delay > 0
    }

    /// Whether the sprite should be drawn this frame (blink phase + alpha).
    pub fn is_visible(&self) -> bool {
        self.blink_visible && self.alpha > 0
    }

    /// Start a fade: `delta` < 0 fades out, > 0 fades in.
    pub fn start_fade(&mut self, delta: i32) {
        self.alpha_delta = delta;
    }

    /// Consume the frame-changed latch.
    pub fn take_frame_changed(&mut self) -> bool {
        std::mem::replace(&mut self.has_frame_changed, false)
    }
}

/// The sprites of an entity, drawn in insertion order.
#[derive(Debug, Clone, Default, Component)]
pub struct SpriteSet {
    pub sprites: Vec<Sprite>,
}

impl SpriteSet {
    pub fn single(sprite: Sprite) -> Self {
        SpriteSet {
            sprites: vec![sprite],
        }
    }

    pub fn push(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    pub fn get(&self, animation_set_id: &str) -> Option<&Sprite> {
        self.sprites
            .iter()
            .find(|s| s.animation_set_id == animation_set_id)
    }

    pub fn get_mut(&mut self, animation_set_id: &str) -> Option<&mut Sprite> {
        self.sprites
            .iter_mut()
            .find(|s| s.animation_set_id == animation_set_id)
    }

    /// First sprite, the entity's main view.
    pub fn main(&self) -> Option<&Sprite> {
        self.sprites.first()
    }

    pub fn main_mut(&mut self) -> Option<&mut Sprite> {
        self.sprites.first_mut()
    }
}
