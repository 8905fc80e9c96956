//! HUD element states.
//!
//! The HUD is a fixed array of overlay elements. Each element keeps its
//! screen position, visibility, opacity and blink state here; the update
//! system feeds them from the equipment and the keys effects, and the
//! render system draws them. Counters do not jump to their target value:
//! the displayed number flows toward the real one a few units per tick,
//! with a repeating sound while it moves.

use bevy_ecs::prelude::Resource;

/// Per-kind state of a HUD element.
#[derive(Debug, Clone)]
pub enum HudElementKind {
    /// Hearts, in quarters; `displayed_life` flows toward the real value.
    HeartsView {
        displayed_life: u32,
        next_update_date: u32,
        /// Danger beep when life is at 25% or less.
        next_danger_sound_date: u32,
    },
    RupeesCounter {
        displayed: u32,
        next_update_date: u32,
    },
    MagicBar {
        displayed: u32,
        next_update_date: u32,
    },
    /// The two assignable item slots.
    ItemIcon { slot: usize },
    SwordIcon,
    PauseIcon,
    ActionIcon,
    SmallKeysCounter,
    FloorView,
}

/// One HUD overlay element.
#[derive(Debug, Clone)]
pub struct HudElement {
    pub kind: HudElementKind,
    pub x: i32,
    pub y: i32,
    pub visible: bool,
    /// 0-255; demoted to 96 when the hero walks under the HUD corner.
    pub opacity: i32,
    pub blink_delay: u32,
    next_blink_date: u32,
    blink_visible: bool,
}

impl HudElement {
    pub fn new(kind: HudElementKind, x: i32, y: i32) -> Self {
        HudElement {
            kind,
            x,
            y,
            visible: true,
            opacity: 255,
            blink_delay: 0,
            next_blink_date: 0,
            blink_visible: true,
        }
    }

    pub fn set_blinking(&mut self, delay: u32, now: u32) {
        self.blink_delay = delay;
        self.next_blink_date = now;
        if delay == 0 {
            self.blink_visible = true;
        }
    }

    pub fn update_blink(&mut self, now: u32) {
        if self.blink_delay > 0 && now >= self.next_blink_date {
            self.blink_visible = !self.blink_visible;
            self.next_blink_date = now + self.blink_delay;
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.visible && self.blink_visible && self.opacity > 0
    }
}

/// The HUD overlay.
#[derive(Resource, Debug, Clone)]
pub struct Hud {
    pub elements: Vec<HudElement>,
}

/// Screen region that demotes the HUD opacity when the hero is below it.
pub const HUD_CORNER_WIDTH: i32 = 120;
pub const HUD_CORNER_HEIGHT: i32 = 32;

impl Default for Hud {
    fn default() -> Self {
        Hud {
            elements: vec![
                HudElement::new(
                    HudElementKind::HeartsView {
                        displayed_life: 0,
                        next_update_date: 0,
                        next_danger_sound_date: 0,
                    },
                    8,
                    6,
                ),
                HudElement::new(
                    HudElementKind::RupeesCounter {
                        displayed: 0,
                        next_update_date: 0,
                    },
                    8,
                    222,
                ),
                HudElement::new(
                    HudElementKind::MagicBar {
                        displayed: 0,
                        next_update_date: 0,
                    },
                    8,
                    18,
                ),
                HudElement::new(HudElementKind::ItemIcon { slot: 0 }, 265, 8),
                HudElement::new(HudElementKind::ItemIcon { slot: 1 }, 296, 8),
                HudElement::new(HudElementKind::SwordIcon, 0, 0),
                HudElement::new(HudElementKind::PauseIcon, 0, 24),
                HudElement::new(HudElementKind::ActionIcon, 0, 48),
                HudElement::new(HudElementKind::SmallKeysCounter, 284, 222),
                HudElement::new(HudElementKind::FloorView, 5, 70),
            ],
        }
    }
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step a displayed counter toward its target: rupees move 1, 5 or 20
    /// per step depending on the gap. Returns the new value and whether a
    /// step was taken.
    pub fn counter_step(displayed: u32, target: u32) -> u32 {
        let gap = target.abs_diff(displayed);
        let step = if gap >= 100 {
            20
        } else if gap >= 10 {
            5
        } else {
            1
        };
        if target > displayed {
            displayed + step.min(gap)
        } else {
            displayed - step.min(gap)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_flows_with_growing_steps() {
        assert_eq!(Hud::counter_step(0, 3), 1);
        assert_eq!(Hud::counter_step(0, 50), 5);
        assert_eq!(Hud::counter_step(0, 250), 20);
        assert_eq!(Hud::counter_step(250, 0), 230);
        // never overshoots
        assert_eq!(Hud::counter_step(48, 50), 50);
    }
}
