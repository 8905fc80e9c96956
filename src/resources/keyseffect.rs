//! Current effect of each game key.
//!
//! The HUD icons read these effects to know what to display, and the game
//! writes them per context: walking near a chest sets the action effect to
//! Open, starting a dialog overrides action/sword with Next/Skip. The
//! save/restore pair lets a transient mode stash the previous effects and
//! put them back when it ends.

use bevy_ecs::prelude::Resource;

/// What the action key would do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionKeyEffect {
    #[default]
    None,
    Validate,
    Next,
    Look,
    Open,
    Lift,
    Throw,
    Grab,
    Speak,
    Change,
    Swim,
}

/// What the sword key would do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwordKeyEffect {
    Hidden,
    #[default]
    None,
    Save,
    Skip,
    Sword,
}

/// What the pause key would do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseKeyEffect {
    #[default]
    Pause,
    Return,
    None,
}

/// Effects and enable flags for the five effect-carrying keys.
#[derive(Resource, Debug, Clone, Default)]
pub struct KeysEffect {
    pub action: ActionKeyEffect,
    pub sword: SwordKeyEffect,
    pub pause: PauseKeyEffect,
    pub action_enabled: bool,
    pub sword_enabled: bool,
    pub pause_enabled: bool,
    pub item_keys_enabled: bool,
    saved: Option<(ActionKeyEffect, SwordKeyEffect, PauseKeyEffect)>,
}

impl KeysEffect {
    pub fn new() -> Self {
        KeysEffect {
            action: ActionKeyEffect::None,
            sword: SwordKeyEffect::None,
            pause: PauseKeyEffect::Pause,
            action_enabled: true,
            sword_enabled: true,
            pause_enabled: true,
            item_keys_enabled: true,
            saved: None,
        }
    }

    pub fn has_action_effect(&self) -> bool {
        self.action != ActionKeyEffect::None
    }

    /// Stash the current effects before a transient mode takes over.
    pub fn save_effects(&mut self) {
        self.saved = Some((self.action, self.sword, self.pause));
    }

    /// Restore the effects stashed by [`save_effects`](Self::save_effects).
    pub fn restore_effects(&mut self) {
        if let Some((action, sword, pause)) = self.saved.take() {
            self.action = action;
            self.sword = sword;
            self.pause = pause;
        }
    }

    /// Disable every key at once (cutscenes, transitions).
    pub fn set_all_enabled(&mut self, enabled: bool) {
        self.action_enabled = enabled;
        self.sword_enabled = enabled;
        self.pause_enabled = enabled;
        self.item_keys_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_restore_round_trips() {
        let mut effects = KeysEffect::new();
        effects.action = ActionKeyEffect::Lift;
        effects.sword = SwordKeyEffect::Sword;
        effects.save_effects();
        effects.action = ActionKeyEffect::Next;
        effects.sword = SwordKeyEffect::Skip;
        effects.restore_effects();
        assert_eq!(effects.action, ActionKeyEffect::Lift);
        assert_eq!(effects.sword, SwordKeyEffect::Sword);
        // a second restore with nothing saved is a no-op
        effects.action = ActionKeyEffect::Open;
        effects.restore_effects();
        assert_eq!(effects.action, ActionKeyEffect::Open);
    }
}
