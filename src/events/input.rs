//! Logical key messages.
//!
//! The input system translates low-level events through
//! [`Controls`](crate::resources::controls::Controls) and publishes one
//! [`GameKeyMessage`] per logical change. The orchestrator routes them to
//! the pause menu, the dialog box or the hero, in that priority order.

use bevy_ecs::message::Message;

use crate::resources::controls::GameKey;

/// A logical key went down or up this tick.
#[derive(Message, Debug, Clone, Copy)]
pub struct GameKeyMessage {
    pub key: GameKey,
    pub pressed: bool,
}

/// A logical key event routed to the hero: neither the pause menu nor the
/// dialog box claimed it.
#[derive(Message, Debug, Clone, Copy)]
pub struct HeroKeyMessage {
    pub key: GameKey,
    pub pressed: bool,
}

/// A logical key event routed to the dialog box.
#[derive(Message, Debug, Clone, Copy)]
pub struct DialogKeyMessage {
    pub key: GameKey,
    pub pressed: bool,
}

/// A logical key event routed to the pause menu.
#[derive(Message, Debug, Clone, Copy)]
pub struct PauseKeyMessage {
    pub key: GameKey,
    pub pressed: bool,
}
