//! Pushable and pullable blocks.

use bevy_ecs::prelude::Component;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSubtype {
    Normal,
    /// A statue can also be pulled.
    Statue,
}

impl BlockSubtype {
    pub fn parse(name: &str) -> Self {
        match name {
            "normal" => BlockSubtype::Normal,
            "statue" => BlockSubtype::Statue,
            other => panic!("unknown block subtype '{other}'"),
        }
    }
}

/// A block the hero moves by pushing (and pulling, for statues).
#[derive(Debug, Clone, Component)]
pub struct Block {
    pub subtype: BlockSubtype,
    /// Only this 4-direction may move the block; -1 for any.
    pub direction: i32,
    /// Moves left; `None` means unlimited.
    pub moves_remaining: Option<u32>,
    /// Date before which the block refuses to move again.
    pub when_can_move: u32,
    /// Initial position, restored by `block_reset`.
    pub initial_position: Point,
    pub initial_moves: Option<u32>,
}

/// Cooldown after a blocked or finished move, in ms.
pub const BLOCK_MOVE_COOLDOWN: u32 = 2000;

impl Block {
    pub fn new(
        subtype: BlockSubtype,
        direction: i32,
        maximum_moves: u32,
        initial_position: Point,
    ) -> Self {
        // 0: immovable, 1: once, 2: unlimited
        let moves = match maximum_moves {
            0 => Some(0),
            1 => Some(1),
            _ => None,
        };
        Block {
            subtype,
            direction,
            moves_remaining: moves,
            when_can_move: 0,
            initial_position,
            initial_moves: moves,
        }
    }

    pub fn can_move(&self, direction4: i32, now: u32) -> bool {
        if self.direction != -1 && direction4 != self.direction {
            return false;
        }
        if now < self.when_can_move {
            return false;
        }
        self.moves_remaining != Some(0)
    }

    /// Consume one move after a successful 16-pixel displacement.
    pub fn consume_move(&mut self) {
        if let Some(moves) = &mut self.moves_remaining {
            *moves = moves.saturating_sub(1);
        }
    }

    pub fn reset(&mut self) {
        self.moves_remaining = self.initial_moves;
        self.when_can_move = 0;
    }
}
