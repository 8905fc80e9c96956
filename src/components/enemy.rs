//! Enemies.
//!
//! The engine implements the generic enemy contract: life, attack/defense
//! arithmetic, hurt and immobilized phases, ranks and the optional saved
//! "already killed" flag. Breed-specific behavior belongs to per-map data
//! and scripts, not to the engine.

use bevy_ecs::prelude::Component;

use crate::resources::mapdata::TreasureData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyRank {
    #[default]
    Normal,
    Miniboss,
    Boss,
}

impl EnemyRank {
    pub fn parse(name: &str) -> Self {
        match name {
            "" | "normal" => EnemyRank::Normal,
            "miniboss" => EnemyRank::Miniboss,
            "boss" => EnemyRank::Boss,
            other => panic!("unknown enemy rank '{other}'"),
        }
    }
}

/// What the hero's attacks are doing to the enemy right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyLifePhase {
    Normal,
    /// Flashing and pushed back after a hit.
    Hurt { until: u32 },
    /// Stunned by a spin attack on a protected enemy.
    Immobilized { until: u32 },
    /// Life exhausted, playing the kill animation.
    Dying { until: u32 },
}

/// A generic enemy.
#[derive(Debug, Clone, Component)]
pub struct Enemy {
    pub breed: String,
    pub rank: EnemyRank,
    pub life: i32,
    /// Contact damage in life quarters, before the tunic divisor.
    pub attack: u32,
    /// Subtracted from sword damage.
    pub defense: u32,
    pub phase: EnemyLifePhase,
    /// Blinking invulnerability window after a hit.
    pub invulnerable_until: u32,
    /// Custom boolean remembering a unique kill.
    pub savegame_variable: Option<usize>,
    pub treasure: Option<TreasureData>,
    /// A disabled enemy neither updates, detects nor blocks.
    pub enabled: bool,
}

impl Enemy {
    pub fn new(breed: impl Into<String>, rank: EnemyRank) -> Self {
        Enemy {
            breed: breed.into(),
            rank,
            life: 1,
            attack: 2,
            defense: 0,
            phase: EnemyLifePhase::Normal,
            invulnerable_until: 0,
            savegame_variable: None,
            treasure: None,
            enabled: true,
        }
    }

    pub fn is_in_normal_phase(&self) -> bool {
        self.phase == EnemyLifePhase::Normal
    }

    /// Apply a sword hit: `base_damage × state factor − defense`, floored
    /// at 1 when the attack connects at all.
    pub fn hurt_by_sword(&mut self, sword_level: u32, damage_factor: u32, now: u32) -> i32 {
        let base = sword_level * damage_factor;
        let damage = (base as i32 - self.defense as i32).max(1);
        self.life -= damage;
        if self.life <= 0 {
            self.phase = EnemyLifePhase::Dying { until: now + 300 };
        } else {
            self.phase = EnemyLifePhase::Hurt { until: now + 300 };
            self.invulnerable_until = now + 500;
        }
        damage
    }
}
