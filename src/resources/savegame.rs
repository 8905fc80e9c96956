//! Saved game data.
//!
//! The savegame is a fixed 16 KB block: 64 reserved strings of 64 bytes,
//! 1024 reserved 32-bit integers used by the engine, then 1024 custom
//! integers and 32768 packed custom booleans owned by the map scripts. The
//! block is loaded once at game creation, mutated in memory and written back
//! on explicit save. Index numbers are version-stable: do not renumber.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bevy_ecs::prelude::Resource;

/// Reserved string indices.
pub mod strings {
    pub const PLAYER_NAME: usize = 0;
    /// Id of the map to load when the game starts.
    pub const STARTING_MAP: usize = 1;
    /// Destination point the hero appears on.
    pub const STARTING_POINT: usize = 2;
    /// Joypad binding of each game key, 9 consecutive strings.
    pub const JOYPAD_ACTION: usize = 40;
}

/// Reserved integer indices.
pub mod ints {
    pub const STARTING_MAP: usize = 0;
    pub const STARTING_ENTRANCE: usize = 1;
    pub const PAUSE_LAST_SUBMENU: usize = 2;
    pub const INVENTORY_LAST_ROW: usize = 3;
    pub const INVENTORY_LAST_COLUMN: usize = 4;
    pub const ITEM_SLOT_1: usize = 5;
    pub const ITEM_SLOT_2: usize = 6;

    pub const CURRENT_LIFE: usize = 10;
    pub const CURRENT_RUPEES: usize = 11;
    pub const CURRENT_MAGIC: usize = 12;
    pub const CURRENT_BOMBS: usize = 13;
    pub const CURRENT_ARROWS: usize = 14;

    pub const MAX_HEARTS: usize = 20;
    pub const MAX_RUPEES: usize = 21;
    pub const MAX_MAGIC: usize = 22;
    pub const MAX_BOMBS: usize = 23;
    pub const MAX_ARROWS: usize = 24;

    pub const PIECES_OF_HEART: usize = 30;
    pub const TUNIC: usize = 31;
    pub const SHIELD: usize = 32;
    pub const SWORD: usize = 33;

    /// Keyboard binding of each game key, 9 consecutive integers.
    pub const KEYBOARD_ACTION: usize = 40;

    pub const FIRST_PIECE_OF_HEART: usize = 100;
    pub const LAST_PIECE_OF_HEART: usize = 143;
}

const NB_STRINGS: usize = 64;
const STRING_LEN: usize = 64;
const NB_INTEGERS: usize = 1024;
const NB_CUSTOM_INTEGERS: usize = 1024;
const NB_CUSTOM_BOOLEAN_WORDS: usize = 1024;
/// Total size of the block on disk.
pub const SAVEGAME_SIZE: usize =
    NB_STRINGS * STRING_LEN + 4 * (NB_INTEGERS + NB_CUSTOM_INTEGERS + NB_CUSTOM_BOOLEAN_WORDS);

/// The in-memory savegame block.
#[derive(Resource, Clone)]
pub struct Savegame {
    file_name: PathBuf,
    empty: bool,
    reserved_strings: Vec<[u8; STRING_LEN]>,
    reserved_integers: Vec<u32>,
    custom_integers: Vec<u32>,
    custom_booleans: Vec<u32>,
}

impl Savegame {
    /// Load the savegame from `file_name`, or create a fresh one with
    /// default values when the file does not exist.
    pub fn load(file_name: impl Into<PathBuf>) -> Result<Self> {
        let file_name = file_name.into();
        let mut savegame = Savegame {
            file_name: file_name.clone(),
            empty: true,
            reserved_strings: vec![[0u8; STRING_LEN]; NB_STRINGS],
            reserved_integers: vec![0; NB_INTEGERS],
            custom_integers: vec![0; NB_CUSTOM_INTEGERS],
            custom_booleans: vec![0; NB_CUSTOM_BOOLEAN_WORDS],
        };

        if file_name.exists() {
            let bytes = std::fs::read(&file_name)
                .with_context(|| format!("cannot read savegame {}", file_name.display()))?;
            savegame.read_block(&bytes)?;
            savegame.empty = false;
        } else {
            savegame.set_default_values();
        }
        Ok(savegame)
    }

    /// A savegame that never touches the filesystem, for tests and demos.
    pub fn in_memory() -> Self {
        let mut savegame = Savegame {
            file_name: PathBuf::new(),
            empty: true,
            reserved_strings: vec![[0u8; STRING_LEN]; NB_STRINGS],
            reserved_integers: vec![0; NB_INTEGERS],
            custom_integers: vec![0; NB_CUSTOM_INTEGERS],
            custom_booleans: vec![0; NB_CUSTOM_BOOLEAN_WORDS],
        };
        savegame.set_default_values();
        savegame
    }

    fn set_default_values(&mut self) {
        self.set_reserved_integer(ints::MAX_HEARTS, 3);
        self.set_reserved_integer(ints::CURRENT_LIFE, 12);
        self.set_reserved_integer(ints::MAX_RUPEES, 99);
        self.set_reserved_integer(ints::TUNIC, 1);
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    fn read_block(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != SAVEGAME_SIZE {
            bail!(
                "savegame has {} bytes, expected {}",
                bytes.len(),
                SAVEGAME_SIZE
            );
        }
        let mut offset = 0;
        for s in self.reserved_strings.iter_mut() {
            s.copy_from_slice(&bytes[offset..offset + STRING_LEN]);
            offset += STRING_LEN;
        }
        for dst in [
            &mut self.reserved_integers,
            &mut self.custom_integers,
            &mut self.custom_booleans,
        ] {
            for v in dst.iter_mut() {
                *v = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
                offset += 4;
            }
        }
        Ok(())
    }

    fn write_block(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SAVEGAME_SIZE);
        for s in &self.reserved_strings {
            bytes.extend_from_slice(s);
        }
        for src in [
            &self.reserved_integers,
            &self.custom_integers,
            &self.custom_booleans,
        ] {
            for v in src.iter() {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        bytes
    }

    /// Write the block to disk. The caller surfaces a failure to the player;
    /// the engine stays runnable.
    pub fn save(&mut self) -> Result<()> {
        let bytes = self.write_block();
        std::fs::write(&self.file_name, bytes)
            .with_context(|| format!("cannot write savegame {}", self.file_name.display()))?;
        self.empty = false;
        Ok(())
    }

    pub fn get_reserved_string(&self, index: usize) -> &str {
        let raw = &self.reserved_strings[index];
        let end = raw.iter().position(|b| *b == 0).unwrap_or(STRING_LEN);
        std::str::from_utf8(&raw[..end]).unwrap_or("")
    }

    pub fn set_reserved_string(&mut self, index: usize, value: &str) {
        let dst = &mut self.reserved_strings[index];
        dst.fill(0);
        let n = value.len().min(STRING_LEN - 1);
        dst[..n].copy_from_slice(&value.as_bytes()[..n]);
    }

    pub fn get_reserved_integer(&self, index: usize) -> u32 {
        self.reserved_integers[index]
    }

    pub fn set_reserved_integer(&mut self, index: usize, value: u32) {
        self.reserved_integers[index] = value;
    }

    /// Custom integers, the script-visible number space.
    pub fn get_integer(&self, index: usize) -> u32 {
        self.custom_integers[index]
    }

    pub fn set_integer(&mut self, index: usize, value: u32) {
        self.custom_integers[index] = value;
    }

    /// Custom booleans, packed 32 per word.
    pub fn get_boolean(&self, index: usize) -> bool {
        let mask = 1u32 << (index % 32);
        self.custom_booleans[index / 32] & mask != 0
    }

    pub fn set_boolean(&mut self, index: usize, value: bool) {
        let mask = 1u32 << (index % 32);
        if value {
            self.custom_booleans[index / 32] |= mask;
        } else {
            self.custom_booleans[index / 32] &= !mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_round_trips() {
        let mut savegame = Savegame::in_memory();
        savegame.set_reserved_string(strings::PLAYER_NAME, "Ember");
        savegame.set_reserved_integer(ints::CURRENT_RUPEES, 137);
        savegame.set_integer(12, 99);
        savegame.set_boolean(5, true);
        savegame.set_boolean(32767, true);

        let bytes = savegame.write_block();
        assert_eq!(bytes.len(), SAVEGAME_SIZE);

        let mut copy = Savegame::in_memory();
        copy.read_block(&bytes).unwrap();
        assert_eq!(copy.get_reserved_string(strings::PLAYER_NAME), "Ember");
        assert_eq!(copy.get_reserved_integer(ints::CURRENT_RUPEES), 137);
        assert_eq!(copy.get_integer(12), 99);
        assert!(copy.get_boolean(5));
        assert!(copy.get_boolean(32767));
        assert!(!copy.get_boolean(6));
    }

    #[test]
    fn booleans_do_not_clobber_neighbors() {
        let mut savegame = Savegame::in_memory();
        savegame.set_boolean(64, true);
        savegame.set_boolean(65, true);
        savegame.set_boolean(64, false);
        assert!(!savegame.get_boolean(64));
        assert!(savegame.get_boolean(65));
    }
}
