//! The pause menu.
//!
//! Four submenus cycled with LEFT/RIGHT at the edges, an inventory cursor,
//! the item-to-slot assignment flight, and the save dialog made of two
//! sequential questions. While the menu is open it absorbs every key; the
//! logic lives in `systems::pause`, this resource is the state.

use bevy_ecs::prelude::Resource;

/// The four submenus, in LEFT/RIGHT order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseSubmenu {
    Inventory,
    Map,
    QuestStatus,
    Options,
}

impl PauseSubmenu {
    pub const ALL: [PauseSubmenu; 4] = [
        PauseSubmenu::Inventory,
        PauseSubmenu::Map,
        PauseSubmenu::QuestStatus,
        PauseSubmenu::Options,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap()
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }
}

/// Inventory grid dimensions.
pub const INVENTORY_ROWS: usize = 4;
pub const INVENTORY_COLUMNS: usize = 7;

/// The two sequential questions of the save dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDialogPhase {
    /// "Save the game?"
    SaveQuestion,
    /// "Keep playing?"
    ContinueQuestion,
}

#[derive(Debug, Clone)]
pub struct SaveDialog {
    pub phase: SaveDialogPhase,
    /// 0 = left answer, 1 = right answer.
    pub answer: usize,
}

/// An item icon flying from the inventory to an item slot.
#[derive(Debug, Clone)]
pub struct ItemFlight {
    pub item: String,
    pub slot: usize,
    pub x: i32,
    pub y: i32,
    pub target_x: i32,
    pub target_y: i32,
    pub next_move_date: u32,
}

impl ItemFlight {
    pub fn arrived(&self) -> bool {
        self.x == self.target_x && self.y == self.target_y
    }
}

/// The pause menu state.
#[derive(Resource, Debug, Clone)]
pub struct PauseMenu {
    pub open: bool,
    pub submenu: PauseSubmenu,
    pub inventory_row: usize,
    pub inventory_column: usize,
    /// Cursor in the options key list.
    pub options_cursor: usize,
    pub save_dialog: Option<SaveDialog>,
    pub item_flight: Option<ItemFlight>,
}

impl Default for PauseMenu {
    fn default() -> Self {
        PauseMenu {
            open: false,
            submenu: PauseSubmenu::Inventory,
            inventory_row: 0,
            inventory_column: 0,
            options_cursor: 0,
            save_dialog: None,
            item_flight: None,
        }
    }
}

impl PauseMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the neighbor submenu; returns true when it changed (a sound
    /// plays on each switch).
    pub fn switch_submenu(&mut self, delta: i32) -> bool {
        let index = (self.submenu.index() as i32 + delta).rem_euclid(4) as usize;
        let next = PauseSubmenu::from_index(index);
        if next != self.submenu {
            self.submenu = next;
            true
        } else {
            false
        }
    }

    /// Selected inventory cell as a flat index.
    pub fn inventory_index(&self) -> usize {
        self.inventory_row * INVENTORY_COLUMNS + self.inventory_column
    }

    pub fn move_inventory_cursor(&mut self, dx: i32, dy: i32) {
        self.inventory_column =
            (self.inventory_column as i32 + dx).rem_euclid(INVENTORY_COLUMNS as i32) as usize;
        self.inventory_row =
            (self.inventory_row as i32 + dy).rem_euclid(INVENTORY_ROWS as i32) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submenus_cycle_both_ways() {
        let mut pause = PauseMenu::new();
        assert!(pause.switch_submenu(-1));
        assert_eq!(pause.submenu, PauseSubmenu::Options);
        assert!(pause.switch_submenu(1));
        assert_eq!(pause.submenu, PauseSubmenu::Inventory);
    }

    #[test]
    fn inventory_cursor_wraps() {
        let mut pause = PauseMenu::new();
        pause.move_inventory_cursor(-1, 0);
        assert_eq!(pause.inventory_column, INVENTORY_COLUMNS - 1);
        pause.move_inventory_cursor(0, -1);
        assert_eq!(pause.inventory_row, INVENTORY_ROWS - 1);
    }
}
