//! Event and message types exchanged across systems.
//!
//! Submodules:
//! - [`audio`] – commands and messages for the background audio thread
//! - [`detector`] – detector collision notifications
//! - [`input`] – logical game key presses and releases

pub mod audio;
pub mod detector;
pub mod input;
