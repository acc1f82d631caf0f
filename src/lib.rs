pub mod action_tree;
pub mod actions;
pub mod autosave;
pub mod config_store;
pub mod floating;
pub mod foreground;
pub mod gui;
pub mod hotkey;
pub mod icons;
pub mod launcher;
pub mod logging;
pub mod paths;
pub mod quick_send;
pub mod settings;
