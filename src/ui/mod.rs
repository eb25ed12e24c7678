pub mod interface;
pub mod theme;
pub mod components;

pub use interface::{key_to_command, Command, GameInterface};
pub use theme::{Theme, ThemeManager};
pub use components::*;
