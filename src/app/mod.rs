mod actions;
mod keyboard_input;
mod studio;


pub use actions::{help_text, StudioAction};
pub use keyboard_input::KeyboardInputHandler;
pub use studio::{Flow, Studio};
