pub mod input;
pub mod keys;
pub mod view;
pub mod viewport;

pub use input::{CONSOLE_CONTROL, Capabilities, CommandInput, InputHandler, Key, KeyDisposition};
pub use keys::{Interception, TerminalAction, TerminalKey, TerminalKeyCode};
pub use view::ConsoleView;
pub use viewport::ViewportFitter;
