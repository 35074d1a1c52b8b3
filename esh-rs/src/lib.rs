pub mod builtins;
pub mod cli;
pub mod completion;
pub mod config;
pub mod editor;
pub mod history;
pub mod input;
pub mod keybind;
pub mod logging;
pub mod parse;
pub mod shell;
pub mod terminal;
