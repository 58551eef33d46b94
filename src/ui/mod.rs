// Console front-end

pub mod prompt;

pub use prompt::{LinePrompter, Prompter, TerminalPrompter};
