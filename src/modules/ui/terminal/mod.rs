pub mod renderer;

pub use renderer::{StdinPrompt, TerminalRenderer};
