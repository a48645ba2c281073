//! Unix process and descriptor plumbing used by the supervisor.

pub mod fifo;
pub mod process;
pub mod redirect;

pub use fifo::{InputSource, classify_input};
pub use process::exec_replace;
pub use redirect::{SavedStderr, StdioBindings, open_append};
