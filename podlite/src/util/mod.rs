//! Process and filesystem helpers.

mod fs;
mod process;

pub use fs::dir_size;
pub use process::{ToolCommand, is_process_alive};
