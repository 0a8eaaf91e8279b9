pub mod constants;
pub mod core;
pub mod layout;
pub mod options;
pub(crate) mod rt_impl;
pub mod types;

pub use self::core::{ImageFsUsage, PodliteRuntime};
pub use options::{PodliteOptions, ToolOptions};
