//! Per-exchange settings resolution and their persistence.

mod debounce;
mod resolver;

pub use debounce::DebouncedSettingsWriter;
pub use resolver::{SessionSettingsResolver, SettingsLayer};
