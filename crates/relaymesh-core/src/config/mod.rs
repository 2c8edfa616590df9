//! Specification and settings loading

mod loader;
mod settings_loader;

pub use loader::{discover_sites, load_sites, SiteFile, SiteSource, SpecFormat};
pub use settings_loader::{apply_env_overrides, SettingsLoader, SETTINGS_FILE_NAME};
