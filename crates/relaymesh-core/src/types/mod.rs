//! Type definitions for site specifications and runtime settings

mod settings;
mod site;

pub use settings::*;
pub use site::*;
