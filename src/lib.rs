pub mod alias;
pub mod api;
pub mod catalog;
pub mod compat;
pub mod config;
pub mod error;
pub mod model;
pub mod modes;
pub mod references;
pub mod resolver;
pub mod schema;
pub mod uniqueness;
pub mod utils;

pub use api::{
    compatible_property_types, load_document, load_token_system, parse_document, resolve_value,
    validate_figma_file_key_uniqueness_across_all, validate_platform_extension,
    validate_theme_override_file, validate_token_system, ValidationReport,
};
pub use config::EngineConfig;
pub use error::TokenError;
pub use resolver::{ResolutionContext, ResolvedValue, Resolver};
