pub mod algorithm;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod template;
pub mod traits;

pub mod prelude {
    pub use super::algorithm::{HashAlgorithm, digest, hashers};
    pub use super::config::*;
    pub use super::engine::*;
    pub use super::error::*;
    pub use super::manifest::*;
    pub use super::registry::*;
    pub use super::template::{TemplateVars, file_parts, render};
    pub use super::traits::*;
}
