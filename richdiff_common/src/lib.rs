pub mod attributes;
pub mod config;
pub mod delta;
pub mod embed;
pub mod error;
pub mod text;
pub mod types;

pub use attributes::AttributeMap;
pub use config::*;
pub use delta::*;
pub use embed::*;
pub use error::*;
pub use types::*;
