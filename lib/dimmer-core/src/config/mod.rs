mod config;
mod config_serializer;

pub use config::*;
pub use config_serializer::{documented_yaml, serialize_config};
