//! Console configuration
//!
//! Settings come from three layers, later ones winning: the built-in
//! defaults, the user's TOML file (`~/.config/bmc-console/config.toml` or
//! `--config`) and command-line flags.

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, ConsoleSettings, EffectiveConfig, SCHEMA_ID,
    SCHEMA_VERSION,
};
pub use merge::{deep_merge, merge_layers};
