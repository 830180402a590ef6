//! Configuration loaded from `agentwallet.toml`.

mod settings;

pub use settings::Settings;
