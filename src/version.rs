// Build-time version from Cargo.toml

/// Package version (from Cargo.toml); reported as `integration_version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Name the published payload is registered under.
pub const INTEGRATION_NAME: &str = concat!("com.", env!("CARGO_PKG_NAME"), ".docker");
