pub mod config;
pub mod date_handling;
pub mod duration_humanize;
pub mod redaction;
pub mod url_building;

pub use config::{ConfigError, OrcaConfig};
pub use date_handling::{format_locale_timestamp, format_optional_timestamp};
pub use duration_humanize::humanize_duration;
pub use redaction::{REDACTED, redact_secret, redact_sensitive};
pub use url_building::{build_path, build_url, resolve_route};
