//! Forwarder configuration.
//!
//! Settings are read from a file (TOML, JSON, YAML... chosen by extension)
//! and then overridden by `NDNFW_*` environment variables, e.g.
//! `NDNFW_CS_CAPACITY=500`. Anything not given keeps its default.

use config::{Config, Environment, File};
use ndnfw_common::ndn::DEFAULT_INTEREST_LIFETIME;
use ndnfw_common::{Error, FaceId, Name, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables of the forwarding pipeline and its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Grace period between satisfaction/rejection and PIT entry erasure
    pub straggler_time_ms: u64,

    /// How long a forwarded nonce stays in the Dead Nonce List
    pub dead_nonce_lifetime_ms: u64,

    /// Maximum Dead Nonce List entries
    pub dead_nonce_capacity: usize,

    /// Maximum cached Data packets
    pub cs_capacity: usize,

    /// Lifetime assumed for Interests that carry none
    pub default_interest_lifetime_ms: u64,

    /// Static FIB entries installed at startup
    pub routes: Vec<RouteConfig>,
}

/// One static FIB next hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Name prefix in URI form
    pub prefix: String,

    /// Face id of the next hop
    pub face: u32,

    #[serde(default)]
    pub cost: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            straggler_time_ms: 100,
            dead_nonce_lifetime_ms: 6000,
            dead_nonce_capacity: crate::dead_nonce_list::DEFAULT_CAPACITY,
            cs_capacity: crate::cs::DEFAULT_CAPACITY,
            default_interest_lifetime_ms: DEFAULT_INTEREST_LIFETIME.as_millis() as u64,
            routes: Vec::new(),
        }
    }
}

impl ForwarderConfig {
    /// Loads `path`, layered under the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(Some(path.as_ref()))
    }

    /// Defaults layered under the environment, without a file.
    pub fn from_env() -> Result<Self> {
        Self::build(None)
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("NDNFW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.dead_nonce_lifetime_ms == 0 {
            return Err(Error::Config("dead_nonce_lifetime_ms must be positive".into()));
        }
        if self.default_interest_lifetime_ms == 0 {
            return Err(Error::Config("default_interest_lifetime_ms must be positive".into()));
        }
        self.parsed_routes().map(|_| ())
    }

    pub fn straggler_time(&self) -> Duration {
        Duration::from_millis(self.straggler_time_ms)
    }

    pub fn dead_nonce_lifetime(&self) -> Duration {
        Duration::from_millis(self.dead_nonce_lifetime_ms)
    }

    pub fn default_interest_lifetime(&self) -> Duration {
        Duration::from_millis(self.default_interest_lifetime_ms)
    }

    /// The static routes with their prefixes parsed.
    pub fn parsed_routes(&self) -> Result<Vec<(Name, FaceId, u64)>> {
        self.routes
            .iter()
            .map(|route| {
                let prefix = Name::from_uri(&route.prefix)?;
                let face = FaceId(route.face);
                if !face.is_valid() {
                    return Err(Error::Config(format!("route {}: invalid face id", route.prefix)));
                }
                Ok((prefix, face, route.cost))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(ext: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(ext).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ForwarderConfig::default();
        assert_eq!(config.straggler_time(), Duration::from_millis(100));
        assert_eq!(config.dead_nonce_lifetime(), Duration::from_secs(6));
        assert_eq!(config.default_interest_lifetime(), Duration::from_secs(4));
        assert!(config.routes.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_with_partial_fields() {
        let file = write_config(
            ".toml",
            r#"
cs_capacity = 16
straggler_time_ms = 50

[[routes]]
prefix = "/example"
face = 300
cost = 10

[[routes]]
prefix = "/"
face = 301
"#,
        );

        let config = ForwarderConfig::load(file.path()).unwrap();
        assert_eq!(config.cs_capacity, 16);
        assert_eq!(config.straggler_time_ms, 50);
        assert_eq!(config.dead_nonce_lifetime_ms, 6000);

        let routes = config.parsed_routes().unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0], (Name::from_string("/example"), FaceId(300), 10));
        assert_eq!(routes[1], (Name::new(), FaceId(301), 0));
    }

    #[test]
    fn test_load_json() {
        let file = write_config(".json", r#"{ "dead_nonce_capacity": 8 }"#);
        let config = ForwarderConfig::load(file.path()).unwrap();
        assert_eq!(config.dead_nonce_capacity, 8);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = write_config(".toml", "dead_nonce_lifetime_ms = 0\n");
        assert!(matches!(ForwarderConfig::load(file.path()), Err(Error::Config(_))));

        let mut config = ForwarderConfig::default();
        config.routes.push(RouteConfig {
            prefix: "/bad%zz".into(),
            face: 300,
            cost: 0,
        });
        assert!(matches!(config.validate(), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ForwarderConfig::load("/nonexistent/ndnfw.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
