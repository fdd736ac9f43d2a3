use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;

/// Default location of the City database
pub const DEFAULT_DB_PATH: &str = "/usr/local/share/GeoIP/GeoIP2-City.mmdb";

/// Prefix for environment overrides, e.g. `GEOFEED_VERIFIER_DB_PATH`
pub const ENV_PREFIX: &str = "GEOFEED_VERIFIER";

pub struct VerifierConfig {
    /// Path to the City MMDB the geofeed is compared against
    pub db_path: String,

    /// Optional ISP/ASN MMDB used for per-ASN counts
    pub isp_path: Option<String>,

    /// Accept region codes without the country prefix
    pub lax: bool,
}

const EMPTY_CONFIG: &str = r#"### geofeed-verifier configuration file

### City database the geofeed is compared against
# db_path = "/usr/local/share/GeoIP/GeoIP2-City.mmdb"

### ISP or ASN database for per-ASN discrepancy counts (optional)
# isp_path = "/usr/local/share/GeoIP/GeoIP2-ISP.mmdb"

### accept region codes without the country prefix, e.g. "NY" instead of "US-NY"
# lax = false
"#;

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            isp_path: None,
            lax: false,
        }
    }
}

impl VerifierConfig {
    /// Function to create and initialize a new configuration
    ///
    /// An explicitly given file that does not exist is created from a
    /// commented template. Without a path, `$HOME/.geofeed-verifier.toml`
    /// is read when present.
    pub fn new(path: &Option<String>) -> Result<VerifierConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                if let Some(p) = Self::config_file_path() {
                    if Path::new(p.as_str()).exists() {
                        builder = builder.add_source(config::File::with_name(p.as_str()));
                    }
                }
            }
        }

        // E.g., `GEOFEED_VERIFIER_LAX=true geofeed-verifier ...` turns on lax mode
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Ok(Self::from_map(&config))
    }

    fn from_map(config: &HashMap<String, String>) -> VerifierConfig {
        let db_path = config
            .get("db_path")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let isp_path = config
            .get("isp_path")
            .filter(|p| !p.is_empty())
            .cloned();

        let lax = config
            .get("lax")
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        VerifierConfig {
            db_path,
            isp_path,
            lax,
        }
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("City Database:      {}", self.db_path),
            format!(
                "ISP Database:       {}",
                self.isp_path.as_deref().unwrap_or("(none)")
            ),
            format!("Lax Region Mode:    {}", self.lax),
        ]
        .join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> Option<String> {
        dirs::home_dir().map(|h| format!("{}/.geofeed-verifier.toml", h.to_string_lossy()))
    }
}
