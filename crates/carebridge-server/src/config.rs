use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// External authentication authority settings
    #[serde(default)]
    pub auth: AuthSettings,
    /// Realtime session tuning
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Caregivers loaded into the directory at startup
    #[serde(default)]
    pub seed: SeedConfig,
}

// Default derived via field defaults

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Auth validation - the authority is required, tokens cannot be
        // verified locally
        if self.auth.provider_url.trim().is_empty() {
            return Err("auth.provider_url must be set".into());
        }
        if self.auth.api_key.trim().is_empty() {
            return Err("auth.api_key must be set".into());
        }
        // Realtime validation
        if self.realtime.session_buffer == 0 {
            return Err("realtime.session_buffer must be > 0".into());
        }
        if self.realtime.heartbeat_secs == 0 {
            return Err("realtime.heartbeat_secs must be > 0".into());
        }
        // Seed validation
        for caregiver in &self.seed.caregivers {
            if caregiver.subject_id.trim().is_empty() {
                return Err("seed.caregivers entries require a subject_id".into());
            }
            if caregiver.email.trim().is_empty() {
                return Err(format!(
                    "seed caregiver '{}' requires an email",
                    caregiver.subject_id
                ));
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Settings for the external authentication authority.
///
/// The server never issues tokens; it forwards presented credentials to the
/// authority at `provider_url` for verification.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    /// Base URL of the authority, e.g. `https://project.example.co`
    #[serde(default)]
    pub provider_url: String,
    /// Project API key sent with every verification request
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound messages buffered per session; a full buffer drops the
    /// message for that session only.
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
    /// Seconds between server-initiated heartbeat pings.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

fn default_session_buffer() -> usize {
    32
}
fn default_heartbeat_secs() -> u64 {
    25
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            session_buffer: default_session_buffer(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Caregivers inserted into the directory at startup.
///
/// Account provisioning belongs to the external authority, so known
/// caregiver records arrive through configuration instead of a signup
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub caregivers: Vec<SeedCaregiver>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCaregiver {
    /// User id the authority reports for this caregiver's tokens.
    pub subject_id: String,
    pub name: String,
    pub email: String,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Load configuration from an optional TOML file plus environment
    /// overrides, e.g. `CAREBRIDGE__SERVER__PORT=8080`.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("carebridge.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("CAREBRIDGE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
