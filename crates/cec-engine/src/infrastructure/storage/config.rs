//! TOML-based configuration for the engine binary.
//!
//! The file path is given on the command line; without one, or when the file
//! does not exist, the defaults below apply:
//!
//! ```toml
//! [engine]
//! osd_name = "cec-engine"
//! log_level = "info"
//!
//! [device]
//! logical_address = 5          # AudioSystem
//! device_type = "audio"
//! physical_address = "1.0.0.0"
//! vendor_id = 0x000000
//!
//! [debug]
//! history_size = 32            # 0 disables the message history, at most 65536
//! ```
//!
//! # Serde default values
//!
//! Every section and field carries a `#[serde(default ...)]` attribute, so a
//! file only needs the keys it wants to change.

use std::path::{Path, PathBuf};

use cec_core::protocol::codec::{is_valid_osd_name, is_valid_vendor_id};
use cec_core::{DeviceType, LogicalAddress, PhysicalAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::device::DeviceIdentity;
use crate::infrastructure::diagnostics::history::MAX_HISTORY_SIZE;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

/// Dispatch engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Name reported in answer to GiveOSDName; 1 to 14 printable ASCII characters.
    #[serde(default = "default_osd_name")]
    pub osd_name: String,
    /// `tracing` log level, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Identity of the emulated device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    #[serde(default = "default_logical_address")]
    pub logical_address: LogicalAddress,
    #[serde(default = "default_device_type")]
    pub device_type: DeviceType,
    /// Physical address in `a.b.c.d` form.
    #[serde(default = "default_physical_address")]
    pub physical_address: String,
    /// 24-bit vendor id.
    #[serde(default)]
    pub vendor_id: u32,
}

/// Diagnostics settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugConfig {
    /// Number of messages kept in the history; 0 disables it.  At most
    /// [`MAX_HISTORY_SIZE`].
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_osd_name() -> String {
    "cec-engine".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_logical_address() -> LogicalAddress {
    LogicalAddress::AUDIO_SYSTEM
}
fn default_device_type() -> DeviceType {
    DeviceType::Audio
}
fn default_physical_address() -> String {
    "1.0.0.0".to_string()
}
fn default_history_size() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            osd_name: default_osd_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            logical_address: default_logical_address(),
            device_type: default_device_type(),
            physical_address: default_physical_address(),
            vendor_id: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
        }
    }
}

impl AppConfig {
    /// Checks the values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_osd_name(self.engine.osd_name.as_bytes()) {
            return Err(ConfigError::InvalidValue {
                key: "engine.osd_name",
                reason: "must be 1 to 14 printable ASCII characters".to_string(),
            });
        }
        if self.debug.history_size > MAX_HISTORY_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "debug.history_size",
                reason: format!(
                    "{} exceeds the maximum of {MAX_HISTORY_SIZE}",
                    self.debug.history_size
                ),
            });
        }
        self.device.identity().map(|_| ())
    }
}

impl DeviceConfig {
    /// Builds the device identity, parsing the physical address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a malformed physical address,
    /// a vendor id wider than 24 bits, or the broadcast logical address.
    pub fn identity(&self) -> Result<DeviceIdentity, ConfigError> {
        let physical_address: PhysicalAddress =
            self.physical_address
                .parse()
                .map_err(|e: cec_core::protocol::ParseAddressError| ConfigError::InvalidValue {
                    key: "device.physical_address",
                    reason: e.to_string(),
                })?;
        if !is_valid_vendor_id(self.vendor_id) {
            return Err(ConfigError::InvalidValue {
                key: "device.vendor_id",
                reason: format!("0x{:X} does not fit in 24 bits", self.vendor_id),
            });
        }
        if self.logical_address.is_unregistered() {
            return Err(ConfigError::InvalidValue {
                key: "device.logical_address",
                reason: "15 is reserved for Unregistered/Broadcast".to_string(),
            });
        }
        Ok(DeviceIdentity {
            logical_address: self.logical_address,
            device_type: self.device_type,
            physical_address,
            vendor_id: self.vendor_id,
        })
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses and validates configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::InvalidValue`] for out-of-range values.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// plus everything [`parse_config`] returns.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_emulates_an_audio_system() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.engine.osd_name, "cec-engine");
        assert_eq!(cfg.engine.log_level, "info");
        assert_eq!(cfg.device.logical_address, LogicalAddress::AUDIO_SYSTEM);
        assert_eq!(cfg.device.device_type, DeviceType::Audio);
        assert_eq!(cfg.debug.history_size, 32);
    }

    #[test]
    fn test_default_config_is_valid() {
        let identity = AppConfig::default().device.identity().expect("defaults must be valid");
        assert_eq!(identity.physical_address, PhysicalAddress(0x1000));
        assert_eq!(identity.vendor_id, 0);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg = parse_config("").expect("empty TOML is valid");
        assert_eq!(cfg, AppConfig::default());
    }

    // ── Overrides ─────────────────────────────────────────────────────────────

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        // Arrange
        let toml_str = r#"
            [engine]
            osd_name = "Soundbar"

            [device]
            logical_address = 4
            device_type = "playback"
            physical_address = "2.1.0.0"
            vendor_id = 0x00E091

            [debug]
            history_size = 0
        "#;

        // Act
        let cfg = parse_config(toml_str).expect("valid config");

        // Assert
        assert_eq!(cfg.engine.osd_name, "Soundbar");
        assert_eq!(cfg.engine.log_level, "info");
        assert_eq!(cfg.device.logical_address, LogicalAddress::PLAYBACK_1);
        assert_eq!(cfg.device.device_type, DeviceType::Playback);
        assert_eq!(cfg.device.vendor_id, 0x00E091);
        assert_eq!(cfg.debug.history_size, 0);
        assert_eq!(
            cfg.device.identity().unwrap().physical_address,
            PhysicalAddress(0x2100)
        );
    }

    #[test]
    fn test_app_config_serializes_and_deserializes_round_trip() {
        let mut cfg = AppConfig::default();
        cfg.engine.osd_name = "Den TV".to_string();
        cfg.device.vendor_id = 0x18C086;

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_invalid_osd_name_is_rejected() {
        let err = parse_config("[engine]\nosd_name = \"a name that is too long\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "engine.osd_name", .. }));
    }

    #[test]
    fn test_invalid_physical_address_is_rejected() {
        let err = parse_config("[device]\nphysical_address = \"1.0.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "device.physical_address", .. }));
    }

    #[test]
    fn test_wide_vendor_id_is_rejected() {
        let err = parse_config("[device]\nvendor_id = 0x1000000\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "device.vendor_id", .. }));
    }

    #[test]
    fn test_unregistered_logical_address_is_rejected() {
        let err = parse_config("[device]\nlogical_address = 15\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "device.logical_address", .. }));
    }

    #[test]
    fn test_oversized_history_is_rejected() {
        // Arrange
        let toml_str = "[debug]\nhistory_size = 9223372036854775807\n";

        // Act
        let err = parse_config(toml_str).unwrap_err();

        // Assert
        assert!(matches!(err, ConfigError::InvalidValue { key: "debug.history_size", .. }));
    }

    #[test]
    fn test_largest_history_is_accepted() {
        let toml_str = format!("[debug]\nhistory_size = {MAX_HISTORY_SIZE}\n");
        let cfg = parse_config(&toml_str).expect("maximum history size is valid");
        assert_eq!(cfg.debug.history_size, MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_out_of_range_logical_address_is_rejected() {
        // 20 must not wrap to Playback1.
        let err = parse_config("[device]\nlogical_address = 20\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        assert!(matches!(parse_config("[engine"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("cec-engine-does-not-exist.toml");
        let cfg = load_config(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        let path = std::env::temp_dir()
            .join(format!("cec-engine-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[debug]\nhistory_size = 5\n").unwrap();

        let cfg = load_config(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.unwrap().debug.history_size, 5);
    }
}
