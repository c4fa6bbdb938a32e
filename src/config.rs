//! Runtime configuration for the BACnet stack
//!
//! This module collects the handful of environment-style options the core
//! stack consults: TSM retry/timeout behaviour, BACnet/IP and BBMD defaults,
//! and MS/TP port parameters. None of these are read from a file format —
//! callers construct a [`BacnetConfig`] directly, or populate one from
//! environment variables with [`BacnetConfig::from_env`] under `std`.

#[cfg(not(feature = "std"))]
use alloc::string::String;

/// Default BACnet/IP UDP port (0xBAC0).
pub const DEFAULT_BIP_PORT: u16 = 0xBAC0;

/// Default APDU timeout, milliseconds, per ASHRAE 135 Clause 5.
pub const DEFAULT_APDU_TIMEOUT_MS: u32 = 3_000;

/// Default APDU retry count.
pub const DEFAULT_APDU_RETRIES: u8 = 3;

/// Default BBMD/foreign-device registration lifetime, seconds.
pub const DEFAULT_BBMD_TTL_SECONDS: u16 = 60;

/// Supported MS/TP baud rates.
pub const MSTP_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 76800, 115200];

/// Recognised environment-style configuration for the stack.
///
/// Mirrors the table in the external interfaces section of the spec this
/// crate implements: each field is independently overridable and every
/// field has an ASHRAE-sane default.
#[derive(Debug, Clone, PartialEq)]
pub struct BacnetConfig {
    /// TSM request timer reload value, milliseconds.
    pub apdu_timeout_ms: u32,
    /// TSM retry cap before a transaction is abandoned.
    pub apdu_retries: u8,
    /// UDP port used for BACnet/IP and BVLC traffic.
    pub bip_port: u16,
    /// UDP port the BBMD listens on (usually equal to `bip_port`).
    pub bbmd_port: u16,
    /// Foreign-device registration lifetime advertised/accepted by the BBMD.
    pub bbmd_time_to_live_seconds: u16,
    /// Optional well-known BBMD address to register with as a foreign device.
    pub bbmd_address: Option<String>,
    /// This node's MS/TP MAC address (0-127 for a master).
    pub mstp_mac: u8,
    /// Highest master address polled for on the MS/TP segment (<= 127).
    pub mstp_max_master: u8,
    /// Maximum frames transmitted per token hold (>= 1).
    pub mstp_max_info_frames: u8,
    /// MS/TP baud rate; must be one of [`MSTP_BAUD_RATES`].
    pub mstp_baud: u32,
}

impl Default for BacnetConfig {
    fn default() -> Self {
        Self {
            apdu_timeout_ms: DEFAULT_APDU_TIMEOUT_MS,
            apdu_retries: DEFAULT_APDU_RETRIES,
            bip_port: DEFAULT_BIP_PORT,
            bbmd_port: DEFAULT_BIP_PORT,
            bbmd_time_to_live_seconds: DEFAULT_BBMD_TTL_SECONDS,
            bbmd_address: None,
            mstp_mac: 0,
            mstp_max_master: 127,
            mstp_max_info_frames: 1,
            mstp_baud: 38400,
        }
    }
}

impl BacnetConfig {
    /// Validate the configuration against the invariants the rest of the
    /// stack assumes (MS/TP address bounds, known baud rate, at least one
    /// info frame per token hold).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mstp_mac > 127 {
            return Err(ConfigError::InvalidMstpMac(self.mstp_mac));
        }
        if self.mstp_max_master > 127 {
            return Err(ConfigError::InvalidMaxMaster(self.mstp_max_master));
        }
        if self.mstp_mac > self.mstp_max_master {
            return Err(ConfigError::InvalidMaxMaster(self.mstp_max_master));
        }
        if self.mstp_max_info_frames < 1 {
            return Err(ConfigError::InvalidMaxInfoFrames);
        }
        if !MSTP_BAUD_RATES.contains(&self.mstp_baud) {
            return Err(ConfigError::InvalidBaudRate(self.mstp_baud));
        }
        Ok(())
    }

    /// Populate a configuration from environment variables, falling back to
    /// [`Default`] for anything unset or unparsable.
    #[cfg(feature = "std")]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("BACNET_APDU_TIMEOUT_MS") {
            if let Ok(v) = v.parse() {
                config.apdu_timeout_ms = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_APDU_RETRIES") {
            if let Ok(v) = v.parse() {
                config.apdu_retries = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_BIP_PORT") {
            if let Ok(v) = v.parse() {
                config.bip_port = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_BBMD_PORT") {
            if let Ok(v) = v.parse() {
                config.bbmd_port = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_BBMD_TTL_SECONDS") {
            if let Ok(v) = v.parse() {
                config.bbmd_time_to_live_seconds = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_BBMD_ADDRESS") {
            config.bbmd_address = Some(v);
        }
        if let Ok(v) = std::env::var("BACNET_MSTP_MAC") {
            if let Ok(v) = v.parse() {
                config.mstp_mac = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_MSTP_MAX_MASTER") {
            if let Ok(v) = v.parse() {
                config.mstp_max_master = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_MSTP_MAX_INFO_FRAMES") {
            if let Ok(v) = v.parse() {
                config.mstp_max_info_frames = v;
            }
        }
        if let Ok(v) = std::env::var("BACNET_MSTP_BAUD") {
            if let Ok(v) = v.parse() {
                config.mstp_baud = v;
            }
        }
        config
    }
}

/// Errors raised by [`BacnetConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    InvalidMstpMac(u8),
    InvalidMaxMaster(u8),
    InvalidMaxInfoFrames,
    InvalidBaudRate(u32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::InvalidMstpMac(v) => write!(f, "MS/TP MAC address {} out of range (0-127)", v),
            ConfigError::InvalidMaxMaster(v) => {
                write!(f, "invalid max_master {} (must be >= this_station and <= 127)", v)
            }
            ConfigError::InvalidMaxInfoFrames => write!(f, "max_info_frames must be at least 1"),
            ConfigError::InvalidBaudRate(v) => write!(f, "unsupported MS/TP baud rate {}", v),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(BacnetConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_mac_above_max_master() {
        let mut config = BacnetConfig::default();
        config.mstp_mac = 10;
        config.mstp_max_master = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_baud() {
        let mut config = BacnetConfig::default();
        config.mstp_baud = 1234;
        assert!(config.validate().is_err());
    }
}
