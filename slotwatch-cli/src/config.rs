//! TOML configuration file carrying the operator's login details.

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use slotwatch_core::{LoginDetails, Mobile};

/// Top-level configuration file shape.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Driver identity submitted at login.
    pub ndls: NdlsConfig,
    /// Seconds to wait between polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// The `[ndls]` table.
#[derive(Debug, Deserialize)]
pub struct NdlsConfig {
    pub driver_number: String,
    /// Date of birth, `DD/MM/YYYY`.
    pub dob: String,
    pub mobile: MobileConfig,
    pub email: String,
    /// Only "email" is supported by the booking form integration.
    #[serde(default = "default_preferred_contact")]
    pub preferred_contact: String,
}

/// The `[ndls.mobile]` table.
#[derive(Debug, Deserialize)]
pub struct MobileConfig {
    pub prefix: String,
    pub postfix: String,
}

impl Config {
    /// Read and decode the configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Build the login details handed to the booking client. Constructed
    /// once here at the boundary; the core never reads configuration.
    #[must_use]
    pub fn login_details(&self) -> LoginDetails {
        LoginDetails {
            driver_number: self.ndls.driver_number.clone(),
            dob: self.ndls.dob.clone(),
            mobile: Mobile {
                prefix: self.ndls.mobile.prefix.clone(),
                postfix: self.ndls.mobile.postfix.clone(),
            },
            email: self.ndls.email.clone(),
            preferred_contact: self.ndls.preferred_contact.clone(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_preferred_contact() -> String {
    "email".to_owned()
}
