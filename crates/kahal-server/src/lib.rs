//! Configuration and background plumbing for the Kahal server binary.

pub mod scheduler;

use std::path::PathBuf;

use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml` plus
/// `KAHAL_*` environment overrides. Every field has a development default
/// so the server starts with no config file at all.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// How many days ahead coming-of-age notifications are raised.
  #[serde(default = "default_lead_days")]
  pub notification_lead_days: i64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("kahal.db") }

fn default_lead_days() -> i64 { 180 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                   default_host(),
      port:                   default_port(),
      store_path:             default_store_path(),
      notification_lead_days: default_lead_days(),
    }
  }
}
