// huectl - CLI for a Hue bridge's local CLIP v2 API
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const ENV_BRIDGE_IP: &str = "HUE_BRIDGE_IP";
pub const ENV_APPLICATION_KEY: &str = "HUE_APPLICATION_KEY";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub bridge_ip: Option<String>,
    pub application_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error(
        "bridge IP and application key are required; set them with `huectl configure --ip <IP> --key <KEY>` or export HUE_BRIDGE_IP / HUE_APPLICATION_KEY"
    )]
    MissingCredentials,
}

#[derive(Debug)]
pub struct EffectiveConfig {
    pub bridge_ip: String,
    pub application_key: String,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".huectl.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var("HUECTL_CONFIG_DIR") {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("huectl").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

/// Effective credentials, in priority order: CLI overrides, then the
/// `HUE_BRIDGE_IP`/`HUE_APPLICATION_KEY` environment (for secret managers
/// that mount env files), then the local project file, then the user file.
pub fn resolve(
    cwd: &Path,
    ip_override: Option<String>,
    key_override: Option<String>,
) -> Result<EffectiveConfig> {
    let mut merged = load(cwd)?;

    if let Ok(ip) = env::var(ENV_BRIDGE_IP) {
        merged.bridge_ip = Some(ip);
    }
    if let Ok(key) = env::var(ENV_APPLICATION_KEY) {
        merged.application_key = Some(key);
    }
    if let Some(ip) = ip_override {
        merged.bridge_ip = Some(ip);
    }
    if let Some(key) = key_override {
        merged.application_key = Some(key);
    }

    let bridge_ip = merged
        .bridge_ip
        .ok_or(ConfigError::MissingCredentials)
        .map(|ip| ip.trim().to_string())?;
    let application_key = merged
        .application_key
        .ok_or(ConfigError::MissingCredentials)
        .map(|key| key.trim().to_string())?;

    Ok(EffectiveConfig {
        bridge_ip,
        application_key,
    })
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: Config, local: Config) -> Config {
    Config {
        bridge_ip: local.bridge_ip.or(user.bridge_ip),
        application_key: local.application_key.or(user.application_key),
    }
}
