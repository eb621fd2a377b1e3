// Copyright 2026 pplc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;

pub const INSTANCE_ENV: &str = "PAPERLESS_INSTANCE";
pub const CACHE_DIR_ENV: &str = "PPLC_CACHE_DIR";
const APP_DIR: &str = "pplc";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: String,
    pub cache_dir: Option<PathBuf>,
    pub page_size: usize,
    pub title_max_chars: usize,
    pub default_icon: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: "com.nelatmani.paperless".to_string(),
            cache_dir: None,
            page_size: 25,
            title_max_chars: 80,
            default_icon: "pdf.png".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Resolved settings for one invocation: the file config plus the
/// environment-supplied server location.
#[derive(Debug, Clone)]
pub struct ConfigCtx {
    pub instance: Url,
    pub config: Config,
}

impl ConfigCtx {
    pub fn load_from_env() -> Result<Self> {
        let config = load_global_config()?;
        let raw = std::env::var(INSTANCE_ENV)
            .with_context(|| format!("{INSTANCE_ENV} must be set to the server base URL"))?;
        let instance = parse_instance(&raw)?;
        Ok(Self { instance, config })
    }

    pub fn api_root(&self) -> Result<Url> {
        self.instance.join("api/").context("build API root URL")
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV)
            && !dir.is_empty()
        {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = &self.config.cache_dir {
            return Ok(dir.clone());
        }
        platform_cache_dir()
            .map(|dir| dir.join(&self.config.service))
            .ok_or_else(|| anyhow::anyhow!("cannot locate a cache directory; set {CACHE_DIR_ENV}"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs.max(1))
    }
}

pub fn parse_instance(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).with_context(|| format!("parse {INSTANCE_ENV} '{trimmed}'"))
}

pub fn config_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return Some(PathBuf::from(appdata));
        }
        if let Ok(profile) = std::env::var("USERPROFILE") {
            return Some(PathBuf::from(profile).join("AppData").join("Roaming"));
        }
        return None;
    }

    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").ok()?;
        return Some(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support"),
        );
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config"))
}

fn platform_cache_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        return std::env::var("LOCALAPPDATA").ok().map(PathBuf::from);
    }

    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").ok()?;
        return Some(PathBuf::from(home).join("Library").join("Caches"));
    }

    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        return Some(PathBuf::from(xdg));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".cache"))
}

pub fn app_config_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(APP_DIR))
}

pub fn global_config_path() -> Option<PathBuf> {
    app_config_dir().map(|dir| dir.join("pplc.toml"))
}

pub fn load_global_config() -> Result<Config> {
    let Some(path) = global_config_path() else {
        return Ok(Config::default());
    };
    if !path.exists() {
        return Ok(Config::default());
    }
    read_config(&path)
}

pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut config: Config = toml::from_str(&text).context("parse pplc.toml")?;
    if config.title_max_chars == 0 {
        config.title_max_chars = Config::default().title_max_chars;
    }
    if config.page_size == 0 {
        config.page_size = Config::default().page_size;
    }
    Ok(config)
}
