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

//! Token storage keyed by service name.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use tempfile::NamedTempFile;

use crate::config;

#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn auth_header(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

pub trait CredentialStore {
    fn get(&self, service: &str) -> Result<Option<Token>>;
    fn set(&self, service: &str, token: &Token) -> Result<()>;
}

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Result<Self> {
        let dir = config::app_config_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot locate a config directory for credentials"))?;
        Ok(Self::new(dir.join("credentials.toml")))
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        toml::from_str(&text).with_context(|| format!("parse {}", self.path.display()))
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, service: &str) -> Result<Option<Token>> {
        let tokens = self.load()?;
        Ok(tokens
            .get(service)
            .filter(|value| !value.is_empty())
            .map(Token::new))
    }

    fn set(&self, service: &str, token: &Token) -> Result<()> {
        let mut tokens = self.load()?;
        tokens.insert(service.to_string(), token.expose().to_string());
        let text = toml::to_string(&tokens).context("encode credentials")?;

        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("credential path has no parent"))?;
        std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir).context("create credential temp file")?;
        tmp.write_all(text.as_bytes())
            .context("write credential temp file")?;
        restrict_permissions(tmp.as_file())?;
        tmp.persist(&self.path)
            .with_context(|| format!("persist {}", self.path.display()))?;
        tracing::debug!(service, path = %self.path.display(), "stored credential");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .context("restrict credential file permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &std::fs::File) -> Result<()> {
    Ok(())
}
