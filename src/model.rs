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

//! Shared domain types: remote search payloads and launcher result items.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub type DocumentId = u64;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: DocumentId,
    pub title: String,
    #[serde(default)]
    pub archive_serial_number: Option<i64>,
    pub added: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub correspondent: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorrespondentPage {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<Correspondent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Correspondent {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Default,
    File,
}

/// Payload carried in an item's `arg`. The variant fixes the item kind, so a
/// remote id and a cached path can never be confused before serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemArg {
    Empty,
    Remote(DocumentId),
    Cached(PathBuf),
}

impl ItemArg {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemArg::Cached(_) => ItemKind::File,
            ItemArg::Empty | ItemArg::Remote(_) => ItemKind::Default,
        }
    }

    pub fn to_wire(&self) -> String {
        match self {
            ItemArg::Empty => String::new(),
            ItemArg::Remote(id) => id.to_string(),
            ItemArg::Cached(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Launcher icon. `path` is always serialized; an unset icon is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ResultItem {
    pub title: String,
    pub subtitle: String,
    pub arg: ItemArg,
    pub icon: Icon,
}

impl ResultItem {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>, arg: ItemArg) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            arg,
            icon: Icon::default(),
        }
    }

    pub fn with_icon(mut self, path: impl Into<String>) -> Self {
        self.icon.path = path.into();
        self
    }

    pub fn kind(&self) -> ItemKind {
        self.arg.kind()
    }

    /// Item shown when a search matched nothing.
    pub fn no_results() -> Self {
        Self::new("No result found", "Try another search term", ItemArg::Empty)
    }

    /// Item shown when no token has been stored yet.
    pub fn no_credential() -> Self {
        Self::new(
            "No credential found",
            "Please run 'pplc --connect <username> <password>' to set the API token",
            ItemArg::Empty,
        )
    }
}
