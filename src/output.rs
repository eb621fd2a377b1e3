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

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::builder::thumbnail_name;
use crate::cache::AssetCache;
use crate::model::DocumentId;
use crate::model::Icon;
use crate::model::ItemKind;
use crate::model::ResultItem;
use crate::status::Outcome;
use crate::status::Status;
use crate::status::exit_code;

#[derive(Debug, Clone, Serialize)]
pub struct ItemOut {
    pub title: String,
    pub subtitle: String,
    pub arg: String,
    pub icon: Icon,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct LauncherResponse {
    pub items: Vec<ItemOut>,
}

/// Ordered buffer of items written to the launcher in one piece.
#[derive(Debug, Default)]
pub struct ResultList {
    items: Vec<ResultItem>,
}

impl ResultList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Waits for outstanding cache downloads, resolves icons and builds the
    /// wire payload.
    pub fn resolve(self, cache: &mut AssetCache) -> LauncherResponse {
        cache.join_all();
        let cache: &AssetCache = cache;
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let kind = item.kind();
                let arg = item.arg.to_wire();
                let mut icon = item.icon;
                resolve_icon(cache, &arg, &mut icon);
                ItemOut {
                    title: item.title,
                    subtitle: item.subtitle,
                    arg,
                    icon,
                    kind,
                }
            })
            .collect();
        LauncherResponse { items }
    }

    pub fn render(self, cache: &mut AssetCache, out: impl Write) -> Result<()> {
        let resp = self.resolve(cache);
        write_json(&resp, out)
    }
}

impl Extend<ResultItem> for ResultList {
    fn extend<T: IntoIterator<Item = ResultItem>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

/// An arg that reads as a document id points at `<id>.png` when that
/// thumbnail is cached; any other arg is used as the icon path itself. A
/// numeric file path takes the first branch.
fn resolve_icon(cache: &AssetCache, arg: &str, icon: &mut Icon) {
    match arg.parse::<DocumentId>() {
        Ok(id) => {
            let thumb = thumbnail_name(id);
            if cache.exists(&thumb) {
                icon.path = cache.path_for(&thumb).to_string_lossy().into_owned();
            }
        }
        Err(_) => icon.path = arg.to_string(),
    }
}

pub fn write_json(resp: &LauncherResponse, mut out: impl Write) -> Result<()> {
    let text = serde_json::to_string_pretty(resp)?;
    writeln!(out, "{text}")?;
    Ok(())
}

pub fn write_status(status: Status, mut out: impl Write) -> Result<()> {
    writeln!(out, "{}", status.status_line())?;
    Ok(())
}

/// Writes the failure side of an outcome and maps it to an exit code.
///
/// A missing credential is shown as a result item with instructions; every
/// other failure is a bare status line. Success writes nothing here.
pub fn report(cache: &mut AssetCache, outcome: Outcome, out: impl Write) -> Result<i32> {
    match outcome {
        Ok(()) => {}
        Err(Status::CredentialNotFound) => {
            let mut list = ResultList::new();
            list.append(ResultItem::no_credential());
            list.render(cache, out)?;
        }
        Err(status) => write_status(status, out)?,
    }
    Ok(exit_code(outcome))
}
