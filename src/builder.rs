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

//! Turns a search page into launcher result items.

use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use unicode_normalization::UnicodeNormalization;

use crate::api::CorrespondentNames;
use crate::api::DocumentApi;
use crate::cache::AssetCache;
use crate::credential::Token;
use crate::model::DocumentId;
use crate::model::ItemArg;
use crate::model::ResultItem;
use crate::model::SearchHit;
use crate::model::SearchPage;

pub const DOWNLOADED_MARK: &str = "↓ ";
pub const AVAILABLE_MARK: &str = "⇣ ";
const ELLIPSIS: char = '…';

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub title_max_chars: usize,
    pub default_icon: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            title_max_chars: 80,
            default_icon: "pdf.png".to_string(),
        }
    }
}

pub fn thumbnail_name(id: DocumentId) -> String {
    format!("{id}.png")
}

pub fn document_name(id: DocumentId) -> String {
    format!("{id}.pdf")
}

/// Launcher input can arrive decomposed (NFD); the server index matches the
/// composed form only.
pub fn normalize_query(term: &str) -> String {
    term.nfc().collect()
}

/// Builds items in server order, scheduling thumbnail downloads for hits
/// whose thumbnail is not cached yet. The cache must be joined before the
/// items are rendered.
pub fn build_results(
    api: &(impl DocumentApi + ?Sized),
    cache: &mut AssetCache,
    token: &Token,
    page: &SearchPage,
    names: &CorrespondentNames,
    opts: &BuildOptions,
) -> Vec<ResultItem> {
    if page.count == 0 || page.results.is_empty() {
        return vec![ResultItem::no_results()];
    }

    let mut items = Vec::with_capacity(page.results.len());
    for hit in &page.results {
        let thumb = thumbnail_name(hit.id);
        if !cache.exists(&thumb) {
            match api.thumbnail_url(hit.id) {
                Ok(url) => {
                    cache.fetch_async(token, url, &thumb);
                }
                Err(err) => tracing::warn!(id = hit.id, error = %err, "no thumbnail URL"),
            }
        }
        items.push(build_item(cache, hit, names, opts));
    }
    items
}

fn build_item(
    cache: &AssetCache,
    hit: &SearchHit,
    names: &CorrespondentNames,
    opts: &BuildOptions,
) -> ResultItem {
    let doc = document_name(hit.id);
    let (arg, mark) = if cache.exists(&doc) {
        (ItemArg::Cached(cache.path_for(&doc)), DOWNLOADED_MARK)
    } else {
        (ItemArg::Remote(hit.id), AVAILABLE_MARK)
    };

    let title = truncate_title(&hit.title, opts.title_max_chars);
    let subtitle = format!("{mark}{}", metadata_line(hit, names));
    ResultItem::new(title, subtitle, arg).with_icon(opts.default_icon.clone())
}

pub fn metadata_line(hit: &SearchHit, names: &CorrespondentNames) -> String {
    let asn = hit
        .archive_serial_number
        .map(|n| n.to_string())
        .unwrap_or_else(|| "None".to_string());
    let date = format_date(hit.created.as_deref().unwrap_or(&hit.added));
    let correspondent = hit
        .correspondent
        .and_then(|id| names.get(&id))
        .map(String::as_str)
        .unwrap_or("None");
    format!("ASN: {asn} | Date created: {date} | Correspondent: {correspondent}")
}

pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let mut out: String = title.chars().take(max_chars).collect();
    out.push(ELLIPSIS);
    out
}

/// Calendar date of an ISO timestamp, in the timestamp's own offset. Input
/// that does not parse is shown as-is.
pub fn format_date(raw: &str) -> String {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return ts.date().to_string();
    }
    let day = format_description!("[year]-[month]-[day]");
    raw.get(..10)
        .and_then(|prefix| Date::parse(prefix, &day).ok())
        .map(|date| date.to_string())
        .unwrap_or_else(|| raw.to_string())
}
