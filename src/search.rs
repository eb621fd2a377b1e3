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

//! Search pipeline: query, correspondent lookup, list building, rendering.

use std::io::Write;

use anyhow::Result;

use crate::api::CorrespondentNames;
use crate::api::DocumentApi;
use crate::builder::BuildOptions;
use crate::builder::build_results;
use crate::builder::normalize_query;
use crate::cache::AssetCache;
use crate::credential::Token;
use crate::output::ResultList;
use crate::status::Outcome;
use crate::status::Status;

/// Runs one search and writes the result list to `out` on success.
///
/// Failures leave `out` untouched so the caller can report the status. The
/// cache is joined before this returns, whichever way the pipeline ends.
pub fn run_search(
    api: &(impl DocumentApi + ?Sized),
    cache: &mut AssetCache,
    token: Option<&Token>,
    term: &str,
    opts: &BuildOptions,
    out: impl Write,
) -> Result<Outcome> {
    let outcome = search_pipeline(api, cache, token, term, opts, out);
    let report = cache.join_all();
    tracing::debug!(
        completed = report.completed,
        failed = report.failed,
        "search fetches settled"
    );
    outcome
}

fn search_pipeline(
    api: &(impl DocumentApi + ?Sized),
    cache: &mut AssetCache,
    token: Option<&Token>,
    term: &str,
    opts: &BuildOptions,
    out: impl Write,
) -> Result<Outcome> {
    let Some(token) = token else {
        return Ok(Err(Status::CredentialNotFound));
    };

    let term = normalize_query(term);
    let page = match api.search(token, &term) {
        Ok(page) => page,
        Err(status) => return Ok(Err(status)),
    };
    tracing::debug!(
        count = page.count,
        returned = page.results.len(),
        more = page.next.is_some(),
        "search answered"
    );

    let names = if page.results.iter().any(|hit| hit.correspondent.is_some()) {
        // A failed lookup after a successful search is reported as an invalid
        // credential; the token may have expired between the two calls, but it
        // could as well be an unrelated server error.
        match api.correspondents(token) {
            Ok(names) => names,
            Err(status) => return Ok(Err(status)),
        }
    } else {
        CorrespondentNames::new()
    };

    let mut list = ResultList::new();
    list.extend(build_results(api, cache, token, &page, &names, opts));
    tracing::debug!(items = list.len(), pending = cache.pending(), "rendering results");
    list.render(cache, out)?;
    Ok(Ok(()))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;

    use reqwest::Url;
    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;
    use crate::cache::Fetcher;
    use crate::model::DocumentId;
    use crate::model::SearchHit;
    use crate::model::SearchPage;

    struct StubApi {
        page: Result<SearchPage, Status>,
        names: Result<CorrespondentNames, Status>,
        terms: RefCell<Vec<String>>,
        lookups: RefCell<usize>,
    }

    impl StubApi {
        fn new(page: Result<SearchPage, Status>) -> Self {
            Self {
                page,
                names: Ok(CorrespondentNames::new()),
                terms: RefCell::new(Vec::new()),
                lookups: RefCell::new(0),
            }
        }
    }

    impl DocumentApi for StubApi {
        fn search(&self, _token: &Token, term: &str) -> Result<SearchPage, Status> {
            self.terms.borrow_mut().push(term.to_string());
            self.page.clone()
        }

        fn correspondents(&self, _token: &Token) -> Result<CorrespondentNames, Status> {
            *self.lookups.borrow_mut() += 1;
            self.names.clone()
        }

        fn thumbnail_url(&self, id: DocumentId) -> Result<Url> {
            Ok(Url::parse(&format!("http://stub/documents/{id}/thumb/"))?)
        }

        fn preview_url(&self, id: DocumentId) -> Result<Url> {
            Ok(Url::parse(&format!("http://stub/documents/{id}/preview/"))?)
        }
    }

    struct ThumbFetcher;

    impl Fetcher for ThumbFetcher {
        fn fetch(&self, _token: &Token, url: &Url) -> Result<Vec<u8>> {
            std::thread::sleep(std::time::Duration::from_millis(20));
            if url.as_str().contains("/3/") {
                anyhow::bail!("HTTP 404");
            }
            Ok(b"png".to_vec())
        }
    }

    fn hit(id: DocumentId, correspondent: Option<i64>) -> SearchHit {
        SearchHit {
            id,
            title: format!("Document {id}"),
            archive_serial_number: Some(id as i64 * 10),
            added: "2022-06-01T08:00:00Z".to_string(),
            created: None,
            correspondent,
        }
    }

    fn page(results: Vec<SearchHit>) -> SearchPage {
        SearchPage {
            count: results.len() as u64,
            next: None,
            results,
        }
    }

    fn run(api: &StubApi, cache: &mut AssetCache, token: Option<&Token>, term: &str) -> (Outcome, Vec<u8>) {
        let mut buf = Vec::new();
        let outcome =
            run_search(api, cache, token, term, &BuildOptions::default(), &mut buf).expect("search");
        (outcome, buf)
    }

    #[test]
    fn missing_token_short_circuits() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(ThumbFetcher)).expect("open");
        let api = StubApi::new(Ok(page(Vec::new())));
        let (outcome, buf) = run(&api, &mut cache, None, "bills");
        assert_eq!(outcome, Err(Status::CredentialNotFound));
        assert!(buf.is_empty());
        assert!(api.terms.borrow().is_empty());
    }

    #[test]
    fn failed_search_writes_nothing() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(ThumbFetcher)).expect("open");
        let api = StubApi::new(Err(Status::SearchFailed));
        let (outcome, buf) = run(&api, &mut cache, Some(&Token::new("tok")), "bills");
        assert_eq!(outcome, Err(Status::SearchFailed));
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_query_with_no_hits_renders_sentinel() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(ThumbFetcher)).expect("open");
        let api = StubApi::new(Ok(page(Vec::new())));
        let (outcome, buf) = run(&api, &mut cache, Some(&Token::new("tok")), "");
        assert_eq!(outcome, Ok(()));
        let value: Value = serde_json::from_slice(&buf).expect("json");
        let items = value["items"].as_array().expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "No result found");
        assert_eq!(items[0]["subtitle"], "Try another search term");
        assert_eq!(items[0]["arg"], "");
        assert_eq!(*api.lookups.borrow(), 0);
    }

    #[test]
    fn hits_render_in_server_order_with_fetched_thumbnails() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(ThumbFetcher)).expect("open");
        let mut api = StubApi::new(Ok(page(vec![hit(5, Some(1)), hit(3, None), hit(9, Some(2))])));
        let mut names = CorrespondentNames::new();
        names.insert(1, "Utility Co".to_string());
        api.names = Ok(names);

        let (outcome, buf) = run(&api, &mut cache, Some(&Token::new("tok")), "cafe\u{0301}");
        assert_eq!(outcome, Ok(()));
        assert_eq!(api.terms.borrow()[0], "caf\u{00E9}");
        assert_eq!(cache.pending(), 0);

        let value: Value = serde_json::from_slice(&buf).expect("json");
        let items = value["items"].as_array().expect("items");
        let args: Vec<&str> = items.iter().filter_map(|i| i["arg"].as_str()).collect();
        assert_eq!(args, vec!["5", "3", "9"]);

        let thumb5 = dir.path().join("5.png").to_string_lossy().into_owned();
        assert_eq!(items[0]["icon"]["path"], thumb5.as_str());
        assert_eq!(items[1]["icon"]["path"], "pdf.png");
        assert!(
            items[0]["subtitle"]
                .as_str()
                .expect("subtitle")
                .ends_with("Correspondent: Utility Co")
        );
        assert!(
            items[1]["subtitle"]
                .as_str()
                .expect("subtitle")
                .ends_with("Correspondent: None")
        );
        assert!(
            items[2]["subtitle"]
                .as_str()
                .expect("subtitle")
                .ends_with("Correspondent: None")
        );
        for item in items {
            assert_eq!(item["type"], "default");
        }
    }

    #[test]
    fn cached_pdf_marks_item_as_file() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("5.pdf"), b"pdf").expect("seed");
        let mut cache = AssetCache::open(dir.path(), Arc::new(ThumbFetcher)).expect("open");
        let api = StubApi::new(Ok(page(vec![hit(5, None)])));
        let (_, buf) = run(&api, &mut cache, Some(&Token::new("tok")), "x");
        let value: Value = serde_json::from_slice(&buf).expect("json");
        let pdf = dir.path().join("5.pdf").to_string_lossy().into_owned();
        assert_eq!(value["items"][0]["type"], "file");
        assert_eq!(value["items"][0]["arg"], pdf.as_str());
        assert_eq!(value["items"][0]["icon"]["path"], pdf.as_str());
    }

    #[test]
    fn lookup_failure_is_credential_invalid() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(ThumbFetcher)).expect("open");
        let mut api = StubApi::new(Ok(page(vec![hit(1, Some(4))])));
        api.names = Err(Status::CredentialInvalid);
        let (outcome, buf) = run(&api, &mut cache, Some(&Token::new("tok")), "x");
        assert_eq!(outcome, Err(Status::CredentialInvalid));
        assert!(buf.is_empty());
    }
}
