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

use anyhow::Context;
use anyhow::Result;

use crate::api::DocumentApi;
use crate::builder::document_name;
use crate::cache::AssetCache;
use crate::credential::Token;
use crate::model::DocumentId;
use crate::status::Outcome;
use crate::status::Status;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Remote(DocumentId),
    Local(PathBuf),
}

/// Reads a selected arg the same way the renderer does: a document id if it
/// parses as one, otherwise a file inside the cache named by the arg's last
/// component.
pub fn parse_open_arg(cache: &AssetCache, arg: &str) -> Option<OpenTarget> {
    let arg = arg.trim();
    if let Ok(id) = arg.parse::<DocumentId>() {
        return Some(OpenTarget::Remote(id));
    }
    Path::new(arg)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| OpenTarget::Local(cache.path_for(name)))
}

pub fn open_document(
    api: &(impl DocumentApi + ?Sized),
    cache: &mut AssetCache,
    token: Option<&Token>,
    arg: &str,
    launch: impl FnOnce(&Path) -> Result<()>,
) -> Result<Outcome> {
    let Some(target) = parse_open_arg(cache, arg) else {
        return Ok(Err(Status::InvalidArgument));
    };

    let path = match target {
        OpenTarget::Remote(id) => {
            let Some(token) = token else {
                return Ok(Err(Status::CredentialNotFound));
            };
            let name = document_name(id);
            let url = api.preview_url(id)?;
            if !cache.fetch_now(token, url, &name) {
                anyhow::bail!("document {id} could not be downloaded");
            }
            cache.path_for(&name)
        }
        OpenTarget::Local(path) => path,
    };

    tracing::debug!(path = %path.display(), "opening document");
    launch(&path)?;
    Ok(Ok(()))
}

pub fn launch_with_system(path: &Path) -> Result<()> {
    open::that_detached(path).with_context(|| format!("open {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;

    use reqwest::Url;
    use tempfile::tempdir;

    use super::*;
    use crate::api::CorrespondentNames;
    use crate::cache::Fetcher;
    use crate::model::SearchPage;

    struct StubApi;

    impl DocumentApi for StubApi {
        fn search(&self, _token: &Token, _term: &str) -> Result<SearchPage, Status> {
            Err(Status::SearchFailed)
        }

        fn correspondents(&self, _token: &Token) -> Result<CorrespondentNames, Status> {
            Err(Status::CredentialInvalid)
        }

        fn thumbnail_url(&self, id: DocumentId) -> Result<Url> {
            Ok(Url::parse(&format!("http://stub/documents/{id}/thumb/"))?)
        }

        fn preview_url(&self, id: DocumentId) -> Result<Url> {
            Ok(Url::parse(&format!("http://stub/documents/{id}/preview/"))?)
        }
    }

    struct PdfFetcher;

    impl Fetcher for PdfFetcher {
        fn fetch(&self, _token: &Token, url: &Url) -> Result<Vec<u8>> {
            if url.path() == "/documents/12/preview/" {
                return Ok(b"%PDF-1.7".to_vec());
            }
            anyhow::bail!("HTTP 404 for {url}")
        }
    }

    #[test]
    fn numeric_arg_downloads_before_opening() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(PdfFetcher)).expect("open");
        let opened = RefCell::new(None);
        let outcome = open_document(&StubApi, &mut cache, Some(&Token::new("tok")), "12", |p| {
            let body = std::fs::read(p)?;
            assert_eq!(body, b"%PDF-1.7");
            *opened.borrow_mut() = Some(p.to_path_buf());
            Ok(())
        })
        .expect("open");
        assert_eq!(outcome, Ok(()));
        assert_eq!(opened.into_inner(), Some(dir.path().join("12.pdf")));
        assert_eq!(cache.pending(), 0);
    }

    #[test]
    fn failed_download_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(PdfFetcher)).expect("open");
        let err = open_document(&StubApi, &mut cache, Some(&Token::new("tok")), "13", |_| {
            panic!("must not open a missing document")
        })
        .unwrap_err();
        assert!(err.to_string().contains("could not be downloaded"));
    }

    #[test]
    fn path_arg_opens_without_network_or_token() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(PdfFetcher)).expect("open");
        let arg = dir.path().join("77.pdf");
        let opened = RefCell::new(None);
        let outcome = open_document(&StubApi, &mut cache, None, &arg.to_string_lossy(), |p| {
            *opened.borrow_mut() = Some(p.to_path_buf());
            Ok(())
        })
        .expect("open");
        assert_eq!(outcome, Ok(()));
        assert_eq!(opened.into_inner(), Some(dir.path().join("77.pdf")));
    }

    #[test]
    fn numeric_arg_needs_token() {
        let dir = tempdir().expect("tempdir");
        let mut cache = AssetCache::open(dir.path(), Arc::new(PdfFetcher)).expect("open");
        let outcome = open_document(&StubApi, &mut cache, None, "12", |_| Ok(())).expect("open");
        assert_eq!(outcome, Err(Status::CredentialNotFound));
    }

    #[test]
    fn arg_without_file_name_is_invalid() {
        let dir = tempdir().expect("tempdir");
        let cache = AssetCache::open(dir.path(), Arc::new(PdfFetcher)).expect("open");
        assert_eq!(parse_open_arg(&cache, ""), None);
        assert_eq!(parse_open_arg(&cache, "/"), None);
        assert_eq!(
            parse_open_arg(&cache, "/elsewhere/report.pdf"),
            Some(OpenTarget::Local(dir.path().join("report.pdf")))
        );
    }
}
