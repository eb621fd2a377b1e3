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

//! On-disk asset cache with background downloads.
//!
//! Entries are plain files named after the document they belong to
//! (`<id>.png`, `<id>.pdf`) and are never evicted. Each scheduled download runs
//! on its own thread; [`AssetCache::join_all`] is the only point that waits for
//! them, and callers must reach it on every exit path before reading the cache
//! for output or opening a downloaded file.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context;
use anyhow::Result;
use reqwest::Url;
use tempfile::NamedTempFile;

use crate::credential::Token;

/// Retrieves the raw bytes behind an authenticated URL.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, token: &Token, url: &Url) -> Result<Vec<u8>>;
}

struct FetchTask {
    name: String,
    handle: JoinHandle<Result<()>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub completed: usize,
    pub failed: usize,
}

pub struct AssetCache {
    root: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    tasks: Vec<FetchTask>,
    pending: HashSet<String>,
}

impl AssetCache {
    pub fn open(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create cache dir {}", root.display()))?;
        Ok(Self {
            root,
            fetcher,
            tasks: Vec::new(),
            pending: HashSet::new(),
        })
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Schedules a background download of `url` into `name`.
    ///
    /// Returns `false` when a download for `name` is already in flight in this
    /// cache or the worker thread could not be started.
    pub fn fetch_async(&mut self, token: &Token, url: Url, name: &str) -> bool {
        if self.pending.contains(name) {
            tracing::debug!(name, "fetch already in flight");
            return false;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let token = token.clone();
        let target = self.path_for(name);
        let root = self.root.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("fetch-{name}"))
            .spawn(move || {
                let bytes = fetcher.fetch(&token, &url)?;
                store(&root, &target, &bytes)
            });

        match spawned {
            Ok(handle) => {
                tracing::debug!(name, "fetch scheduled");
                self.pending.insert(name.to_string());
                self.tasks.push(FetchTask {
                    name: name.to_string(),
                    handle,
                });
                true
            }
            Err(err) => {
                tracing::warn!(name, error = %err, "could not start fetch thread");
                false
            }
        }
    }

    /// Waits for every scheduled download. Failures are logged and counted,
    /// never returned.
    pub fn join_all(&mut self) -> FetchReport {
        let mut report = FetchReport::default();
        for task in self.tasks.drain(..) {
            match task.handle.join() {
                Ok(Ok(())) => {
                    tracing::debug!(name = %task.name, "fetch finished");
                    report.completed += 1;
                }
                Ok(Err(err)) => {
                    tracing::warn!(name = %task.name, error = %format!("{err:#}"), "fetch failed");
                    report.failed += 1;
                }
                Err(_) => {
                    tracing::warn!(name = %task.name, "fetch thread panicked");
                    report.failed += 1;
                }
            }
        }
        self.pending.clear();
        report
    }

    /// Downloads `name` and waits for it. Returns whether the file is present
    /// afterwards.
    pub fn fetch_now(&mut self, token: &Token, url: Url, name: &str) -> bool {
        self.fetch_async(token, url, name);
        self.join_all();
        self.exists(name)
    }
}

impl Drop for AssetCache {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            tracing::warn!(
                pending = self.tasks.len(),
                "asset cache dropped with unjoined fetches"
            );
        }
    }
}

fn store(root: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(root)
        .with_context(|| format!("create temp file in {}", root.display()))?;
    tmp.write_all(bytes).context("write fetched bytes")?;
    tmp.persist(target)
        .with_context(|| format!("persist {}", target.display()))?;
    Ok(())
}
