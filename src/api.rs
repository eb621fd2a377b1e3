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

//! HTTP client for the Paperless REST API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::cookie::CookieStore;
use reqwest::cookie::Jar;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::Fetcher;
use crate::credential::Token;
use crate::model::CorrespondentPage;
use crate::model::DocumentId;
use crate::model::SearchPage;
use crate::status::Status;

const USER_AGENT: &str = concat!("pplc/", env!("CARGO_PKG_VERSION"));

/// Correspondent id to display name.
pub type CorrespondentNames = HashMap<i64, String>;

/// Remote operations the search and open flows depend on.
pub trait DocumentApi {
    fn search(&self, token: &Token, term: &str) -> Result<SearchPage, Status>;
    fn correspondents(&self, token: &Token) -> Result<CorrespondentNames, Status>;
    fn thumbnail_url(&self, id: DocumentId) -> Result<Url>;
    fn preview_url(&self, id: DocumentId) -> Result<Url>;
}

#[derive(Clone)]
pub struct PaperlessClient {
    client: Client,
    jar: Arc<Jar>,
    instance: Url,
    api: Url,
    page_size: usize,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

impl PaperlessClient {
    pub fn new(instance: Url, api: Url, timeout: Duration, page_size: usize) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            client,
            jar,
            instance,
            api,
            page_size,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.api
            .join(path)
            .with_context(|| format!("build URL for {path}"))
    }

    fn get_json<T: DeserializeOwned>(&self, token: &Token, url: Url) -> Result<T> {
        let resp = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, token.auth_header())
            .send()
            .with_context(|| format!("GET {url}"))?;
        let resp = ensure_success(resp)?;
        resp.json::<T>()
            .with_context(|| format!("decode response from {url}"))
    }

    /// Exchanges a username and password for an API token.
    pub fn login(&self, username: &str, password: &str) -> Result<Token, Status> {
        self.try_login(username, password).map_err(|err| {
            tracing::warn!(error = %format!("{err:#}"), "login failed");
            Status::CredentialInvalid
        })
    }

    fn try_login(&self, username: &str, password: &str) -> Result<Token> {
        // The landing page may redirect to the login form; the cookie can be
        // set on any hop, so read it back from the jar.
        self.client
            .get(self.instance.clone())
            .send()
            .with_context(|| format!("GET {}", self.instance))?;
        let csrf = cookie_value(&self.jar, &self.instance, "csrftoken")
            .ok_or_else(|| anyhow::anyhow!("server did not issue a csrftoken cookie"))?;

        let url = self.endpoint("token/")?;
        let resp = self
            .client
            .post(url.clone())
            .header("X-CSRFToken", csrf)
            .json(&LoginRequest { username, password })
            .send()
            .with_context(|| format!("POST {url}"))?;
        let body: LoginResponse = ensure_success(resp)?
            .json()
            .context("decode token response")?;
        Ok(Token::new(body.token))
    }
}

impl DocumentApi for PaperlessClient {
    fn search(&self, token: &Token, term: &str) -> Result<SearchPage, Status> {
        let run = || -> Result<SearchPage> {
            let mut url = self.endpoint("documents/")?;
            url.query_pairs_mut()
                .append_pair("query", term)
                .append_pair("page_size", &self.page_size.to_string());
            self.get_json(token, url)
        };
        run().map_err(|err| {
            tracing::warn!(error = %format!("{err:#}"), "search request failed");
            Status::SearchFailed
        })
    }

    // Follows `next` links so every correspondent is resolvable.
    fn correspondents(&self, token: &Token) -> Result<CorrespondentNames, Status> {
        let run = || -> Result<CorrespondentNames> {
            let mut names = CorrespondentNames::new();
            let mut next = Some(self.endpoint("correspondents/")?);
            while let Some(url) = next.take() {
                let page: CorrespondentPage = self.get_json(token, url)?;
                names.extend(page.results.into_iter().map(|c| (c.id, c.name)));
                next = match page.next {
                    Some(link) => Some(Url::parse(&link).context("parse next link")?),
                    None => None,
                };
            }
            Ok(names)
        };
        run().map_err(|err| {
            tracing::warn!(error = %format!("{err:#}"), "correspondent lookup failed");
            Status::CredentialInvalid
        })
    }

    fn thumbnail_url(&self, id: DocumentId) -> Result<Url> {
        self.endpoint(&format!("documents/{id}/thumb/"))
    }

    fn preview_url(&self, id: DocumentId) -> Result<Url> {
        self.endpoint(&format!("documents/{id}/preview/"))
    }
}

/// [`Fetcher`] for thumbnails and previews.
///
/// Downloads have no overall deadline, only a connect timeout: a large PDF
/// on a slow link must not be cut off by the limit used for API calls.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .timeout(None::<Duration>)
            .build()
            .context("build download client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, token: &Token, url: &Url) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, token.auth_header())
            .send()
            .with_context(|| format!("GET {url}"))?;
        let bytes = ensure_success(resp)?
            .bytes()
            .with_context(|| format!("read body of {url}"))?;
        Ok(bytes.to_vec())
    }
}

fn cookie_value(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    header
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("{} returned HTTP {}", resp.url(), status);
    }
    Ok(resp)
}
