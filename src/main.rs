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

mod api;
mod builder;
mod cache;
mod cli;
mod config;
mod credential;
mod model;
mod open;
mod output;
mod search;
mod status;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use crate::api::HttpFetcher;
use crate::api::PaperlessClient;
use crate::builder::BuildOptions;
use crate::cache::AssetCache;
use crate::cli::Cli;
use crate::config::ConfigCtx;
use crate::credential::CredentialStore;
use crate::credential::FileCredentialStore;
use crate::credential::Token;
use crate::status::Outcome;
use crate::status::Status;

const LOG_ENV: &str = "PPLC_LOG";

fn main() {
    init_logging();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

// Stdout carries the launcher payload, so logs only ever go to stderr.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse_from(cli::launcher_args(std::env::args_os()));
    let ctx = ConfigCtx::load_from_env()?;
    let api = PaperlessClient::new(
        ctx.instance.clone(),
        ctx.api_root()?,
        ctx.timeout(),
        ctx.config.page_size,
    )?;
    let fetcher = HttpFetcher::new(ctx.timeout())?;
    let mut cache = AssetCache::open(ctx.cache_dir()?, Arc::new(fetcher))?;
    let store = FileCredentialStore::default_location()?;

    let result = dispatch(cli, &ctx, &api, &mut cache, &store);
    cache.join_all();
    result
}

fn dispatch(
    cli: Cli,
    ctx: &ConfigCtx,
    api: &PaperlessClient,
    cache: &mut AssetCache,
    store: &impl CredentialStore,
) -> Result<i32> {
    let stdout = std::io::stdout();

    if let Some(credentials) = cli.connect {
        let outcome = cmd_connect(ctx, api, store, &credentials)?;
        return output::report(cache, outcome, stdout.lock());
    }

    let token = store.get(&ctx.config.service)?;

    let outcome = if let Some(arg) = cli.open {
        open::open_document(
            api,
            cache,
            token.as_ref(),
            &arg,
            open::launch_with_system,
        )?
    } else if let Some(query) = cli.query {
        let opts = BuildOptions {
            title_max_chars: ctx.config.title_max_chars,
            default_icon: ctx.config.default_icon.clone(),
        };
        search::run_search(api, cache, token.as_ref(), &query, &opts, stdout.lock())?
    } else {
        Ok(())
    };

    output::report(cache, outcome, stdout.lock())
}

fn cmd_connect(
    ctx: &ConfigCtx,
    api: &PaperlessClient,
    store: &impl CredentialStore,
    credentials: &[String],
) -> Result<Outcome> {
    let [username, password] = credentials else {
        return Ok(Err(Status::InvalidArgument));
    };
    let token: Token = match api.login(username, password) {
        Ok(token) => token,
        Err(status) => return Ok(Err(status)),
    };
    store.set(&ctx.config.service, &token)?;
    tracing::info!(service = %ctx.config.service, "credential saved");
    Ok(Ok(()))
}
