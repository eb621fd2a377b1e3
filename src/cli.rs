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

use std::ffi::OsString;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pplc",
    version,
    about = "Search and open Paperless documents from a launcher"
)]
pub struct Cli {
    /// Exchange a username and password for an API token and store it
    #[arg(
        long,
        num_args = 2,
        value_names = ["USER", "PASS"],
        conflicts_with_all = ["open", "query"]
    )]
    pub connect: Option<Vec<String>>,

    /// Open a document by id, or a cached file by path
    #[arg(long, value_name = "ARG", conflicts_with = "query")]
    pub open: Option<String>,

    /// Full-text search term
    pub query: Option<String>,
}

/// Undoes the launcher packing `--connect user pass` or `--open <arg>` into a
/// single argument. `--open` is split once so paths with spaces survive.
pub fn launcher_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let args: Vec<OsString> = args.into_iter().collect();
    let packed = args.iter().skip(1).find_map(|arg| {
        let text = arg.to_str()?;
        let (flag, rest) = text.split_once(char::is_whitespace)?;
        match flag {
            "--connect" => Some(
                std::iter::once(flag)
                    .chain(rest.split_whitespace())
                    .map(OsString::from)
                    .collect::<Vec<_>>(),
            ),
            "--open" => Some(vec![OsString::from(flag), OsString::from(rest.trim())]),
            _ => None,
        }
    });

    match packed {
        Some(parts) => args.into_iter().take(1).chain(parts).collect(),
        None => args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn packed_connect_is_split() {
        let args = launcher_args(os(&["pplc", "--connect alice hunter2"]));
        assert_eq!(args, os(&["pplc", "--connect", "alice", "hunter2"]));
        let cli = Cli::try_parse_from(args).expect("parse");
        assert_eq!(
            cli.connect,
            Some(vec!["alice".to_string(), "hunter2".to_string()])
        );
    }

    #[test]
    fn packed_open_keeps_spaces_in_path() {
        let args = launcher_args(os(&["pplc", "--open /cache/My Scans/4.pdf"]));
        let cli = Cli::try_parse_from(args).expect("parse");
        assert_eq!(cli.open.as_deref(), Some("/cache/My Scans/4.pdf"));
        assert!(cli.query.is_none());
    }

    #[test]
    fn plain_query_is_untouched() {
        let args = launcher_args(os(&["pplc", "electric bill"]));
        assert_eq!(args, os(&["pplc", "electric bill"]));
        let cli = Cli::try_parse_from(args).expect("parse");
        assert_eq!(cli.query.as_deref(), Some("electric bill"));
    }

    #[test]
    fn empty_query_is_still_a_query() {
        let cli = Cli::try_parse_from(["pplc", ""]).expect("parse");
        assert_eq!(cli.query.as_deref(), Some(""));
    }

    #[test]
    fn connect_conflicts_with_query() {
        assert!(Cli::try_parse_from(["pplc", "--connect", "a", "b", "term"]).is_err());
    }
}
