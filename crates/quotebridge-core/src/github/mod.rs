//! GitHub file resolution.
//!
//! Turns a repository, blob, tree or raw-content URL into decoded text,
//! using the public raw host or the authenticated contents API.

mod resolver;
mod target;

use serde::{Deserialize, Serialize};

pub use resolver::{GithubFileResolver, GITHUB_TOKEN_ENV};
pub use target::{contents_url, raw_url, GithubTarget};

/// Which GitHub endpoint served the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSource {
    Raw,
    Api,
}

impl FileSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Api => "api",
        }
    }
}

/// A fetched file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubFile {
    pub file_name: String,
    pub content_text: String,
    /// Length of the undecoded payload.
    pub size_bytes: usize,
    pub source: FileSource,
}

/// UTF-8 when valid, otherwise Latin-1 so every byte maps to exactly one char.
pub fn decode_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|error| error.into_bytes().into_iter().map(char::from).collect())
}
