use crate::ValidationError;

const GITHUB_PREFIXES: [&str; 3] = [
    "https://github.com/",
    "http://github.com/",
    "https://www.github.com/",
];
const RAW_PREFIX: &str = "https://raw.githubusercontent.com/";
pub const RAW_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const API_BASE_URL: &str = "https://api.github.com";

/// What a GitHub URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubTarget {
    /// `github.com/{owner}/{repo}`; resolved to the default branch README.
    RepoRoot { owner: String, repo: String },
    File {
        owner: String,
        repo: String,
        git_ref: String,
        path: String,
    },
    Directory {
        owner: String,
        repo: String,
        git_ref: String,
        path: String,
    },
}

impl GithubTarget {
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        let unsupported = || ValidationError::UnsupportedUrl {
            value: url.to_owned(),
        };

        // Query strings and fragments (`?plain=1`, `#L10`) never affect the file.
        let without_query = url.split(['?', '#']).next().unwrap_or(url);

        if let Some(rest) = without_query.strip_prefix(RAW_PREFIX) {
            let parts = segments(rest);
            if parts.len() < 4 {
                return Err(unsupported());
            }
            return Ok(Self::File {
                owner: parts[0].to_owned(),
                repo: parts[1].to_owned(),
                git_ref: parts[2].to_owned(),
                path: parts[3..].join("/"),
            });
        }

        let rest = GITHUB_PREFIXES
            .iter()
            .find_map(|prefix| without_query.strip_prefix(prefix))
            .ok_or_else(unsupported)?;
        let parts = segments(rest);

        match parts.as_slice() {
            [owner, repo] => Ok(Self::RepoRoot {
                owner: (*owner).to_owned(),
                repo: repo.trim_end_matches(".git").to_owned(),
            }),
            [owner, repo, "blob", git_ref, path @ ..] if !path.is_empty() => Ok(Self::File {
                owner: (*owner).to_owned(),
                repo: (*repo).to_owned(),
                git_ref: (*git_ref).to_owned(),
                path: path.join("/"),
            }),
            [owner, repo, "tree", git_ref, path @ ..] => Ok(Self::Directory {
                owner: (*owner).to_owned(),
                repo: (*repo).to_owned(),
                git_ref: (*git_ref).to_owned(),
                path: path.join("/"),
            }),
            _ => Err(unsupported()),
        }
    }
}

/// Raw-content URL for a file at `git_ref`.
pub fn raw_url(owner: &str, repo: &str, git_ref: &str, path: &str) -> String {
    format!("{RAW_BASE_URL}/{owner}/{repo}/{git_ref}/{path}")
}

/// Contents API URL for a path at `git_ref`.
pub fn contents_url(owner: &str, repo: &str, git_ref: &str, path: &str) -> String {
    format!(
        "{API_BASE_URL}/repos/{owner}/{repo}/contents/{path}?ref={}",
        urlencoding::encode(git_ref)
    )
}

pub fn repository_url(owner: &str, repo: &str) -> String {
    format!("{API_BASE_URL}/repos/{owner}/{repo}")
}

/// Last non-empty path segment, used when the API gives no file name.
pub fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_owned()
}

/// Split on `/`, ignoring a trailing slash. Empty inner segments are kept so
/// that `owner//repo` does not silently collapse.
fn segments(rest: &str) -> Vec<&str> {
    let parts = rest.trim_end_matches('/').split('/').collect::<Vec<_>>();
    if parts.iter().any(|part| part.is_empty()) {
        return Vec::new();
    }
    parts
}
