/// Where a process-wide default credential comes from.
///
/// Environment variables are read on every [`resolve`](Self::resolve) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// No default credential.
    #[default]
    None,
    /// Read the named environment variable.
    Env(String),
    /// Fixed value, mainly for tests and embedding.
    Fixed(String),
}

impl CredentialSource {
    pub fn env(name: impl Into<String>) -> Self {
        Self::Env(name.into())
    }

    pub fn fixed(value: impl Into<String>) -> Self {
        Self::Fixed(value.into())
    }

    /// Explicit per-request credential first, then the default. Blank values
    /// count as absent.
    pub fn resolve(&self, explicit: Option<&str>) -> Option<String> {
        if let Some(value) = explicit.map(str::trim).filter(|value| !value.is_empty()) {
            return Some(value.to_owned());
        }

        let default = match self {
            Self::None => None,
            Self::Env(name) => std::env::var(name).ok(),
            Self::Fixed(value) => Some(value.clone()),
        };
        default
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }
}
