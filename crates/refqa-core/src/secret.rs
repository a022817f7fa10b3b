use std::fmt;

/// Wrapper for sensitive strings with redacted Debug/Display.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// First non-blank value among the given environment variables.
    #[must_use]
    pub fn from_env(keys: &[&str]) -> Option<Self> {
        keys.iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|v| !v.trim().is_empty())
            .map(Self)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
