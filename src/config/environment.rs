use serde::Deserialize;
use std::fmt;

/// Process environment mode, read from `NODE_ENV`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
    /// Any other label; treated as non-production.
    Other(String),
}

impl Environment {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "production" => Environment::Production,
            "development" | "" => Environment::Development,
            "test" => Environment::Test,
            _ => Environment::Other(label.to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Other(label) => label,
        }
    }
}

impl From<String> for Environment {
    fn from(label: String) -> Self {
        Environment::from_label(&label)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
