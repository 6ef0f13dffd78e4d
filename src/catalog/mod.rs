use std::{fmt, str::FromStr};

/// Namespace used for entities that don't specify one.
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEntityRefError {
    #[error("entity reference is missing a kind")]
    MissingKind,
    #[error("entity reference has an empty {0}")]
    EmptyPart(&'static str),
    #[error("entity reference contains unexpected separators")]
    Malformed,
}

/// Reference to a catalog entity, stringified as `<kind>:<namespace>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    kind: String,
    namespace: String,
    name: String,
}

impl EntityRef {
    pub const KIND_USER: &'static str = "User";

    pub fn new<K, N, M>(kind: K, namespace: N, name: M) -> Self
    where
        K: Into<String>,
        N: Into<String>,
        M: Into<String>,
    {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// User entity in the default namespace.
    pub fn user<M>(name: M) -> Self
    where
        M: Into<String>,
    {
        Self::new(Self::KIND_USER, DEFAULT_NAMESPACE, name)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityRef {
    // Kind and namespace are case insensitive, the name is kept as is.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.kind.to_lowercase(),
            self.namespace.to_lowercase(),
            self.name
        )
    }
}

impl FromStr for EntityRef {
    type Err = ParseEntityRefError;

    /// Parses `<kind>:[<namespace>/]<name>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s.split_once(':').ok_or(ParseEntityRefError::MissingKind)?;
        let (namespace, name) = rest.split_once('/').unwrap_or((DEFAULT_NAMESPACE, rest));

        if kind.is_empty() {
            return Err(ParseEntityRefError::MissingKind);
        }
        if namespace.is_empty() {
            return Err(ParseEntityRefError::EmptyPart("namespace"));
        }
        if name.is_empty() {
            return Err(ParseEntityRefError::EmptyPart("name"));
        }
        if namespace.contains(':') || name.contains([':', '/']) {
            return Err(ParseEntityRefError::Malformed);
        }

        Ok(Self::new(kind, namespace, name))
    }
}
