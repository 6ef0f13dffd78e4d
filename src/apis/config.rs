use crate::config::AppConfig;

use serde_json::{json, Value};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config value at '{0}'")]
    Missing(String),
    #[error("invalid type at '{key}', expected {expected}")]
    InvalidType { key: String, expected: &'static str },
}

/// Read-only view of the portal configuration, addressed by dotted keys.
#[derive(Debug, Clone, Default)]
pub struct ConfigReader {
    data: Value,
    prefix: String,
}

impl ConfigReader {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            prefix: String::new(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.data, |value, part| value.get(part))
            .filter(|value| !value.is_null())
    }

    fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn get_optional_string(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigError::InvalidType {
                key: self.full_key(key),
                expected: "string",
            }),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        self.get_optional_string(key)?
            .ok_or_else(|| ConfigError::Missing(self.full_key(key)))
    }

    pub fn get_optional_config(&self, key: &str) -> Result<Option<ConfigReader>, ConfigError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(value @ Value::Object(_)) => Ok(Some(ConfigReader {
                data: value.clone(),
                prefix: self.full_key(key),
            })),
            Some(_) => Err(ConfigError::InvalidType {
                key: self.full_key(key),
                expected: "object",
            }),
        }
    }

    pub fn get_optional_config_array(&self, key: &str) -> Result<Vec<ConfigReader>, ConfigError> {
        match self.lookup(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(_) => Ok(ConfigReader {
                        data: item.clone(),
                        prefix: format!("{}[{}]", self.full_key(key), i),
                    }),
                    _ => Err(ConfigError::InvalidType {
                        key: format!("{}[{}]", self.full_key(key), i),
                        expected: "object",
                    }),
                })
                .collect(),
            Some(_) => Err(ConfigError::InvalidType {
                key: self.full_key(key),
                expected: "array",
            }),
        }
    }
}

impl From<&AppConfig> for ConfigReader {
    /// Projects the settings visible to the frontend. Client secrets are left out.
    fn from(config: &AppConfig) -> Self {
        let mut providers = serde_json::Map::new();
        if let Some(github) = config.providers().github {
            let mut environments = serde_json::Map::new();
            environments.insert(
                config.auth_environment.clone(),
                json!({ "clientId": github.client_id }),
            );
            providers.insert("github".into(), Value::Object(environments));
        }

        let github_integrations = config
            .integrations_github_hosts
            .iter()
            .map(|host| json!({ "host": host }))
            .collect::<Vec<_>>();

        Self::new(json!({
            "backend": { "baseUrl": config.backend_base_url.as_str() },
            "auth": {
                "environment": config.auth_environment,
                "providers": providers,
            },
            "integrations": { "github": github_integrations },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> ConfigReader {
        ConfigReader::new(json!({
            "backend": { "baseUrl": "https://portal.example.com", "port": 7007 },
            "integrations": {
                "github": [{ "host": "github.com" }, { "host": "ghe.example.com", "apiBaseUrl": "https://ghe.example.com/api/v3" }],
                "gitlab": "invalid",
            },
            "auth": { "environment": null },
        }))
    }

    #[test]
    fn read_strings() {
        let config = reader();

        assert_eq!(
            config.get_string("backend.baseUrl").unwrap(),
            "https://portal.example.com"
        );
        assert_eq!(config.get_optional_string("backend.missing").unwrap(), None);
        assert_eq!(config.get_optional_string("auth.environment").unwrap(), None);
        assert!(config.has("backend"));
        assert!(!config.has("auth.environment"));
        assert_eq!(
            config.get_string("app.title"),
            Err(ConfigError::Missing("app.title".into()))
        );
        assert_eq!(
            config.get_string("backend.port"),
            Err(ConfigError::InvalidType {
                key: "backend.port".into(),
                expected: "string"
            })
        );
    }

    #[test]
    fn read_nested_configs() {
        let config = reader();

        let github = config.get_optional_config_array("integrations.github").unwrap();
        assert_eq!(github.len(), 2);
        assert_eq!(github[1].get_string("host").unwrap(), "ghe.example.com");
        assert_eq!(
            github[0].get_string("apiBaseUrl"),
            Err(ConfigError::Missing("integrations.github[0].apiBaseUrl".into()))
        );

        assert!(config
            .get_optional_config_array("integrations.bitbucket")
            .unwrap()
            .is_empty());
        assert!(config.get_optional_config_array("integrations.gitlab").is_err());

        let backend = config.get_optional_config("backend").unwrap().unwrap();
        assert_eq!(
            backend.get_string("port"),
            Err(ConfigError::InvalidType {
                key: "backend.port".into(),
                expected: "string"
            })
        );
    }
}
