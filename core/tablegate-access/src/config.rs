use serde::{Deserialize, Serialize};

/// How backend action names are derived from entity types.
///
/// The service for entity type `T` is `action_prefix + T + action_suffix`
/// and each verb is dispatched as `"<service>.<verb>"`, e.g. `DB_Users.find`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub action_prefix: String,
    pub action_suffix: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            action_prefix: "DB_".to_string(),
            action_suffix: "s".to_string(),
        }
    }
}

impl AccessConfig {
    /// Parses a config object; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Backend service name for `entity_type`.
    pub fn service_name(&self, entity_type: &str) -> String {
        format!("{}{}{}", self.action_prefix, entity_type, self.action_suffix)
    }

    /// Inverse of [`AccessConfig::service_name`].
    pub fn entity_type<'a>(&self, service: &'a str) -> Option<&'a str> {
        service
            .strip_prefix(self.action_prefix.as_str())?
            .strip_suffix(self.action_suffix.as_str())
            .filter(|t| !t.is_empty())
    }
}
