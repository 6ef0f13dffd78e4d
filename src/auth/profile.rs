use crate::utils::serde::{
    deserialize_identifier, deserialize_lenient, deserialize_lenient_option,
    deserialize_lenient_vec, deserialize_non_empty,
};

use serde::{Deserialize, Serialize};

/// Identity attributes returned by the upstream OAuth provider.
///
/// Every field is optional; empty strings and mistyped values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProfile {
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub login: Option<String>,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub id: Option<String>,
}

/// Raw result envelope of the upstream authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    #[serde(default, deserialize_with = "deserialize_lenient_option")]
    pub full_profile: Option<FullProfile>,
}

impl AuthResult {
    pub fn with_full_profile(full_profile: FullProfile) -> Self {
        Self {
            full_profile: Some(full_profile),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullProfile {
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_vec")]
    pub emails: Vec<ProfileEmail>,
}

impl FullProfile {
    /// First email address as ordered by the provider.
    pub fn first_email(&self) -> Option<&str> {
        self.emails.first().and_then(|e| e.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEmail {
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub value: Option<String>,
}

impl From<&str> for ProfileEmail {
    fn from(value: &str) -> Self {
        Self {
            value: Some(value.to_string()).filter(|v| !v.is_empty()),
        }
    }
}

/// Everything the provider hands to a sign-in resolver.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInInfo {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub profile: AuthProfile,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub result: AuthResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_github_payload() {
        let info: SignInInfo = serde_json::from_str(
            r#"{
                "profile": {
                    "email": "octocat@github.com",
                    "displayName": "The Octocat",
                    "picture": "https://avatars.githubusercontent.com/u/583231"
                },
                "result": {
                    "fullProfile": {
                        "id": 583231,
                        "username": "octocat",
                        "provider": "github",
                        "emails": [{ "value": "octocat@github.com" }, { "value": "other@github.com" }]
                    },
                    "session": { "accessToken": "gho_xxx", "scope": "read:user,user:email" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(info.profile.login, None);
        assert_eq!(info.profile.email.as_deref(), Some("octocat@github.com"));

        let full = info.result.full_profile.unwrap();
        assert_eq!(full.username.as_deref(), Some("octocat"));
        assert_eq!(full.id.as_deref(), Some("583231"));
        assert_eq!(full.first_email(), Some("octocat@github.com"));
    }

    #[test]
    fn parse_sparse_payload() {
        let info: SignInInfo =
            serde_json::from_str(r#"{ "profile": null, "result": { "fullProfile": { "emails": null } } }"#)
                .unwrap();

        assert_eq!(info.profile, AuthProfile::default());
        assert_eq!(info.result.full_profile.unwrap().first_email(), None);

        let info: SignInInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info.profile, AuthProfile::default());
        assert_eq!(info.result, AuthResult::default());
    }

    #[test]
    fn parse_malformed_fields() {
        let info: SignInInfo = serde_json::from_str(
            r#"{
                "profile": { "login": "alice", "id": 1.5, "email": 42, "username": ["a"] },
                "result": { "fullProfile": { "id": true, "emails": "alice@example.com" } }
            }"#,
        )
        .unwrap();

        assert_eq!(info.profile.login.as_deref(), Some("alice"));
        assert_eq!(info.profile.id, None);
        assert_eq!(info.profile.email, None);
        assert_eq!(info.profile.username, None);

        let full = info.result.full_profile.unwrap();
        assert_eq!(full.id, None);
        assert!(full.emails.is_empty());
    }

    #[test]
    fn parse_malformed_envelopes() {
        let info: SignInInfo =
            serde_json::from_str(r#"{ "profile": "alice", "result": { "fullProfile": 7 } }"#)
                .unwrap();

        assert_eq!(info.profile, AuthProfile::default());
        assert_eq!(info.result.full_profile, None);

        let info: SignInInfo = serde_json::from_str(
            r#"{ "result": { "fullProfile": { "emails": [7, { "value": "second@example.com" }] } } }"#,
        )
        .unwrap();

        let full = info.result.full_profile.unwrap();
        assert_eq!(full.emails.len(), 2);
        assert_eq!(full.first_email(), None);
    }

    #[test]
    fn first_email_only() {
        let full = FullProfile {
            emails: vec![ProfileEmail { value: None }, "second@example.com".into()],
            ..Default::default()
        };

        assert_eq!(full.first_email(), None);
    }
}
