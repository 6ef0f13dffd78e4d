use super::{
    profile::{AuthProfile, AuthResult, FullProfile, ProfileEmail},
    provider::{Authenticator, ProviderInfo},
};

use serde::Deserialize;

/// Must match the provider key in the auth configuration (`auth.providers.github`).
pub const PROVIDER_ID: &str = "github";

pub const PROVIDER_TITLE: &str = "GitHub";

pub const DEFAULT_SCOPES: &[&str] = &["read:user", "user:email"];

pub fn provider_info() -> ProviderInfo {
    ProviderInfo {
        id: PROVIDER_ID,
        title: PROVIDER_TITLE,
        default_scopes: DEFAULT_SCOPES,
    }
}

/// Authenticated user as returned by `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    /// Public email, if the user has set one.
    pub email: Option<String>,
}

/// Entry of `GET /user/emails`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    pub primary: bool,
    pub verified: bool,
}

impl GitHubEmail {
    fn is_primary_verified(&self) -> bool {
        self.primary && self.verified
    }
}

/// GitHub OAuth authenticator.
///
/// The authorization code exchange happens upstream; this describes the
/// provider to the registry and shapes the GitHub API payloads into the
/// profile handed to the sign-in resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubAuthenticator;

impl GitHubAuthenticator {
    /// Builds the sign-in profile from the user and their email addresses.
    ///
    /// Only verified addresses are kept, the primary one first. The profile
    /// email is the public email, or else the primary verified address.
    pub fn transform_profile(
        &self,
        user: &GitHubUser,
        emails: &[GitHubEmail],
    ) -> (AuthProfile, AuthResult) {
        let mut emails = emails.iter().filter(|e| e.verified).collect::<Vec<_>>();
        // Stable, keeps the API order of the others.
        emails.sort_by_key(|e| !e.is_primary_verified());

        let login = Some(user.login.clone()).filter(|l| !l.is_empty());
        let id = Some(user.id).filter(|id| *id != 0).map(|id| id.to_string());

        let email = user
            .email
            .clone()
            .filter(|e| !e.is_empty())
            .or_else(|| {
                emails
                    .first()
                    .filter(|e| e.is_primary_verified())
                    .map(|e| e.email.clone())
            });

        let profile = AuthProfile {
            login: login.clone(),
            username: None,
            email,
            id: id.clone(),
        };

        let result = AuthResult::with_full_profile(FullProfile {
            username: login,
            id,
            emails: emails
                .into_iter()
                .map(|e| ProfileEmail::from(e.email.as_str()))
                .collect(),
        });

        (profile, result)
    }
}

impl Authenticator for GitHubAuthenticator {
    fn provider_info(&self) -> ProviderInfo {
        provider_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::resolver::resolve_identity;

    fn emails() -> Vec<GitHubEmail> {
        serde_json::from_str(
            r#"[
                { "email": "old@example.com", "primary": false, "verified": true, "visibility": null },
                { "email": "unverified@example.com", "primary": false, "verified": false, "visibility": null },
                { "email": "octocat@github.com", "primary": true, "verified": true, "visibility": "public" }
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn primary_verified_email_first() {
        let user: GitHubUser =
            serde_json::from_str(r#"{"login": "octocat", "id": 583231, "email": null, "type": "User"}"#)
                .unwrap();

        let (profile, result) = GitHubAuthenticator.transform_profile(&user, &emails());

        assert_eq!(profile.login.as_deref(), Some("octocat"));
        assert_eq!(profile.id.as_deref(), Some("583231"));
        assert_eq!(profile.email.as_deref(), Some("octocat@github.com"));

        let full = result.full_profile.as_ref().unwrap();
        assert_eq!(full.username.as_deref(), Some("octocat"));
        assert_eq!(
            full.emails,
            vec![
                ProfileEmail::from("octocat@github.com"),
                ProfileEmail::from("old@example.com"),
            ]
        );

        assert_eq!(
            resolve_identity(&profile, &result).unwrap().subject,
            "user:default/octocat"
        );
    }

    #[test]
    fn public_email_preferred() {
        let user = GitHubUser {
            login: "octocat".into(),
            id: 1,
            email: Some("public@example.com".into()),
        };

        let (profile, _) = GitHubAuthenticator.transform_profile(&user, &emails());
        assert_eq!(profile.email.as_deref(), Some("public@example.com"));
    }

    #[test]
    fn unverified_primary_is_not_used() {
        let user = GitHubUser {
            login: String::new(),
            id: 42,
            email: None,
        };
        let emails = vec![GitHubEmail {
            email: "primary@example.com".into(),
            primary: true,
            verified: false,
        }];

        let (profile, result) = GitHubAuthenticator.transform_profile(&user, &emails);

        assert_eq!(profile.login, None);
        assert_eq!(profile.email, None);
        assert_eq!(result.full_profile.as_ref().unwrap().first_email(), None);
        assert_eq!(
            resolve_identity(&profile, &result).unwrap().subject,
            "user:default/github-user-42"
        );
    }
}
