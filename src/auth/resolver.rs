use crate::{catalog::EntityRef, utils};

use super::{
    profile::{AuthProfile, AuthResult, FullProfile, SignInInfo},
    token::{IdentityClaims, TokenRequest},
};

/// Login rejected because the provider payload carries no usable identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("login failed, no valid user identifier found")]
pub struct IdentityResolutionError;

/// Stable identity derived from a provider payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub subject: String,
}

impl ResolvedIdentity {
    pub fn ownership_entity_refs(&self) -> Vec<String> {
        vec![self.subject.clone()]
    }
}

impl From<ResolvedIdentity> for TokenRequest {
    fn from(identity: ResolvedIdentity) -> Self {
        let ent = identity.ownership_entity_refs();

        TokenRequest {
            claims: IdentityClaims {
                sub: identity.subject,
                ent,
            },
        }
    }
}

/// Turns a successful upstream authentication into a token request.
pub trait SignInResolver: Send + Sync {
    fn resolve(&self, info: &SignInInfo) -> Result<TokenRequest, IdentityResolutionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignInOptions {
    /// Emit the raw profile and result at debug level.
    pub log_payloads: bool,
}

/// Identifiers picked from the profile, falling back to the full profile.
#[derive(Debug, PartialEq, Eq)]
struct Identifiers<'a> {
    name_hint: Option<&'a str>,
    email: Option<&'a str>,
    user_id: Option<&'a str>,
}

impl<'a> Identifiers<'a> {
    fn extract(profile: &'a AuthProfile, result: &'a AuthResult) -> Self {
        let full = result.full_profile.as_ref();

        Self {
            name_hint: profile
                .login
                .as_deref()
                .or(profile.username.as_deref())
                .or_else(|| full.and_then(|p| p.username.as_deref())),
            email: profile
                .email
                .as_deref()
                .or_else(|| full.and_then(FullProfile::first_email)),
            user_id: profile
                .id
                .as_deref()
                .or_else(|| full.and_then(|p| p.id.as_deref())),
        }
    }

    fn is_empty(&self) -> bool {
        self.name_hint.is_none() && self.email.is_none() && self.user_id.is_none()
    }

    fn username(&self) -> Option<String> {
        if let Some(name) = self.name_hint {
            return Some(name.to_string());
        }

        if let Some(local_part) = self.email.and_then(utils::get_email_local_part) {
            return Some(local_part.to_string());
        }

        self.user_id.map(|id| format!("github-user-{id}"))
    }
}

/// Derives the user entity for a GitHub login.
///
/// The name is taken from the login, then the local part of the email address,
/// then the numeric account id. The login is rejected if none of them is present.
pub fn resolve_identity(
    profile: &AuthProfile,
    result: &AuthResult,
) -> Result<ResolvedIdentity, IdentityResolutionError> {
    let ids = Identifiers::extract(profile, result);

    if ids.is_empty() {
        tracing::warn!("no valid identifier found in profile");
        return Err(IdentityResolutionError);
    }

    // Only an email with an empty local part, e.g. "@example.com".
    let username = ids.username().ok_or_else(|| {
        tracing::warn!("email address has no local part and no login or user id is present");
        IdentityResolutionError
    })?;

    Ok(ResolvedIdentity {
        subject: EntityRef::user(username).to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct GitHubSignInResolver {
    options: SignInOptions,
}

impl GitHubSignInResolver {
    pub fn new(options: SignInOptions) -> Self {
        Self { options }
    }
}

impl SignInResolver for GitHubSignInResolver {
    fn resolve(&self, info: &SignInInfo) -> Result<TokenRequest, IdentityResolutionError> {
        if self.options.log_payloads {
            tracing::debug!(profile = ?info.profile, result = ?info.result, "github sign-in payload");
        }

        let identity = resolve_identity(&info.profile, &info.result)?;

        tracing::info!(subject = %identity.subject, "github sign-in resolved");

        Ok(identity.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::profile::ProfileEmail;

    fn profile() -> AuthProfile {
        AuthProfile::default()
    }

    fn subject(profile: &AuthProfile, result: &AuthResult) -> String {
        resolve_identity(profile, result).unwrap().subject
    }

    #[test]
    fn login_wins() {
        let p = AuthProfile {
            login: Some("alice".into()),
            username: Some("alice-username".into()),
            email: Some("someone@example.com".into()),
            id: Some("7".into()),
        };
        let r = AuthResult::with_full_profile(FullProfile {
            username: Some("other".into()),
            id: Some("8".into()),
            emails: vec!["other@example.com".into()],
        });

        assert_eq!(subject(&p, &r), "user:default/alice");
        assert_eq!(subject(&p, &AuthResult::default()), "user:default/alice");
    }

    #[test]
    fn name_hint_precedence() {
        let p = AuthProfile {
            username: Some("carol".into()),
            ..profile()
        };
        let r = AuthResult::with_full_profile(FullProfile {
            username: Some("dave".into()),
            ..Default::default()
        });

        assert_eq!(subject(&p, &r), "user:default/carol");
        assert_eq!(subject(&profile(), &r), "user:default/dave");
    }

    #[test]
    fn email_local_part() {
        let p = AuthProfile {
            email: Some("bob@example.com".into()),
            id: Some("42".into()),
            ..profile()
        };
        assert_eq!(subject(&p, &AuthResult::default()), "user:default/bob");

        let r = AuthResult::with_full_profile(FullProfile {
            emails: vec!["erin@example.com".into(), "frank@example.com".into()],
            ..Default::default()
        });
        assert_eq!(subject(&profile(), &r), "user:default/erin");
    }

    #[test]
    fn profile_email_before_full_profile_email() {
        let p = AuthProfile {
            email: Some("bob@example.com".into()),
            ..profile()
        };
        let r = AuthResult::with_full_profile(FullProfile {
            emails: vec!["erin@example.com".into()],
            ..Default::default()
        });

        assert_eq!(subject(&p, &r), "user:default/bob");
    }

    #[test]
    fn numeric_id_fallback() {
        let r = AuthResult::with_full_profile(FullProfile {
            id: Some("42".into()),
            ..Default::default()
        });
        assert_eq!(subject(&profile(), &r), "user:default/github-user-42");

        let p = AuthProfile {
            id: Some("7".into()),
            ..profile()
        };
        assert_eq!(subject(&p, &r), "user:default/github-user-7");
    }

    #[test]
    fn reject_without_identifier() {
        assert_eq!(
            resolve_identity(&profile(), &AuthResult::default()),
            Err(IdentityResolutionError)
        );

        let r = AuthResult::with_full_profile(FullProfile {
            emails: vec![ProfileEmail { value: None }],
            ..Default::default()
        });
        assert_eq!(resolve_identity(&profile(), &r), Err(IdentityResolutionError));
    }

    #[test]
    fn empty_local_part_falls_through() {
        let p = AuthProfile {
            email: Some("@example.com".into()),
            ..profile()
        };
        assert_eq!(
            resolve_identity(&p, &AuthResult::default()),
            Err(IdentityResolutionError)
        );

        let p = AuthProfile {
            id: Some("42".into()),
            ..p
        };
        assert_eq!(subject(&p, &AuthResult::default()), "user:default/github-user-42");
    }

    #[test]
    fn resolution_is_deterministic() {
        let p = AuthProfile {
            email: Some("bob@example.com".into()),
            ..profile()
        };

        assert_eq!(
            resolve_identity(&p, &AuthResult::default()),
            resolve_identity(&p, &AuthResult::default())
        );
    }

    #[test]
    fn scenarios_from_json() {
        let resolver = GitHubSignInResolver::default();

        let cases = [
            (r#"{"profile": {"login": "alice"}, "result": {}}"#, Some("user:default/alice")),
            (r#"{"profile": {"email": "bob@example.com"}, "result": {}}"#, Some("user:default/bob")),
            (r#"{"profile": {}, "result": {"fullProfile": {"id": 42}}}"#, Some("user:default/github-user-42")),
            (r#"{"profile": {"login": "alice", "id": 1.5}}"#, Some("user:default/alice")),
            (r#"{"profile": {"login": "alice", "email": ["a@b.c"]}}"#, Some("user:default/alice")),
            (
                r#"{"profile": {"login": "alice"}, "result": {"fullProfile": {"emails": {"value": "x@y.z"}}}}"#,
                Some("user:default/alice"),
            ),
            (
                r#"{"profile": {"email": 5}, "result": {"fullProfile": {"id": 7, "emails": [null]}}}"#,
                Some("user:default/github-user-7"),
            ),
            (r#"{"profile": {}, "result": {}}"#, None),
            (r#"{"profile": {"id": true, "email": false}}"#, None),
        ];

        for (json, expected) in cases {
            let info: SignInInfo = serde_json::from_str(json).unwrap();
            let res = resolver.resolve(&info);

            match expected {
                Some(subject) => {
                    let request = res.unwrap();
                    assert_eq!(request.claims.sub, subject);
                    assert_eq!(request.claims.ent, vec![subject.to_string()]);
                }
                None => assert_eq!(res, Err(IdentityResolutionError)),
            }
        }
    }
}
