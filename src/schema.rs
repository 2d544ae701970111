use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Successful result of exchanging an authorization code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

/// Token endpoint body as GitHub actually sends it.
///
/// GitHub reports exchange failures with HTTP 200 and an `error` field, so
/// success and failure share one shape and are told apart after parsing.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub error_uri: Option<String>,
}

impl RawTokenResponse {
    pub(crate) fn into_token(self) -> Result<TokenResponse> {
        if let Some(error) = self.error {
            let mut message = match self.error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            };
            if let Some(uri) = self.error_uri {
                message = format!("{message} (see {uri})");
            }
            return Err(Error::Provider(message));
        }

        match self.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(TokenResponse {
                access_token,
                token_type: self.token_type,
                scope: self.scope,
                refresh_token: self.refresh_token,
                expires_in: self.expires_in,
            }),
            _ => Err(Error::Provider("missing access_token in response".to_string())),
        }
    }
}

/// Authenticated user as reported by the identity endpoint.
///
/// Only the fields callers consume; everything else in the provider body is
/// ignored during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    #[serde(default)]
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type", default)]
    pub account_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_deserializes_full_body() {
        let json = r#"{
            "access_token": "gho_abc123",
            "token_type": "bearer",
            "scope": "repo,user:email",
            "refresh_token": "ghr_xyz789",
            "expires_in": 28800
        }"#;

        let raw: RawTokenResponse = serde_json::from_str(json).unwrap();
        let token = raw.into_token().unwrap();
        assert_eq!(token.access_token, "gho_abc123");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.scope, "repo,user:email");
        assert_eq!(token.refresh_token.as_deref(), Some("ghr_xyz789"));
        assert_eq!(token.expires_in, Some(28800));
    }

    #[test]
    fn test_token_response_defaults_missing_fields() {
        let raw: RawTokenResponse = serde_json::from_str(r#"{"access_token": "t"}"#).unwrap();
        let token = raw.into_token().unwrap();
        assert_eq!(token.access_token, "t");
        assert_eq!(token.token_type, "");
        assert_eq!(token.scope, "");
        assert!(token.refresh_token.is_none());
        assert!(token.expires_in.is_none());
    }

    #[test]
    fn test_error_field_beats_access_token() {
        let json = r#"{
            "access_token": "t",
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired.",
            "error_uri": "https://docs.github.com/apps"
        }"#;

        let raw: RawTokenResponse = serde_json::from_str(json).unwrap();
        let err = raw.into_token().unwrap_err();
        match err {
            Error::Provider(message) => {
                assert!(message.contains("bad_verification_code"));
                assert!(message.contains("incorrect or expired"));
                assert!(message.contains("https://docs.github.com/apps"));
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_access_token_is_provider_error() {
        let raw: RawTokenResponse = serde_json::from_str("{}").unwrap();
        let err = raw.into_token().unwrap_err();
        assert!(matches!(err, Error::Provider(m) if m.contains("missing access_token")));
    }

    #[test]
    fn test_empty_access_token_is_provider_error() {
        let raw: RawTokenResponse = serde_json::from_str(r#"{"access_token": ""}"#).unwrap();
        assert!(raw.into_token().is_err());
    }

    #[test]
    fn test_user_profile_renames_type_field() {
        let json = r#"{
            "id": 583231,
            "login": "octocat",
            "name": "The Octocat",
            "email": "octocat@github.com",
            "type": "User",
            "company": "GitHub",
            "public_repos": 8
        }"#;

        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 583231);
        assert_eq!(user.login, "octocat");
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
        assert_eq!(user.account_type, "User");
        assert_eq!(user.company.as_deref(), Some("GitHub"));
    }

    #[test]
    fn test_user_profile_tolerates_absent_optionals() {
        let user: UserProfile = serde_json::from_str(r#"{"id": 1, "login": "x"}"#).unwrap();
        assert!(user.name.is_none());
        assert!(user.email.is_none());
        assert!(user.company.is_none());
        assert_eq!(user.account_type, "");
    }

    #[test]
    fn test_user_profile_serializes_without_absent_fields() {
        let user: UserProfile = serde_json::from_str(r#"{"id": 1, "login": "x"}"#).unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("name"));
        assert!(!json.contains("email"));
        assert!(!json.contains("company"));
    }
}
