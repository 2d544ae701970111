use base64::{engine::general_purpose::STANDARD, Engine};
use http::{Method, StatusCode};
use tracing::debug;
use url::{form_urlencoded, Url};

use crate::{
    error::{Error, Result},
    schema::{RawTokenResponse, TokenResponse, UserProfile},
    state::generate_state,
    transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport},
};

pub const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_USER_URL: &str = "https://api.github.com/user";

const GITHUB_API_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("gh-oauth-helper/", env!("CARGO_PKG_VERSION"));

/// GitHub OAuth app credentials and flow settings.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    /// When set, construction rejects any redirect URI that is not HTTPS.
    pub secure_mode: bool,
}

/// GitHub OAuth 2.0 authorization-code flow engine.
///
/// Holds validated credentials and a transport, nothing else. Every
/// operation takes `&self` and performs at most one HTTP round trip, so a
/// single engine can be shared freely across tasks.
pub struct GitHubOAuth {
    config: OAuthConfig,
    transport: Box<dyn HttpTransport>,
}

impl GitHubOAuth {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        Self::with_transport(config, Box::new(ReqwestTransport::new()))
    }

    /// Construct with a caller-supplied transport. Validates the
    /// configuration; no network I/O happens here.
    pub fn with_transport(
        mut config: OAuthConfig,
        transport: Box<dyn HttpTransport>,
    ) -> Result<Self> {
        if config.client_id.is_empty() {
            return Err(Error::Configuration("client_id is required".to_string()));
        }
        if config.client_secret.is_empty() {
            return Err(Error::Configuration(
                "client_secret is required".to_string(),
            ));
        }

        // An empty redirect URI means "not configured".
        if config.redirect_uri.as_deref() == Some("") {
            config.redirect_uri = None;
        }
        if config.secure_mode {
            if let Some(redirect_uri) = &config.redirect_uri {
                if !redirect_uri.starts_with("https://") {
                    return Err(Error::Configuration(
                        "secure mode requires an HTTPS redirect URI".to_string(),
                    ));
                }
            }
        }

        Ok(Self { config, transport })
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.config.redirect_uri.as_deref()
    }

    /// Build the authorization URL the user must visit, returning it together
    /// with the CSRF state embedded in it.
    ///
    /// A non-empty caller-supplied `state` is used as-is; otherwise a fresh
    /// random token is generated. The caller stores the returned state and
    /// passes it back to [`exchange_code`](Self::exchange_code) when the
    /// callback arrives. Scopes are requested in the order given, joined by
    /// spaces per GitHub's convention; an empty scope list simply omits the
    /// `scope` parameter.
    pub fn authorization_url(&self, scopes: &[String], state: Option<String>) -> (String, String) {
        let state = match state {
            Some(s) if !s.is_empty() => s,
            _ => generate_state(),
        };

        let mut url = format!(
            "{GITHUB_AUTH_URL}?client_id={}",
            urlencoding::encode(&self.config.client_id)
        );
        if let Some(redirect_uri) = &self.config.redirect_uri {
            url.push_str(&format!(
                "&redirect_uri={}",
                urlencoding::encode(redirect_uri)
            ));
        }
        if !scopes.is_empty() {
            url.push_str(&format!(
                "&scope={}",
                urlencoding::encode(&scopes.join(" "))
            ));
        }
        url.push_str(&format!("&state={}", urlencoding::encode(&state)));

        (url, state)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// When both `state` and `expected_state` are supplied they must match;
    /// a mismatch aborts the flow before any network call is made.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: Option<&str>,
        expected_state: Option<&str>,
    ) -> Result<TokenResponse> {
        if code.is_empty() {
            return Err(Error::Validation(
                "authorization code must not be empty".to_string(),
            ));
        }
        if let (Some(returned), Some(expected)) = (state, expected_state) {
            if returned != expected {
                return Err(Error::CsrfMismatch);
            }
        }

        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("client_id", &self.config.client_id);
        form.append_pair("client_secret", &self.config.client_secret);
        form.append_pair("code", code);
        if let Some(redirect_uri) = &self.config.redirect_uri {
            form.append_pair("redirect_uri", redirect_uri);
        }
        if let Some(state) = state {
            form.append_pair("state", state);
        }

        debug!("Exchanging authorization code at {}", GITHUB_TOKEN_URL);
        let request = HttpRequest::new(Method::POST, GITHUB_TOKEN_URL)
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_header("User-Agent", USER_AGENT)
            .with_body(form.finish());
        let response = self.transport.execute(request).await?;

        if !response.status.is_success() {
            return Err(provider_error("token endpoint", &response));
        }

        let raw: RawTokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| Error::Provider(format!("malformed token response: {e}")))?;
        raw.into_token()
    }

    /// Check that an access token can reach the authenticated user endpoint,
    /// returning the user it belongs to.
    pub async fn test_api_access(&self, token: &str) -> Result<UserProfile> {
        if token.is_empty() {
            return Err(Error::Validation(
                "access token must not be empty".to_string(),
            ));
        }

        debug!("Checking token against {}", GITHUB_USER_URL);
        let request = HttpRequest::new(Method::GET, GITHUB_USER_URL)
            .with_header("Accept", GITHUB_API_ACCEPT)
            .with_header("User-Agent", USER_AGENT)
            .with_header("Authorization", format!("Bearer {token}"));
        let response = self.transport.execute(request).await?;

        match response.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication(
                "token invalid or expired".to_string(),
            )),
            status if status.is_success() => serde_json::from_str(&response.body)
                .map_err(|e| Error::Provider(format!("malformed user profile: {e}"))),
            _ => Err(provider_error("user endpoint", &response)),
        }
    }

    /// Revoke an access token through the app-credentials endpoint.
    ///
    /// Returns `true` when the provider confirms the revocation and `false`
    /// when the token was already invalid or unknown (HTTP 404), which is an
    /// ordinary outcome rather than an error.
    pub async fn revoke_token(&self, token: &str) -> Result<bool> {
        if token.is_empty() {
            return Err(Error::Validation(
                "access token must not be empty".to_string(),
            ));
        }

        // Revocation authenticates as the app, not as the token being revoked.
        let credentials = STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        let url = format!(
            "{GITHUB_API_URL}/applications/{}/token",
            self.config.client_id
        );

        debug!("Revoking a token for client {}", self.config.client_id);
        let request = HttpRequest::new(Method::DELETE, url)
            .with_header("Accept", GITHUB_API_ACCEPT)
            .with_header("User-Agent", USER_AGENT)
            .with_header("Authorization", format!("Basic {credentials}"))
            .with_header("Content-Type", "application/json")
            .with_body(serde_json::json!({ "access_token": token }).to_string());
        let response = self.transport.execute(request).await?;

        match response.status {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(provider_error("revocation endpoint", &response)),
        }
    }
}

fn provider_error(endpoint: &str, response: &HttpResponse) -> Error {
    Error::Provider(format!(
        "{endpoint} returned HTTP {}: {}",
        response.status.as_u16(),
        response.body
    ))
}

/// Extract the `code` and optional `state` from a pasted callback URL.
///
/// Provider-reported failures (`error`/`error_description` query parameters)
/// surface as [`Error::Provider`]; a URL without a `code` parameter is a
/// [`Error::Validation`].
pub fn parse_callback_url(callback_url: &str) -> Result<(String, Option<String>)> {
    let parsed = Url::parse(callback_url)
        .map_err(|e| Error::Validation(format!("invalid callback URL: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let message = match error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        return Err(Error::Provider(message));
    }

    match code {
        Some(code) => Ok((code, state)),
        None => Err(Error::Validation(
            "callback URL has no code parameter".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: Some("http://localhost:8080/callback".to_string()),
            secure_mode: false,
        }
    }

    #[test]
    fn test_construction_requires_client_id() {
        let mut cfg = config();
        cfg.client_id = String::new();
        assert!(matches!(
            GitHubOAuth::new(cfg).err(),
            Some(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_construction_requires_client_secret() {
        let mut cfg = config();
        cfg.client_secret = String::new();
        assert!(matches!(
            GitHubOAuth::new(cfg).err(),
            Some(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_secure_mode_rejects_http_redirect() {
        let mut cfg = config();
        cfg.secure_mode = true;
        assert!(matches!(
            GitHubOAuth::new(cfg).err(),
            Some(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_secure_mode_accepts_https_redirect() {
        let mut cfg = config();
        cfg.secure_mode = true;
        cfg.redirect_uri = Some("https://example.com/callback".to_string());
        assert!(GitHubOAuth::new(cfg).is_ok());
    }

    #[test]
    fn test_secure_mode_without_redirect_is_allowed() {
        let mut cfg = config();
        cfg.secure_mode = true;
        cfg.redirect_uri = None;
        assert!(GitHubOAuth::new(cfg).is_ok());
    }

    #[test]
    fn test_empty_redirect_is_treated_as_absent() {
        let mut cfg = config();
        cfg.secure_mode = true;
        cfg.redirect_uri = Some(String::new());
        let oauth = GitHubOAuth::new(cfg).unwrap();
        assert!(oauth.redirect_uri().is_none());

        let (url, _) = oauth.authorization_url(&[], None);
        assert!(!url.contains("redirect_uri"));
    }

    #[test]
    fn test_authorization_url_parameter_order_and_encoding() {
        let oauth = GitHubOAuth::new(config()).unwrap();
        let scopes = vec!["user:email".to_string(), "repo".to_string()];
        let (url, _) = oauth.authorization_url(&scopes, Some("abc123".to_string()));

        assert_eq!(
            url,
            "https://github.com/login/oauth/authorize\
             ?client_id=test-client-id\
             &redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fcallback\
             &scope=user%3Aemail%20repo\
             &state=abc123"
        );
    }

    #[test]
    fn test_returned_state_is_embedded_state() {
        let oauth = GitHubOAuth::new(config()).unwrap();

        let (url, state) = oauth.authorization_url(&[], Some("my-state".to_string()));
        assert_eq!(state, "my-state");
        assert!(url.ends_with("&state=my-state"));

        let (url, state) = oauth.authorization_url(&[], None);
        assert!(url.ends_with(&format!("&state={state}")));
    }

    #[test]
    fn test_generated_state_when_caller_supplies_none() {
        let oauth = GitHubOAuth::new(config()).unwrap();
        let (_, state) = oauth.authorization_url(&[], None);
        assert!(state.len() >= 32);
    }

    #[test]
    fn test_empty_supplied_state_is_replaced() {
        let oauth = GitHubOAuth::new(config()).unwrap();
        let (_, state) = oauth.authorization_url(&[], Some(String::new()));
        assert!(!state.is_empty());
    }

    #[test]
    fn test_empty_scopes_produce_no_scope_parameter() {
        let oauth = GitHubOAuth::new(config()).unwrap();
        let (url, _) = oauth.authorization_url(&[], None);
        assert!(!url.contains("scope="));
    }

    #[test]
    fn test_parse_callback_url_extracts_code_and_state() {
        let (code, state) =
            parse_callback_url("http://localhost:8080/callback?code=abc&state=xyz").unwrap();
        assert_eq!(code, "abc");
        assert_eq!(state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_callback_url_without_state() {
        let (code, state) = parse_callback_url("http://localhost:8080/callback?code=abc").unwrap();
        assert_eq!(code, "abc");
        assert!(state.is_none());
    }

    #[test]
    fn test_parse_callback_url_surfaces_provider_error() {
        let err = parse_callback_url(
            "http://localhost:8080/callback?error=access_denied&error_description=The+user+denied+access",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Provider(m) if m.contains("access_denied")));
    }

    #[test]
    fn test_parse_callback_url_requires_code() {
        let err = parse_callback_url("http://localhost:8080/callback?state=xyz").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_parse_callback_url_rejects_garbage() {
        assert!(matches!(
            parse_callback_url("not a url"),
            Err(Error::Validation(_))
        ));
    }
}
