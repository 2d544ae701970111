//! # gh-oauth-helper
//!
//! GitHub OAuth 2.0 authorization-code flow as a small async library, with a
//! matching command-line tool.
//!
//! ## Overview
//!
//! The crate drives the four steps of the flow against GitHub: building the
//! authorization URL (with CSRF state protection), exchanging the callback
//! code for an access token, checking a token against the user endpoint, and
//! revoking a token. All provider calls go through the [`HttpTransport`]
//! trait, so the whole flow can be exercised in tests without touching the
//! network.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use gh_oauth_helper::{GitHubOAuth, OAuthConfig};
//!
//! #[tokio::main]
//! async fn main() -> gh_oauth_helper::Result<()> {
//!     let oauth = GitHubOAuth::new(OAuthConfig {
//!         client_id: "your-client-id".to_string(),
//!         client_secret: "your-client-secret".to_string(),
//!         redirect_uri: Some("http://localhost:8080/callback".to_string()),
//!         secure_mode: false,
//!     })?;
//!
//!     // Send the user here; keep the state for the callback.
//!     let (url, state) = oauth.authorization_url(&["user:email".to_string()], None);
//!     println!("visit: {url}");
//!
//!     // After the redirect: exchange the code, then prove the token works.
//!     let token = oauth
//!         .exchange_code("code-from-callback", Some(&state), Some(&state))
//!         .await?;
//!     let user = oauth.test_api_access(&token.access_token).await?;
//!     println!("authenticated as {}", user.login);
//!     Ok(())
//! }
//! ```

mod error;
mod flow;
mod schema;
mod state;
mod transport;

pub mod testutils;

pub use error::{Error, Result};
pub use flow::{
    parse_callback_url, GitHubOAuth, OAuthConfig, GITHUB_API_URL, GITHUB_AUTH_URL,
    GITHUB_TOKEN_URL, GITHUB_USER_URL,
};
pub use schema::{TokenResponse, UserProfile};
pub use state::generate_state;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
