use std::io::{self, BufRead, Write};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use gh_oauth_helper::{parse_callback_url, GitHubOAuth, OAuthConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let client_id = std::env::var("GITHUB_CLIENT_ID").unwrap_or_default();
    let client_secret = std::env::var("GITHUB_CLIENT_SECRET").unwrap_or_default();
    if client_id.is_empty() || client_secret.is_empty() {
        eprintln!("Error: GitHub Client ID and Client Secret are required");
        eprintln!("Provide them via environment variables:");
        eprintln!("  export GITHUB_CLIENT_ID=your_client_id");
        eprintln!("  export GITHUB_CLIENT_SECRET=your_client_secret");
        std::process::exit(1);
    }
    let redirect_uri = std::env::var("GITHUB_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:8080/callback".to_string());

    let oauth = GitHubOAuth::new(OAuthConfig {
        client_id,
        client_secret,
        redirect_uri: Some(redirect_uri),
        secure_mode: false,
    })?;

    let (url, state) = oauth.authorization_url(&["user:email".to_string()], None);
    println!("1. Visit this URL to authorize the application:");
    println!("   {url}");
    println!("2. After authorizing you will be redirected to the callback URL.");
    println!("   State for this run (kept for CSRF verification): {state}");
    println!();

    print!("Paste the full callback URL (or just the code): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let input = line.trim();

    let (code, returned_state) = if input.starts_with("http") {
        parse_callback_url(input)?
    } else {
        (input.to_string(), None)
    };

    let token = oauth
        .exchange_code(&code, returned_state.as_deref(), Some(&state))
        .await?;
    println!("Access token obtained");

    let user = oauth.test_api_access(&token.access_token).await?;
    println!("Authenticated as {} (id {})", user.login, user.id);

    println!();
    print!("Revoke this token again? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if answer.trim().eq_ignore_ascii_case("y") {
        if oauth.revoke_token(&token.access_token).await? {
            println!("Token revoked");
        } else {
            println!("Token was already invalid");
        }
    }

    Ok(())
}
