use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use gh_oauth_helper::{parse_callback_url, GitHubOAuth, OAuthConfig};

#[derive(Parser, Debug)]
#[command(
    name = "gh-oauth-helper",
    version,
    about = "Manage GitHub OAuth authentication flows",
    long_about = None
)]
struct Cli {
    /// GitHub OAuth app client ID
    #[arg(long, env = "GITHUB_CLIENT_ID", global = true, hide_env_values = true)]
    client_id: Option<String>,

    /// GitHub OAuth app client secret
    #[arg(long, env = "GITHUB_CLIENT_SECRET", global = true, hide_env_values = true)]
    client_secret: Option<String>,

    /// OAuth redirect URI
    #[arg(
        long,
        env = "GITHUB_REDIRECT_URI",
        global = true,
        default_value = "http://localhost:8080/callback"
    )]
    redirect_uri: String,

    /// Require an HTTPS redirect URI
    #[arg(long, global = true)]
    secure: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a GitHub OAuth authorization URL
    Auth {
        /// OAuth scopes to request
        #[arg(long, num_args = 0.., default_values_t = vec!["user:email".to_string(), "repo".to_string()])]
        scopes: Vec<String>,

        /// Custom state parameter (randomly generated if not provided)
        #[arg(long)]
        state: Option<String>,

        /// Automatically open the authorization URL in a browser
        #[arg(long)]
        open: bool,
    },
    /// Exchange an authorization code for an access token
    Token {
        /// Authorization code from the GitHub callback
        #[arg(long, required_unless_present = "url", conflicts_with = "url")]
        code: Option<String>,

        /// Paste the full callback URL instead of extracting the code by hand
        #[arg(long)]
        url: Option<String>,

        /// State parameter returned by the callback
        #[arg(long)]
        state: Option<String>,

        /// State generated at the auth step, checked against the returned one
        #[arg(long)]
        expected_state: Option<String>,
    },
    /// Test access token validity
    Test {
        /// Access token to test
        #[arg(long)]
        token: String,
    },
    /// Revoke an access token
    Revoke {
        /// Access token to revoke
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let verbose = cli.verbose;

    if verbose {
        if cli.secure {
            println!("Running in secure mode (HTTPS required)");
        } else {
            println!("Running in standard mode (HTTP allowed for localhost)");
        }
    }

    let oauth = GitHubOAuth::new(OAuthConfig {
        client_id: cli.client_id.unwrap_or_default(),
        client_secret: cli.client_secret.unwrap_or_default(),
        redirect_uri: Some(cli.redirect_uri),
        secure_mode: cli.secure,
    })?;

    match cli.command {
        Command::Auth {
            scopes,
            state,
            open,
        } => cmd_auth(&oauth, scopes, state, open, json, verbose),
        Command::Token {
            code,
            url,
            state,
            expected_state,
        } => cmd_token(&oauth, code, url, state, expected_state, json).await,
        Command::Test { token } => cmd_test(&oauth, &token, json).await,
        Command::Revoke { token } => cmd_revoke(&oauth, &token, json).await,
    }
}

fn cmd_auth(
    oauth: &GitHubOAuth,
    scopes: Vec<String>,
    state: Option<String>,
    open: bool,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (url, state) = oauth.authorization_url(&scopes, state);

    if json {
        let result = serde_json::json!({
            "authorization_url": url,
            "state": state,
            "scopes": scopes,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Generated GitHub OAuth authorization URL");
    if verbose {
        println!("Scopes requested: {}", scopes.join(", "));
        if let Some(redirect_uri) = oauth.redirect_uri() {
            println!("Redirect URI: {redirect_uri}");
        }
    }
    println!();
    println!("Authorization URL:");
    println!("{url}");
    println!();
    println!("State (save this for verification): {state}");

    if open {
        println!("Opening authorization URL in browser...");
        if let Err(e) = webbrowser::open(&url) {
            eprintln!("Could not open browser: {e}");
            eprintln!("Please copy and paste the URL manually");
        }
    }
    Ok(())
}

async fn cmd_token(
    oauth: &GitHubOAuth,
    code: Option<String>,
    url: Option<String>,
    state: Option<String>,
    expected_state: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // --url takes precedence: the pasted callback carries both code and state.
    let (code, state) = match url {
        Some(url) => {
            let (code, callback_state) = parse_callback_url(&url)?;
            (code, callback_state.or(state))
        }
        None => (code.unwrap_or_default(), state),
    };

    let token = oauth
        .exchange_code(&code, state.as_deref(), expected_state.as_deref())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&token)?);
        return Ok(());
    }

    println!("Successfully exchanged authorization code for access token");
    println!();
    println!("Access token: {}", token.access_token);
    if !token.token_type.is_empty() {
        println!("Token type: {}", token.token_type);
    }
    if !token.scope.is_empty() {
        println!("Scope: {}", token.scope);
    }
    if let Some(refresh_token) = &token.refresh_token {
        println!("Refresh token: {refresh_token}");
    }
    if let Some(expires_in) = token.expires_in {
        println!("Expires in: {expires_in} seconds");
    }
    Ok(())
}

async fn cmd_test(
    oauth: &GitHubOAuth,
    token: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = oauth.test_api_access(token).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!("Token is valid! User information:");
    println!();
    println!("Username: {}", user.login);
    println!("Name: {}", user.name.as_deref().unwrap_or("N/A"));
    println!("Email: {}", user.email.as_deref().unwrap_or("N/A"));
    println!("User ID: {}", user.id);
    println!("Account type: {}", user.account_type);
    if let Some(company) = &user.company {
        println!("Company: {company}");
    }
    Ok(())
}

async fn cmd_revoke(
    oauth: &GitHubOAuth,
    token: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let revoked = oauth.revoke_token(token).await?;

    if json {
        let result = serde_json::json!({ "revoked": revoked });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if revoked {
        println!("Token successfully revoked");
    } else {
        println!("Failed to revoke token (it may already be invalid)");
    }
    Ok(())
}
