use time_spent::components::google_calendar::{build_http_client, TokenManager};
use time_spent::config::Config;
use time_spent::error::{other_error, ReportResult};
use url::Url;

const REDIRECT_URI: &str = "http://localhost:8080";
const SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

#[tokio::main]
async fn main() -> miette::Result<()> {
    run().await.map_err(Into::into)
}

async fn run() -> ReportResult<()> {
    // Load configuration
    let config = Config::load()?;
    let http = build_http_client(&config)?;
    let token_manager = TokenManager::new(&config, http);

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();

    // Construct authorization URL
    let mut auth_url = Url::parse("https://accounts.google.com/o/oauth2/v2/auth")
        .map_err(|e| other_error(&format!("Failed to parse URL: {}", e)))?;
    auth_url
        .query_pairs_mut()
        .append_pair("client_id", &config.google_client_id)
        .append_pair("redirect_uri", REDIRECT_URI)
        .append_pair("response_type", "code")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("scope", SCOPE)
        .append_pair("state", &state);

    // Start local server to receive the callback
    let server = tiny_http::Server::http("127.0.0.1:8080")
        .map_err(|e| other_error(&format!("Failed to start callback server: {}", e)))?;

    // Open browser for authorization
    println!("Opening browser for Google Calendar authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Open this URL in your browser:\n{}", auth_url);
    }
    println!("Waiting for authorization callback...");

    // Handle the callback
    let request = server.recv()?;
    let callback = Url::parse(&format!("{}{}", REDIRECT_URI, request.url()))
        .map_err(|e| other_error(&format!("Invalid callback URL: {}", e)))?;

    let param = |name: &str| {
        callback
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if param("state").as_deref() != Some(state.as_str()) {
        request.respond(tiny_http::Response::from_string("Authorization failed: state mismatch."))?;
        return Err(other_error("State mismatch in authorization callback"));
    }

    let Some(code) = param("code") else {
        let reason = param("error").unwrap_or_else(|| "no code".to_string());
        request.respond(tiny_http::Response::from_string(format!("Authorization failed: {}", reason)))?;
        return Err(other_error(&format!("No authorization code found in callback: {}", reason)));
    };

    // Exchange code for tokens
    let token = token_manager.exchange_code(&code, REDIRECT_URI).await?;
    token_manager.save(&token)?;

    // Send success response to browser
    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request.respond(response)?;

    println!("Token successfully saved to {}", token_manager.token_path().display());

    Ok(())
}
