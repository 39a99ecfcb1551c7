use muistuttaja::components::google_calendar::token::{TokenManager, TokenResponse, TOKEN_URL};
use muistuttaja::config::Config;
use muistuttaja::error::{other_error, DaemonResult};
use url::Url;

const REDIRECT_ADDR: &str = "127.0.0.1:8080";
const REDIRECT_URI: &str = "http://127.0.0.1:8080";
const SCOPE: &str = "https://www.googleapis.com/auth/calendar.events.readonly";

#[tokio::main]
async fn main() -> miette::Result<()> {
    run().await?;
    Ok(())
}

async fn run() -> DaemonResult<()> {
    // Load configuration
    let config = Config::load()?;
    let token_manager = TokenManager::new(&config);

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
    let server = tiny_http::Server::http(REDIRECT_ADDR)
        .map_err(|e| other_error(&format!("Failed to listen on {}: {}", REDIRECT_ADDR, e)))?;

    // Open browser for authorization
    println!("Opening browser for Google Calendar authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Go to the following link in your browser:\n\n{}\n", auth_url);
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
        let _ = request
            .respond(tiny_http::Response::from_string("State mismatch").with_status_code(400));
        return Err(other_error("Authorization callback state does not match"));
    }
    let code = match param("code") {
        Some(code) => code,
        None => {
            let response = tiny_http::Response::from_string("Code query parameter missing")
                .with_status_code(400);
            let _ = request.respond(response);
            return Err(other_error("No authorization code found in callback"));
        }
    };

    // Exchange code for tokens
    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", config.google_client_id.as_str()),
            ("client_secret", config.google_client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(other_error(&format!("Failed to get token: {}", error_text)));
    }

    let token: TokenResponse = response.json().await?;
    token_manager.set_token(token.into_stored(None)?).await?;

    // Send success response to browser
    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request.respond(response)?;

    println!("Token saved to {}", config.token_path.display());

    Ok(())
}
