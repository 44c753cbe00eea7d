use anyhow::{Context, Result};
use google_calendar::Client;
use google_calendar::types::MinAccessRole;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::app_config::AppConfig;
use crate::session::{Session, SessionData};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// Interactive OAuth login. Returns the account email, which goes into
/// `google_account` in the `[destination]` section.
pub async fn handle() -> Result<String> {
    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();

    let app_config = AppConfig::load()?;

    let mut client = Client::new(
        app_config.client_id.clone(),
        app_config.client_secret.clone(),
        redirect_uri(),
        String::new(),
        String::new(),
    );

    let auth_url = client.user_consent_url(&scopes);

    eprintln!("\nOpen this URL in your browser to authenticate:\n");
    eprintln!("{}\n", auth_url);

    if open::that(&auth_url).is_err() {
        eprintln!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, state) = wait_for_callback().await?;

    eprintln!("\nReceived authorization code, exchanging for tokens...");

    let access_token = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange authorization code")?;
    let session_data = SessionData::from(&access_token);

    let client = Client::new(
        app_config.client_id,
        app_config.client_secret,
        redirect_uri(),
        access_token.access_token,
        access_token.refresh_token,
    );

    let calendars = client
        .calendar_list()
        .list_all(MinAccessRole::default(), false, false)
        .await
        .context("Failed to fetch calendars")?
        .body;

    // The primary calendar is named after the account email
    let account_email = calendars
        .into_iter()
        .find(|cal| cal.primary)
        .map(|cal| cal.summary)
        .ok_or_else(|| anyhow::anyhow!("No primary calendar found"))?;

    Session::new(&account_email, session_data).save()?;

    eprintln!("Authentication successful!");

    Ok(account_email)
}

async fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(redirect_address())
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let (code, state) = parse_callback(&request_line)?;

    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>lnsync is connected to Google Calendar</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    Ok((code, state))
}

/// Pull `code` and `state` out of a request line like
/// `GET /callback?code=...&state=... HTTP/1.1`.
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;

    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = query("error") {
        anyhow::bail!("Authorization was denied: {}", error);
    }

    let code = query("code").ok_or_else(|| anyhow::anyhow!("No code in callback"))?;
    let state = query("state").ok_or_else(|| anyhow::anyhow!("No state in callback"))?;

    Ok((code, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback() {
        let (code, state) =
            parse_callback("GET /callback?state=xyz&code=4%2F0Ab HTTP/1.1\r\n").unwrap();
        assert_eq!(code, "4/0Ab");
        assert_eq!(state, "xyz");
    }

    #[test]
    fn test_parse_denied_callback() {
        let err = parse_callback("GET /callback?error=access_denied HTTP/1.1").unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_callback("").is_err());
        assert!(parse_callback("GET /callback HTTP/1.1").is_err());
    }
}
