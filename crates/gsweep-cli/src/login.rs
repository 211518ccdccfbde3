//! Browser sign-in over a loopback redirect

use std::sync::Arc;

use anyhow::{bail, Context};
use gsweep::auth::{
    AuthorizationCode, GoogleProvider, MemorySessionStore, OAuthProvider, OAuthTokens, StateGuard,
};
use gsweep::{Config, Translator};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

fn provider(config: &Config) -> GoogleProvider {
    let provider = GoogleProvider::new(config.client_id.clone());
    match &config.client_secret {
        Some(secret) => provider.with_secret(secret.clone()),
        None => provider,
    }
}

/// `host:port` to listen on for the redirect
fn listen_addr(redirect_uri: &str) -> anyhow::Result<&str> {
    let Some(rest) = redirect_uri.strip_prefix("http://") else {
        bail!("sign-in needs a loopback http redirect URI, got {}", redirect_uri);
    };
    let authority = rest.split(['/', '?']).next().unwrap_or(rest);
    if !authority.contains(':') {
        bail!("redirect URI must include a port: {}", redirect_uri);
    }
    Ok(authority)
}

/// Print the authorization URL. The state behind it lives only for this
/// call, so the URL is for inspection and cannot complete a sign-in.
pub fn print_url(config: &Config) {
    let provider = provider(config);
    let guard = StateGuard::new(Arc::new(MemorySessionStore::new()));
    let request = guard.begin_authorization(&provider, &provider.default_scopes(), &config.redirect_uri);
    println!("{}", request.url);
}

pub async fn login(config: &Config, translator: Translator) -> anyhow::Result<OAuthTokens> {
    let provider = provider(config);
    let guard = StateGuard::new(Arc::new(MemorySessionStore::new()));

    let addr = listen_addr(&config.redirect_uri)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind local server on {}", addr))?;
    info!("OAuth callback server listening on {}", addr);

    let request = guard.begin_authorization(&provider, &provider.default_scopes(), &config.redirect_uri);
    eprintln!("Open this URL in your browser to sign in:\n\n  {}\n", request.url);

    let auth = timeout(CALLBACK_TIMEOUT, wait_for_callback(&listener, &guard, translator))
        .await
        .context("sign-in timed out after 120 seconds")??;

    let verifier = auth
        .code_verifier
        .context("authorization finished without a PKCE verifier")?;
    provider
        .exchange_code(&auth.code, &verifier, &config.redirect_uri)
        .await
        .map_err(|e| anyhow::anyhow!(translator.to_user_message(&e, "Sign in")))
}

async fn wait_for_callback(
    listener: &TcpListener,
    guard: &StateGuard,
    translator: Translator,
) -> anyhow::Result<AuthorizationCode> {
    loop {
        let (mut socket, _) = listener.accept().await?;

        let mut request_line = String::new();
        BufReader::new(&mut socket).read_line(&mut request_line).await?;

        // "GET /path?query HTTP/1.1"
        let Some(target) = request_line.split_whitespace().nth(1) else {
            continue;
        };
        let Some((_, query)) = target.split_once('?') else {
            // favicon and friends
            send_response(&mut socket, "404 Not Found", "Not found").await?;
            continue;
        };

        return match guard.complete_authorization(query) {
            Ok(auth) => {
                send_response(&mut socket, "200 OK", "Signed in. You can close this tab.").await?;
                Ok(auth)
            }
            Err(e) => {
                warn!(kind = %e.kind, "Sign-in redirect rejected");
                send_response(&mut socket, "400 Bad Request", "Sign-in failed. Please try again.")
                    .await?;
                Err(anyhow::anyhow!(translator.to_user_message(&e, "Sign in")))
            }
        };
    }
}

async fn send_response(socket: &mut TcpStream, status: &str, message: &str) -> std::io::Result<()> {
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>gsweep</title></head>\
         <body><p>{}</p></body></html>",
        message
    );
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        html.len(),
        html
    );
    socket.write_all(response.as_bytes()).await?;
    socket.flush().await
}
