//! OAuth 2.0 management for YouTube API authentication.
//!
//! This module covers both halves of the credential lifecycle: the
//! interactive authorization flow (consent URL, local redirect listener,
//! code exchange) and silent refresh of a previously issued token.

use crate::config::OAuthConfig;
use crate::error::{Error, Result};
use crate::token_store::StoredToken;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use hyper_util::rt::TokioIo;
use oauth2::basic::{BasicClient, BasicErrorResponseType};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenUrl, reqwest,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::ops::AsyncFnMut;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

const SCOPE_READONLY: &str = "https://www.googleapis.com/auth/youtube.readonly";
const SCOPE_FORCE_SSL: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

/// Fixed loopback redirect target advertised in the consent URL.
const DEFAULT_REDIRECT_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
    8080,
);

/// How long in-flight redirect connections get to finish once the
/// authorization code has been handed off.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const SUCCESS_BODY: &str = "Authorization successful! You can close this tab.";
const FAILURE_BODY: &str = "Authorization failed: no code received";
const ALREADY_HANDLED_BODY: &str = "Authorization already completed. You can close this tab.";

/// Manages OAuth 2.0 authorization and refresh flows for YouTube API access.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    config: OAuthConfig,
    redirect_addr: SocketAddr,
}

impl OAuthManager {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            redirect_addr: DEFAULT_REDIRECT_ADDR,
        }
    }

    /// Overrides the redirect listener address (tests bind an ephemeral port).
    pub fn with_redirect_addr(mut self, addr: SocketAddr) -> Self {
        self.redirect_addr = addr;
        self
    }

    /// Runs the full interactive authorization flow.
    ///
    /// Binds the local redirect listener, hands the consent URL to
    /// `consent_prompt` (the caller decides how to surface it to the user),
    /// blocks until the browser redirect delivers an authorization code, and
    /// exchanges the code for a token at the configured token endpoint.
    ///
    /// There is no timeout on the wait for the redirect: if the user never
    /// completes the consent step, this call suspends indefinitely.
    pub async fn authenticate<F>(&self, consent_prompt: &mut F) -> Result<StoredToken>
    where
        F: AsyncFnMut(&str),
    {
        let csrf = CsrfToken::new_random();
        let server = CallbackServer::bind(self.redirect_addr, csrf.clone()).await?;
        tracing::debug!(addr = %server.local_addr(), "redirect listener bound");

        let auth_url = AuthUrl::new(self.config.auth_uri.clone())
            .map_err(|e| Error::format("invalid authorization endpoint URL", e))?;
        let token_url = TokenUrl::new(self.config.token_uri.clone())
            .map_err(|e| Error::format("invalid token endpoint URL", e))?;
        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(server.redirect_url().clone());

        let (consent_url, _csrf) = client
            // The CSRF is never re-used since the flow runs exactly once.
            .authorize_url(move || csrf)
            .add_scope(Scope::new(SCOPE_READONLY.to_string()))
            .add_scope(Scope::new(SCOPE_FORCE_SSL.to_string()))
            .add_extra_param("access_type", "offline")
            .url();

        tracing::info!(url = %consent_url, "waiting for user to complete the consent flow");
        consent_prompt(consent_url.as_str()).await;

        let code = server.recv_code().await?;

        let token = client
            .exchange_code(code)
            .request_async(&token_http_client())
            .await
            .map_err(|e| Error::Auth(format!("unable to retrieve token from web: {e}")))?;

        Ok(StoredToken::from_token_response(&token, None))
    }

    /// Attempts a silent refresh of `token` using its refresh token.
    ///
    /// Returns `Ok(None)` when no refresh is possible (no refresh token, or
    /// the grant was rejected as invalid) so the caller can fall back to the
    /// full authorization flow; transport failures are reported as errors.
    pub async fn refresh(&self, token: &StoredToken) -> Result<Option<StoredToken>> {
        if token.refresh_token.is_empty() {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        }

        tracing::debug!("attempting to refresh OAuth token");
        let token_url = TokenUrl::new(self.config.token_uri.clone())
            .map_err(|e| Error::format("invalid token endpoint URL", e))?;
        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
            .set_token_uri(token_url);

        match client
            .exchange_refresh_token(&RefreshToken::new(token.refresh_token.clone()))
            .request_async(&token_http_client())
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(StoredToken::from_token_response(
                    &new_token,
                    Some(&token.refresh_token),
                )))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(sr.error(), BasicErrorResponseType::InvalidGrant) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(Error::Auth(format!("exchange refresh token: {e}"))),
        }
    }
}

/// Token endpoints should never redirect.
fn token_http_client() -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("building reqwest client should not fail")
}

type CodeSlot = Arc<Mutex<Option<oneshot::Sender<Result<AuthorizationCode>>>>>;

/// One-shot local HTTP listener for the OAuth redirect.
///
/// The first inbound request decides the outcome: a matching `state` and a
/// non-empty `code` resolve the handoff with the code, anything else resolves
/// it with a failure. Later requests are answered but never touch the
/// handoff again.
pub(crate) struct CallbackServer {
    redirect_url: RedirectUrl,
    local_addr: SocketAddr,
    code_rx: oneshot::Receiver<Result<AuthorizationCode>>,
    shutdown_tx: oneshot::Sender<()>,
    server: tokio::task::JoinHandle<()>,
}

impl CallbackServer {
    /// Binds `addr` and starts serving the redirect endpoint.
    pub(crate) async fn bind(addr: SocketAddr, state: CsrfToken) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::io(format!("unable to bind redirect listener on {addr}"), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::io("unable to read redirect listener address", e))?;
        let redirect_url = RedirectUrl::new(format!("http://localhost:{}", local_addr.port()))
            .expect("loopback redirect URL is well-formed");

        let (code_tx, code_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server = tokio::spawn(serve(listener, state, code_tx, shutdown_rx));

        Ok(Self {
            redirect_url,
            local_addr,
            code_rx,
            shutdown_tx,
            server,
        })
    }

    pub(crate) fn redirect_url(&self) -> &RedirectUrl {
        &self.redirect_url
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Blocks until the redirect delivers an outcome, then shuts the listener
    /// down, allowing in-flight connections a bounded grace period.
    ///
    /// There is no timeout on the wait itself; the handoff is written exactly
    /// once by the listener task and read exactly once here.
    pub(crate) async fn recv_code(self) -> Result<AuthorizationCode> {
        let Self {
            code_rx,
            shutdown_tx,
            mut server,
            ..
        } = self;

        let outcome = code_rx.await.map_err(|_| {
            Error::Auth("redirect listener exited before a code arrived".to_string())
        })?;

        let _ = shutdown_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
            tracing::warn!("redirect listener exceeded shutdown grace period, aborting");
            server.abort();
        }

        outcome
    }
}

async fn serve(
    listener: TcpListener,
    state: CsrfToken,
    code_tx: oneshot::Sender<Result<AuthorizationCode>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let slot: CodeSlot = Arc::new(Mutex::new(Some(code_tx)));
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (conn, _) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "redirect listener accept failed");
                        break;
                    }
                };
                let slot = Arc::clone(&slot);
                let state = state.clone();
                connections.spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let slot = Arc::clone(&slot);
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(handle_redirect(&req, &state, &slot)) }
                    });
                    if let Err(e) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(conn), service)
                        .await
                    {
                        tracing::debug!(error = %e, "redirect connection error");
                    }
                });
            }
            _ = &mut shutdown_rx => break,
        }
    }
    // Finish answering whatever is still in flight; recv_code bounds this
    // with the grace period and aborts stragglers.
    while connections.join_next().await.is_some() {}
}

fn handle_redirect(
    req: &Request<body::Incoming>,
    expected_state: &CsrfToken,
    slot: &CodeSlot,
) -> Response<Full<Bytes>> {
    let mut presented_state = None;
    let mut presented_code = None;
    for (k, v) in form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            _ => {}
        }
    }

    let mut guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let Some(sender) = guard.take() else {
        // One-shot: the first request already decided the outcome.
        return Response::new(Full::from(ALREADY_HANDLED_BODY));
    };
    drop(guard);

    if presented_state.as_deref() != Some(expected_state.secret().as_str()) {
        let _ = sender.send(Err(Error::Auth(
            "redirect carried an unexpected state value".to_string(),
        )));
        return Response::new(Full::from(FAILURE_BODY));
    }

    match presented_code {
        Some(code) if !code.is_empty() => {
            let _ = sender.send(Ok(AuthorizationCode::new(code.into_owned())));
            Response::new(Full::from(SUCCESS_BODY))
        }
        _ => {
            let _ = sender.send(Err(Error::Auth("no code received".to_string())));
            Response::new(Full::from(FAILURE_BODY))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn bind_test_server() -> (CallbackServer, SocketAddr) {
        let state = CsrfToken::new("state-token".to_string());
        let server = CallbackServer::bind("127.0.0.1:0".parse().unwrap(), state)
            .await
            .unwrap();
        let addr = server.local_addr();
        (server, addr)
    }

    #[tokio::test]
    async fn delivers_first_code_exactly_once() {
        let (server, addr) = bind_test_server().await;

        let first = ::reqwest::get(format!("http://{addr}/?state=state-token&code=ABC"))
            .await
            .unwrap();
        assert_eq!(first.text().await.unwrap(), SUCCESS_BODY);

        // A second redirect must be answered but ignored.
        let second = ::reqwest::get(format!("http://{addr}/?state=state-token&code=XYZ"))
            .await
            .unwrap();
        assert_eq!(second.text().await.unwrap(), ALREADY_HANDLED_BODY);

        let code = server.recv_code().await.unwrap();
        assert_eq!(code.secret(), "ABC");
    }

    #[tokio::test]
    async fn missing_code_fails_the_handoff() {
        let (server, addr) = bind_test_server().await;

        let response = ::reqwest::get(format!("http://{addr}/?state=state-token"))
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), FAILURE_BODY);

        let err = server.recv_code().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn mismatched_state_fails_the_handoff() {
        let (server, addr) = bind_test_server().await;

        let response = ::reqwest::get(format!("http://{addr}/?state=wrong&code=ABC"))
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), FAILURE_BODY);

        let err = server.recv_code().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
