//! HTTP transport with the retry-once-after-refresh interceptor.
//!
//! Every API call goes through [`Transport::execute`], which drives a
//! [`RefreshFlow`] per request. A request is rebuilt from its [`ApiRequest`]
//! description on retry so it picks up the refreshed bearer token.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tally_engine::{AppState, RefreshFlow, Step};

use crate::error::{ClientError, Result};

/// App state shared between the client and the UI.
pub type SharedState = Arc<RwLock<AppState>>;

pub const REFRESH_PATH: &str = "/auth/refresh";

pub(crate) fn read_state(state: &SharedState) -> RwLockReadGuard<'_, AppState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_state(state: &SharedState) -> RwLockWriteGuard<'_, AppState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Request description
// ============================================================================

/// A replayable description of one API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// A 401 is delivered as-is instead of starting a token refresh.
    pub no_refresh: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            no_refresh: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// For calls whose 401 means bad credentials rather than an expired
    /// token, such as login.
    pub fn no_refresh(mut self) -> Self {
        self.no_refresh = true;
        self
    }

    fn is_refresh_exempt(&self) -> bool {
        self.no_refresh || self.path == REFRESH_PATH
    }
}

// ============================================================================
// Token wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ============================================================================
// Transport
// ============================================================================

pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    state: SharedState,
}

impl Transport {
    pub fn new(http: reqwest::Client, base_url: String, state: SharedState) -> Self {
        Self {
            http,
            base_url,
            state,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build(&self, req: &ApiRequest) -> RequestBuilder {
        let mut builder = self.http.request(req.method.clone(), self.url(&req.path));
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        let token = read_state(&self.state).access_token().map(str::to_string);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send `req`, refreshing the session and retrying once on a 401.
    ///
    /// The returned response may still be unsuccessful; only session expiry
    /// is turned into an error here.
    pub async fn execute(&self, req: &ApiRequest) -> Result<Response> {
        let mut flow = if req.is_refresh_exempt() {
            RefreshFlow::for_refresh_call()
        } else {
            RefreshFlow::new()
        };

        tracing::debug!(method = %req.method, path = %req.path, "sending request");
        let mut resp = self.build(req).send().await?;
        let mut step = flow.on_response(resp.status().as_u16());

        loop {
            match step {
                Step::Deliver => return Ok(resp),
                Step::Refresh => {
                    tracing::info!(path = %req.path, "access token rejected, refreshing session");
                    let refreshed = self.refresh().await;
                    step = flow.on_refresh(refreshed);
                }
                Step::Resend => {
                    tracing::debug!(path = %req.path, "retrying with refreshed token");
                    resp = self.build(req).send().await?;
                    step = flow.on_resent(resp.status().as_u16());
                }
                Step::RedirectToLogin => {
                    tracing::warn!(path = %req.path, "session refresh failed, login required");
                    write_state(&self.state).clear();
                    return Err(ClientError::SessionExpired);
                }
            }
        }
    }

    /// Exchange the cached refresh token for a new access token.
    ///
    /// Sent directly, never through [`execute`](Self::execute), so a failing
    /// refresh cannot trigger another refresh.
    async fn refresh(&self) -> bool {
        let refresh_token = read_state(&self.state).refresh_token().map(str::to_string);
        let Some(refresh_token) = refresh_token else {
            tracing::debug!("no refresh token cached");
            return false;
        };

        let sent = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&RefreshBody {
                refresh_token: &refresh_token,
            })
            .send()
            .await;
        let resp = match sent {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = resp.status().as_u16(), "refresh rejected");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh request failed");
                return false;
            }
        };

        match resp.json::<TokenResponse>().await {
            Ok(tokens) => {
                write_state(&self.state).update_tokens(tokens.access_token, tokens.refresh_token);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh response unreadable");
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Response helpers
    // ------------------------------------------------------------------------

    pub async fn send_json<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T> {
        let resp = ensure_success(self.execute(req).await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn send_ok(&self, req: &ApiRequest) -> Result<()> {
        ensure_success(self.execute(req).await?).await?;
        Ok(())
    }

    pub async fn send_text(&self, req: &ApiRequest) -> Result<String> {
        let resp = ensure_success(self.execute(req).await?).await?;
        Ok(resp.text().await?)
    }
}

/// Turn a non-success response into [`ClientError::Api`] carrying the
/// backend's message (or the raw body when it is not the usual JSON shape).
async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
