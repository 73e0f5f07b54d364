// Controller API session
//
// Wraps `reqwest::Client` with the controller's session conventions:
// cookie login, CSRF header echo, `X-Avi-Tenant` / `X-Avi-Version` headers,
// transparent re-login on 401/419, and paged collection listing.

use std::sync::{Arc, PoisonError, RwLock};

use futures_util::{Stream, TryStreamExt};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{ListPage, LoginResponse};
use crate::transport::TransportConfig;

/// Budget for session renewals (401/419) and for page attempts on 412.
pub const MAX_RETRIES: u32 = 5;

/// Per-request tenant override and query parameters.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub tenant: Option<String>,
    pub params: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the request in the scope of `tenant` instead of the session default.
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Append a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is `Some`.
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }
}

/// Authenticated session against one controller.
///
/// Every method takes an API-relative path (`virtualservice`,
/// `pool/pool-uuid/runtime/detail`, ...); the `/api/` prefix is added here.
pub struct ApiSession {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    tenant: String,
    api_version: RwLock<Option<String>>,
    remote_version: RwLock<Option<String>>,
    /// Echoed as `X-CSRFToken` on every request. Captured from the
    /// `csrftoken` cookie at login and whenever the controller rotates it.
    csrf_token: RwLock<Option<String>>,
}

impl ApiSession {
    /// Create a session. No request is sent until [`login`](Self::login).
    ///
    /// `base_url` is the controller root, e.g. `https://10.10.10.10`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        tenant: impl Into<String>,
        api_version: Option<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(Arc::new(Jar::default()))?;
        Ok(Self::with_client(http, base_url, credentials, tenant, api_version))
    }

    /// Create a session around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        tenant: impl Into<String>,
        api_version: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            tenant: tenant.into(),
            api_version: RwLock::new(api_version),
            remote_version: RwLock::new(None),
            csrf_token: RwLock::new(None),
        }
    }

    /// Session on the `admin` tenant with the default transport.
    pub fn with_defaults(base_url: Url, credentials: Credentials) -> Result<Self, Error> {
        Self::new(base_url, credentials, "admin", None, &TransportConfig::default())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default tenant sent with every request.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// API version sent as `X-Avi-Version`, if pinned.
    pub fn api_version(&self) -> Option<String> {
        self.api_version.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_api_version(&self, version: impl Into<String>) {
        *self.api_version.write().unwrap_or_else(PoisonError::into_inner) = Some(version.into());
    }

    /// Controller version reported by the last login.
    pub fn remote_version(&self) -> Option<String> {
        self.remote_version.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Log in with the session's credentials.
    ///
    /// `POST /login`; the session cookie lands in the client's jar and the
    /// CSRF token is captured for later requests.
    pub async fn login(&self) -> Result<(), Error> {
        let url = self.base_url.join("/login")?;
        debug!(user = self.username(), "logging in at {}", url);

        let resp = self
            .http
            .post(url)
            .header("Referer", self.base_url.as_str())
            .json(&self.credentials.login_body())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        self.update_csrf_from_response(resp.headers());

        let body = resp.text().await?;
        let login: LoginResponse = serde_json::from_str(&body).unwrap_or_default();
        if let Some(version) = login.version.and_then(|v| v.version) {
            debug!(%version, "controller version");
            *self.remote_version.write().unwrap_or_else(PoisonError::into_inner) = Some(version);
        }

        debug!("login successful");
        Ok(())
    }

    /// End the session. `POST /logout`.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.base_url.join("/logout")?;
        debug!("logging out at {}", url);
        let builder = self.decorate(self.http.post(url), None);
        let _resp = builder.send().await?;
        Ok(())
    }

    // ── CSRF token management ────────────────────────────────────────

    fn update_csrf_from_response(&self, headers: &HeaderMap) {
        let token = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(csrf_from_set_cookie);

        if let Some(token) = token {
            trace!("CSRF token captured");
            *self.csrf_token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        }
    }

    /// Apply session headers: tenant, version, CSRF and referer.
    fn decorate(
        &self,
        builder: reqwest::RequestBuilder,
        tenant: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder
            .header("X-Avi-Tenant", tenant.unwrap_or(&self.tenant))
            .header("Referer", self.base_url.as_str());

        if let Some(version) = self.api_version() {
            builder = builder.header("X-Avi-Version", version);
        }

        let guard = self.csrf_token.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(token) => builder.header("X-CSRFToken", token),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/{path}`
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    /// Re-anchor a `next` link on our base URL.
    ///
    /// The controller builds `next` from its own view of the host, which is
    /// wrong behind proxies and NAT; only the part after `/api/` is kept.
    fn resolve_next(&self, next: &str) -> Result<Url, Error> {
        match next.split_once("/api/") {
            Some((_, tail)) => self.api_url(tail),
            None => Ok(Url::parse(next)?),
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request, renewing the session on 401/419 up to
    /// [`MAX_RETRIES`] times.
    async fn send<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        url: Url,
        opts: &RequestOptions,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let mut renewals = 0;
        loop {
            debug!("{} {}", method, url);

            let mut builder = self
                .decorate(self.http.request(method.clone(), url.clone()), opts.tenant.as_deref());
            if !opts.params.is_empty() {
                builder = builder.query(&opts.params);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let resp = builder.send().await?;
            self.update_csrf_from_response(resp.headers());

            if !is_session_expired(resp.status()) {
                return Ok(resp);
            }
            if renewals >= MAX_RETRIES {
                return Err(Error::RetriesExhausted {
                    attempts: renewals + 1,
                });
            }
            renewals += 1;
            warn!(status = %resp.status(), renewals, "session expired, logging in again");
            self.login().await?;
        }
    }

    /// Map non-success statuses to typed errors.
    async fn check(resp: reqwest::Response, path: &str) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::NOT_FOUND => Err(Error::NotFound { path: path.into() }),
            StatusCode::PRECONDITION_FAILED => Err(Error::Conflict { path: path.into() }),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(Error::Api {
                    status: status.as_u16(),
                    message: preview(&body).to_owned(),
                })
            }
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        // DELETE and some PUTs answer with an empty body.
        let text = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(text).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }

    async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        opts: &RequestOptions,
        body: Option<&B>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.api_url(path)?;
        let resp = self.send(method, url, opts, body).await?;
        let resp = Self::check(resp, path).await?;
        Self::decode(resp).await
    }

    /// `GET /api/{path}` decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: &RequestOptions,
    ) -> Result<T, Error> {
        self.call::<T, Value>(Method::GET, path, opts, None).await
    }

    /// `GET /api/{path}` as raw text (CSV downloads).
    pub async fn get_text(&self, path: &str, opts: &RequestOptions) -> Result<String, Error> {
        let url = self.api_url(path)?;
        let resp = self.send::<Value>(Method::GET, url, opts, None).await?;
        let resp = Self::check(resp, path).await?;
        Ok(resp.text().await?)
    }

    /// `POST /api/{path}` with a JSON body.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
        opts: &RequestOptions,
    ) -> Result<T, Error> {
        self.call(Method::POST, path, opts, Some(body)).await
    }

    /// `PUT /api/{path}` with a JSON body (full object replacement).
    pub async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
        opts: &RequestOptions,
    ) -> Result<T, Error> {
        self.call(Method::PUT, path, opts, Some(body)).await
    }

    /// `PATCH /api/{path}` with a JSON body (usually a [`JsonPatch`](crate::JsonPatch)).
    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
        opts: &RequestOptions,
    ) -> Result<T, Error> {
        self.call(Method::PATCH, path, opts, Some(body)).await
    }

    /// `DELETE /api/{path}`.
    pub async fn delete(&self, path: &str, opts: &RequestOptions) -> Result<(), Error> {
        let url = self.api_url(path)?;
        let resp = self.send::<Value>(Method::DELETE, url, opts, None).await?;
        Self::check(resp, path).await?;
        Ok(())
    }

    // ── Collections ──────────────────────────────────────────────────

    /// Fetch one page, making up to [`MAX_RETRIES`] attempts while it answers 412.
    async fn fetch_page(
        &self,
        url: Url,
        opts: &RequestOptions,
        path: &str,
    ) -> Result<ListPage<Value>, Error> {
        let mut attempt = 1;
        loop {
            let resp = self.send::<Value>(Method::GET, url.clone(), opts, None).await?;
            match Self::check(resp, path).await {
                Ok(resp) => return Self::decode(resp).await,
                Err(Error::Conflict { .. }) if attempt < MAX_RETRIES => {
                    warn!(path, attempt, "page fetch conflicted, retrying");
                    attempt += 1;
                }
                Err(Error::Conflict { .. }) => {
                    return Err(Error::RetriesExhausted { attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Stream every object of a collection, following `next` links.
    pub fn objects<'a>(
        &'a self,
        path: &'a str,
        opts: RequestOptions,
    ) -> impl Stream<Item = Result<Value, Error>> + 'a {
        async_stream::try_stream! {
            let mut url = self.api_url(path)?;
            let mut opts = opts;
            loop {
                let page = self.fetch_page(url, &opts, path).await?;
                trace!(path, count = ?page.count, fetched = page.results.len(), "page");
                for object in page.results {
                    yield object;
                }
                match page.next {
                    Some(next) => {
                        url = self.resolve_next(&next)?;
                        // `next` already carries the original query string.
                        opts.params.clear();
                    }
                    None => break,
                }
            }
        }
    }

    /// Collect every object of a collection.
    pub async fn get_all(&self, path: &str, opts: RequestOptions) -> Result<Vec<Value>, Error> {
        self.objects(path, opts).try_collect().await
    }

    /// First object of `object_type` whose name matches exactly.
    pub async fn get_object_by_name(
        &self,
        object_type: &str,
        name: &str,
        opts: RequestOptions,
    ) -> Result<Option<Value>, Error> {
        let opts = opts.param("name", name);
        let page: ListPage<Value> = self.get_json(object_type, &opts).await?;
        Ok(page.results.into_iter().next())
    }
}

fn is_session_expired(status: StatusCode) -> bool {
    matches!(status.as_u16(), 401 | 419)
}

/// `csrftoken=abc; Path=/; ...` -> `abc`
fn csrf_from_set_cookie(header: &str) -> Option<String> {
    let first = header.split(';').next()?.trim();
    let (name, value) = first.split_once('=')?;
    (name == "csrftoken" && !value.is_empty()).then(|| value.to_owned())
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_cookie_parsing() {
        assert_eq!(
            csrf_from_set_cookie("csrftoken=tok123; expires=Thu; Path=/"),
            Some("tok123".into())
        );
        assert_eq!(csrf_from_set_cookie("sessionid=zzz; Path=/"), None);
        assert_eq!(csrf_from_set_cookie("csrftoken=; Path=/"), None);
    }

    #[test]
    fn session_expiry_statuses() {
        assert!(is_session_expired(StatusCode::UNAUTHORIZED));
        assert!(is_session_expired(StatusCode::from_u16(419).unwrap_or(StatusCode::OK)));
        assert!(!is_session_expired(StatusCode::FORBIDDEN));
    }

    #[test]
    fn request_options_builder() {
        let opts = RequestOptions::new()
            .tenant("*")
            .param("include_name", true)
            .param_opt("name", None::<&str>);
        assert_eq!(opts.tenant.as_deref(), Some("*"));
        assert_eq!(opts.params, vec![("include_name".into(), "true".into())]);
    }
}
