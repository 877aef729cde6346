use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::Level;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, REFERER, SET_COOKIE,
    USER_AGENT,
};
use reqwest::{Method, StatusCode};
use url::Url;
use uuid::Uuid;

use crate::artifact::{self, RedirectArtifact};
use crate::context::{AuthenticationContext, Credential};
use crate::cookie::SessionCookie;
use crate::errors::{SnowsightError, SnowsightResult};
use crate::redact;
use crate::telemetry::{CallTimer, LogFacade, RequestLogger};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_USER_AGENT: &str =
    concat!("Snowflake Snowsight Extensions ", env!("CARGO_PKG_VERSION"));

/// Sends GET, POST and DELETE calls to Snowsight and the classic UI
///
/// Every call builds its own HTTP client from the [`AuthenticationContext`] it is given,
/// never follows redirects, and gives up after the configured timeout (60 seconds by default).
///
/// There are two flavours of each method:
///
/// * [`get`](Self::get), [`post`](Self::post) and [`delete`](Self::delete) return the response
///   body, or an empty string if anything went wrong. The only error they return is
///   [`SnowsightError::MissingSessionCookie`], for a session token that is not a cookie.
/// * [`try_get`](Self::try_get), [`try_post`](Self::try_post) and [`try_delete`](Self::try_delete)
///   return the failure as a [`SnowsightError`] instead.
///
/// Both flavours log the same way.
///
/// **Certificate validation is disabled**, so that accounts whose chain is not in the local
/// trust store still work. These calls offer no protection against an active attacker on the
/// network path.
#[derive(Clone)]
pub struct RequestExecutor {
    timeout: Duration,
    user_agent: String,
    logger: Arc<dyn RequestLogger>,
}

impl Default for RequestExecutor {
    fn default() -> Self {
        RequestExecutor {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            logger: Arc::new(LogFacade),
        }
    }
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

struct Body<'a> {
    text: &'a str,
    content_type: &'a str,
}

struct Call<'a> {
    method: Method,
    base_url: &'a str,
    path: &'a str,
    url: String,
    accept: &'a str,
    body: Option<Body<'a>>,
    context: &'a AuthenticationContext,
}

impl<'a> Call<'a> {
    fn new(
        method: Method,
        base_url: &'a str,
        path: &'a str,
        accept: &'a str,
        context: &'a AuthenticationContext,
    ) -> Call<'a> {
        Call {
            method,
            base_url,
            path,
            url: format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            accept,
            body: None,
            context,
        }
    }

    fn with_body(mut self, text: &'a str, content_type: &'a str) -> Call<'a> {
        self.body = Some(Body { text, content_type });
        self
    }

    /// 2xx, plus 302 for GET
    fn accepts(&self, status: StatusCode) -> bool {
        status.is_success() || (self.method == Method::GET && status == StatusCode::FOUND)
    }
}

impl RequestExecutor {
    pub fn new() -> RequestExecutor {
        RequestExecutor::default()
    }

    /// Set the client-side timeout for every call
    pub fn with_timeout(mut self, timeout: Duration) -> RequestExecutor {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> RequestExecutor {
        self.user_agent = user_agent.into();
        self
    }

    /// Send operator and console logs somewhere other than the `log` facade
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> RequestExecutor {
        self.logger = logger;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// GET `path` under `base_url`
    ///
    /// 2xx and 302 are successes. For the OAuth completion endpoint, a session cookie in the
    /// response is returned as a [`RedirectArtifact`] JSON string instead of the body.
    pub async fn try_get(
        &self,
        base_url: &str,
        path: &str,
        accept: &str,
        context: &AuthenticationContext,
    ) -> SnowsightResult<String> {
        self.execute(Call::new(Method::GET, base_url, path, accept, context))
            .await
    }

    /// [`try_get`](Self::try_get), with every failure but a malformed session token turned into `""`
    pub async fn get(
        &self,
        base_url: &str,
        path: &str,
        accept: &str,
        context: &AuthenticationContext,
    ) -> SnowsightResult<String> {
        collapse(self.try_get(base_url, path, accept, context).await)
    }

    /// POST `body` to `path` under `base_url`. Only 2xx is a success.
    pub async fn try_post(
        &self,
        base_url: &str,
        path: &str,
        accept: &str,
        body: &str,
        content_type: &str,
        context: &AuthenticationContext,
    ) -> SnowsightResult<String> {
        self.execute(
            Call::new(Method::POST, base_url, path, accept, context).with_body(body, content_type),
        )
        .await
    }

    /// [`try_post`](Self::try_post), with every failure but a malformed session token turned into `""`
    pub async fn post(
        &self,
        base_url: &str,
        path: &str,
        accept: &str,
        body: &str,
        content_type: &str,
        context: &AuthenticationContext,
    ) -> SnowsightResult<String> {
        collapse(
            self.try_post(base_url, path, accept, body, content_type, context)
                .await,
        )
    }

    /// DELETE `path` under `base_url`. Only 2xx is a success.
    pub async fn try_delete(
        &self,
        base_url: &str,
        path: &str,
        accept: &str,
        context: &AuthenticationContext,
    ) -> SnowsightResult<String> {
        self.execute(Call::new(Method::DELETE, base_url, path, accept, context))
            .await
    }

    /// [`try_delete`](Self::try_delete), with every failure but a malformed session token turned into `""`
    pub async fn delete(
        &self,
        base_url: &str,
        path: &str,
        accept: &str,
        context: &AuthenticationContext,
    ) -> SnowsightResult<String> {
        collapse(self.try_delete(base_url, path, accept, context).await)
    }

    async fn execute(&self, call: Call<'_>) -> SnowsightResult<String> {
        let timer = CallTimer::start(&*self.logger, call.method.clone(), &call.url);
        let request_id = timer.request_id();

        let base = match Url::parse(call.base_url) {
            Ok(base) => base,
            Err(err) => return Err(self.absorb(&call, request_id, err.into())),
        };
        // Malformed session tokens propagate
        let cookie = call
            .context
            .session_cookie(base.host_str().unwrap_or_default())?;

        match self.exchange(&call, cookie.as_ref(), request_id).await {
            // Already logged with the response
            Err(err @ SnowsightError::Status { .. }) => Err(err),
            Err(err) => Err(self.absorb(&call, request_id, err)),
            ok => ok,
        }
    }

    async fn exchange(
        &self,
        call: &Call<'_>,
        cookie: Option<&SessionCookie>,
        request_id: Uuid,
    ) -> SnowsightResult<String> {
        let headers = self.headers(call, cookie)?;
        let logged_body = call
            .body
            .as_ref()
            .map(|body| redact::loggable_body(call.path, body.text));

        let client = reqwest::Client::builder()
            .default_headers(headers.clone())
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout)
            .build()?;
        let mut request = client.request(call.method.clone(), &call.url);
        if let Some(body) = &call.body {
            request = request
                .header(CONTENT_TYPE, body.content_type)
                .body(body.text.to_owned());
        }

        let response = request.send().await?;
        let status = response.status();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect();
        let text = response.text().await?;

        let summary = format!(
            "{} {} returned {} ({})",
            call.method,
            call.url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        let mut detail = format!("{summary} [request {request_id}]\nRequest Headers:\n{headers:?}");
        if let Some(body) = &logged_body {
            detail.push_str(&format!("\nRequest:\n{body}"));
        }

        if call.accepts(status) {
            detail.push_str(&format!("\nResponse Length {}:\n{}", text.len(), text));
            self.logger.operator(Level::Info, &detail);

            if call.method == Method::GET && artifact::is_oauth_completion(call.path) {
                let harvested =
                    artifact::harvest_session_cookie(set_cookies.iter().map(String::as_str));
                if let Some(cookie) = harvested {
                    return RedirectArtifact::new(cookie, &text).to_json();
                }
            }
            return Ok(text);
        }

        if !text.is_empty() {
            detail.push_str(&format!("\nResponse Length {}:\n{}", text.len(), text));
        }
        self.logger.operator(Level::Error, &detail);

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            if call.method == Method::GET {
                self.logger.console(Level::Error, &summary);
            } else if let Some(body) = &logged_body {
                self.logger
                    .console(Level::Warn, &format!("{summary}, Request:\n{body}"));
            } else {
                self.logger.console(Level::Warn, &summary);
            }
        }

        Err(SnowsightError::Status {
            method: call.method.clone(),
            url: call.url.clone(),
            status,
            body: text,
        })
    }

    fn headers(
        &self,
        call: &Call<'_>,
        cookie: Option<&SessionCookie>,
    ) -> SnowsightResult<HeaderMap> {
        let context = call.context;
        let mut headers = HeaderMap::with_capacity(7);
        headers.insert(USER_AGENT, self.user_agent.parse()?);
        if let Some(referer) = context.referer() {
            headers.insert(REFERER, referer.parse()?);
        }
        if let Some(snowflake_context) = context.snowflake_context() {
            headers.insert("x-snowflake-context", snowflake_context.parse()?);
        }
        if let Some(cookie) = cookie {
            headers.insert(COOKIE, sensitive(&cookie.header_value())?);
        }
        if let Credential::ClassicToken(token) = context.credential() {
            headers.insert(
                AUTHORIZATION,
                sensitive(&format!("Basic Snowflake Token=\"{token}\""))?,
            );
        }
        if call.method == Method::GET {
            if let Some(role) = context.role() {
                headers.insert("x-snowflake-role", role.parse()?);
            }
        }
        let accept: HeaderValue = call.accept.parse()?;
        if !headers.get_all(ACCEPT).iter().any(|value| *value == accept) {
            headers.append(ACCEPT, accept);
        }
        Ok(headers)
    }

    /// Log a call that never produced a response and hand the error back
    fn absorb(&self, call: &Call<'_>, request_id: Uuid, err: SnowsightError) -> SnowsightError {
        let message = format!(
            "{} {} threw {} ({})",
            call.method,
            call.url,
            err,
            root_cause(&err)
        );
        self.logger
            .operator(Level::Error, &format!("{message} [request {request_id}]"));
        self.logger.operator(Level::Debug, &format!("{err:?}"));
        self.logger.console(Level::Error, &message);
        err
    }
}

fn collapse(result: SnowsightResult<String>) -> SnowsightResult<String> {
    match result {
        Err(err) if !err.is_terminal() => Ok(String::new()),
        other => other,
    }
}

fn sensitive(value: &str) -> SnowsightResult<HeaderValue> {
    let mut value = HeaderValue::from_str(value)?;
    value.set_sensitive(true);
    Ok(value)
}

fn root_cause(err: &SnowsightError) -> String {
    let mut cause = None;
    let mut next = std::error::Error::source(err);
    while let Some(source) = next {
        cause = Some(source.to_string());
        next = source.source();
    }
    cause.unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned())
}
