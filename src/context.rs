use crate::cookie::SessionCookie;
use crate::errors::SnowsightResult;

/// The referer Snowsight expects on calls made from its web console
pub const SNOWSIGHT_REFERER: &str = "https://app.snowflake.com/";

/// Which credential, if any, a call carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    Anonymous,
    /// The raw cookie string returned by the OAuth completion endpoint
    SessionToken(String),
    /// A classic UI token, sent as `Authorization: Basic Snowflake Token="..."`
    ClassicToken(String),
}

/// Credentials and context headers for a single call
///
/// Built fresh for every request and never cached.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationContext {
    credential: Credential,
    snowflake_context: Option<String>,
    referer: Option<String>,
    role: Option<String>,
}

impl AuthenticationContext {
    pub fn anonymous() -> AuthenticationContext {
        AuthenticationContext::default()
    }

    /// Authenticate with a Snowsight session cookie string. An empty token means anonymous.
    pub fn with_session_token(mut self, token: impl Into<String>) -> AuthenticationContext {
        self.credential = non_empty(token.into())
            .map(Credential::SessionToken)
            .unwrap_or_default();
        self
    }

    /// Authenticate with a classic UI token. An empty token means anonymous.
    pub fn with_classic_token(mut self, token: impl Into<String>) -> AuthenticationContext {
        self.credential = non_empty(token.into())
            .map(Credential::ClassicToken)
            .unwrap_or_default();
        self
    }

    /// Set `x-snowflake-context` to `{user_name}::{account_url}`
    pub fn with_user_context(self, user_name: &str, account_url: &str) -> AuthenticationContext {
        self.with_snowflake_context(format!("{user_name}::{account_url}"))
    }

    pub fn with_snowflake_context(mut self, context: impl Into<String>) -> AuthenticationContext {
        self.snowflake_context = non_empty(context.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> AuthenticationContext {
        self.referer = non_empty(referer.into());
        self
    }

    /// Override the active role. Only GET requests send it.
    pub fn with_role(mut self, role: impl Into<String>) -> AuthenticationContext {
        self.role = non_empty(role.into());
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn snowflake_context(&self) -> Option<&str> {
        self.snowflake_context.as_deref()
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Parse the session token, if any, into a cookie for `host`
    pub(crate) fn session_cookie(&self, host: &str) -> SnowsightResult<Option<SessionCookie>> {
        match &self.credential {
            Credential::SessionToken(token) => SessionCookie::parse(token, host).map(Some),
            _ => Ok(None),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
