//! Logging in to Snowsight and the classic UI
//!
//! Snowsight sign-in is a three step dance:
//!
//! 1. [`master_token_from_credentials`] exchanges a password for a master token
//! 2. [`oauth_redirect_from_master_token`] turns that into an OAuth redirect carrying a code
//! 3. [`authentication_token_from_oauth_redirect`] trades the code for the session cookie,
//!    returned as a [`RedirectArtifact`](crate::RedirectArtifact)
//!
//! The classic UI logs in directly, with a password or an SSO token.
use serde::{Deserialize, Serialize};

use crate::context::AuthenticationContext;
use crate::errors::{SnowsightError, SnowsightResult};
use crate::executor::RequestExecutor;

pub(crate) const JSON: &str = "application/json";
pub(crate) const HTML: &str = "text/html";

/// Browser URL of the Snowsight console
pub const SNOWSIGHT_URL: &str = "https://app.snowflake.com";

const CSRF: &str = "SnowflakePS";

#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    data: LoginRequestData<'a>,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginRequestData<'a> {
    account_name: &'a str,
    login_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authenticator: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    browser_mode_redirect_port: Option<u16>,
}

impl<'a> LoginRequestData<'a> {
    fn password(account_name: &'a str, login_name: &'a str, password: &'a str) -> Self {
        LoginRequestData {
            account_name,
            login_name,
            password: Some(password),
            ..Default::default()
        }
    }

    fn external_browser(account_name: &'a str, login_name: &'a str) -> Self {
        LoginRequestData {
            account_name,
            login_name,
            authenticator: Some("externalbrowser"),
            ..Default::default()
        }
    }

    fn into_json(self) -> SnowsightResult<String> {
        Ok(serde_json::to_string(&LoginRequest { data: self })?)
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AuthorizationRequest<'a> {
    master_token: &'a str,
    client_id: &'a str,
}

/// The `state` parameter Snowsight round-trips through its OAuth endpoints
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OAuthState<'a> {
    is_secondary_user: bool,
    csrf: &'a str,
    url: &'a str,
    browser_url: &'a str,
}

impl<'a> OAuthState<'a> {
    pub(crate) fn for_account(account_url: &'a str) -> OAuthState<'a> {
        OAuthState {
            is_secondary_user: false,
            csrf: CSRF,
            url: account_url,
            browser_url: SNOWSIGHT_URL,
        }
    }

    pub(crate) fn to_json(&self) -> SnowsightResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Exchange a Snowsight username and password for a master token
///
/// Returns the raw response body, or an empty string on failure.
pub async fn master_token_from_credentials(
    executor: &RequestExecutor,
    account_url: &str,
    account_name: &str,
    user_name: &str,
    password: &str,
) -> SnowsightResult<String> {
    let body = LoginRequestData::password(account_name, user_name, password).into_json()?;
    executor
        .post(
            account_url,
            "session/authenticate-request",
            JSON,
            &body,
            JSON,
            &AuthenticationContext::anonymous(),
        )
        .await
}

/// Ask the account for an OAuth redirect for the Snowsight client
pub async fn oauth_redirect_from_master_token(
    executor: &RequestExecutor,
    account_url: &str,
    client_id: &str,
    master_token: &str,
) -> SnowsightResult<String> {
    let body = serde_json::to_string(&AuthorizationRequest {
        master_token,
        client_id,
    })?;
    executor
        .post(
            account_url,
            "oauth/authorization-request",
            JSON,
            &body,
            JSON,
            &AuthenticationContext::anonymous(),
        )
        .await
}

/// Complete the OAuth flow on the Snowsight app server
///
/// On success this is a [`RedirectArtifact`](crate::RedirectArtifact) JSON string whose
/// `authenticationCookie` is the session token for [`SnowsightClient`](crate::SnowsightClient).
pub async fn authentication_token_from_oauth_redirect(
    executor: &RequestExecutor,
    app_server_url: &str,
    account_url: &str,
    oauth_redirect_code: &str,
) -> SnowsightResult<String> {
    let state = OAuthState::for_account(account_url).to_json()?;
    let query =
        serde_urlencoded::to_string([("code", oauth_redirect_code), ("state", state.as_str())])?;
    executor
        .get(
            app_server_url,
            &format!("complete-oauth/snowflake?{query}"),
            HTML,
            &AuthenticationContext::anonymous(),
        )
        .await
}

/// Log in to the classic UI with a password, getting a master and a session token
pub async fn classic_tokens_from_credentials(
    executor: &RequestExecutor,
    account_url: &str,
    account_name: &str,
    user_name: &str,
    password: &str,
) -> SnowsightResult<String> {
    let body = LoginRequestData::password(account_name, user_name, password).into_json()?;
    classic_login(executor, account_url, &body).await
}

/// Log in to the classic UI with the token an SSO browser redirect handed back
pub async fn classic_tokens_from_sso_token(
    executor: &RequestExecutor,
    account_url: &str,
    account_name: &str,
    user_name: &str,
    token: &str,
    proof_key: &str,
) -> SnowsightResult<String> {
    let body = LoginRequestData {
        token: Some(token),
        proof_key: Some(proof_key),
        ..LoginRequestData::external_browser(account_name, user_name)
    }
    .into_json()?;
    classic_login(executor, account_url, &body).await
}

async fn classic_login(
    executor: &RequestExecutor,
    account_url: &str,
    body: &str,
) -> SnowsightResult<String> {
    executor
        .post(
            account_url,
            "session/v1/login-request",
            JSON,
            body,
            JSON,
            &AuthenticationContext::anonymous(),
        )
        .await
}

/// Get the SSO URL to open in a browser, which will redirect back to `redirect_port` on localhost
pub async fn sso_login_link(
    executor: &RequestExecutor,
    account_url: &str,
    account_name: &str,
    user_name: &str,
    redirect_port: u16,
) -> SnowsightResult<String> {
    let body = LoginRequestData {
        browser_mode_redirect_port: Some(redirect_port),
        ..LoginRequestData::external_browser(account_name, user_name)
    }
    .into_json()?;
    executor
        .post(
            account_url,
            "session/authenticator-request",
            JSON,
            &body,
            JSON,
            &AuthenticationContext::anonymous(),
        )
        .await
}

/// The `{data, code, message, success}` envelope of the classic login endpoints
#[derive(Deserialize, Debug)]
pub struct LoginEnvelope<T> {
    pub data: Option<T>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub success: bool,
}

impl<T> LoginEnvelope<T> {
    /// Convert from the wire envelope to a standard result
    pub fn into_result(self) -> SnowsightResult<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(SnowsightError::ServerError {
                code: self.code.unwrap_or_default(),
                message: self.message.unwrap_or_default(),
            })
        }
    }
}

/// The parts of a classic login response this crate knows about
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub master_token: Option<String>,
    pub token: Option<String>,
    pub sso_url: Option<String>,
    pub proof_key: Option<String>,
}

/// Parse a response from the classic login or SSO endpoints
pub fn parse_login_response(body: &str) -> SnowsightResult<LoginData> {
    Ok(serde_json::from_str::<LoginEnvelope<LoginData>>(body)?
        .into_result()?
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::artifact::RedirectArtifact;

    #[test]
    fn password_body() -> SnowsightResult<()> {
        let body = LoginRequestData::password("ACCT", "me", "p\"w").into_json()?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        assert_eq!(
            value,
            json!({"data": {"ACCOUNT_NAME": "ACCT", "LOGIN_NAME": "me", "PASSWORD": "p\"w"}})
        );
        Ok(())
    }

    #[test]
    fn sso_bodies() -> SnowsightResult<()> {
        let body = LoginRequestData {
            token: Some("tok"),
            proof_key: Some("proof"),
            ..LoginRequestData::external_browser("ACCT", "me")
        }
        .into_json()?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        assert_eq!(
            value["data"],
            json!({
                "ACCOUNT_NAME": "ACCT",
                "LOGIN_NAME": "me",
                "AUTHENTICATOR": "externalbrowser",
                "TOKEN": "tok",
                "PROOF_KEY": "proof"
            })
        );

        let body = LoginRequestData {
            browser_mode_redirect_port: Some(8123),
            ..LoginRequestData::external_browser("ACCT", "me")
        }
        .into_json()?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        assert_eq!(value["data"]["BROWSER_MODE_REDIRECT_PORT"], json!(8123));
        Ok(())
    }

    #[test]
    fn state_shape() -> SnowsightResult<()> {
        let state = OAuthState::for_account("https://xyz.snowflakecomputing.com").to_json()?;
        assert_eq!(
            state,
            r#"{"isSecondaryUser":false,"csrf":"SnowflakePS","url":"https://xyz.snowflakecomputing.com","browserUrl":"https://app.snowflake.com"}"#
        );
        Ok(())
    }

    #[test]
    fn login_envelope() -> SnowsightResult<()> {
        let data = parse_login_response(
            r#"{"data":{"masterToken":"m","token":"t","validityInSeconds":3600},"code":null,"message":null,"success":true}"#,
        )?;
        assert_eq!(data.master_token.as_deref(), Some("m"));
        assert_eq!(data.token.as_deref(), Some("t"));

        let failed = parse_login_response(
            r#"{"data":null,"code":"390100","message":"Incorrect username or password was specified.","success":false}"#,
        );
        assert!(matches!(
            failed,
            Err(SnowsightError::ServerError { ref code, .. }) if code == "390100"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn classic_login_posts_credentials() -> SnowsightResult<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/session/v1/login-request")
                    .json_body(json!({"data": {"ACCOUNT_NAME": "ACCT", "LOGIN_NAME": "me", "PASSWORD": "pw"}}));
                then.status(200)
                    .body(r#"{"data":{"masterToken":"m","token":"t"},"success":true}"#);
            })
            .await;

        let body = classic_tokens_from_credentials(
            &RequestExecutor::default(),
            &server.base_url(),
            "ACCT",
            "me",
            "pw",
        )
        .await?;
        mock.assert_async().await;
        assert_eq!(parse_login_response(&body)?.token.as_deref(), Some("t"));
        Ok(())
    }

    #[tokio::test]
    async fn oauth_completion_yields_cookie() -> SnowsightResult<()> {
        let server = MockServer::start_async().await;
        let account_url = "https://xyz.snowflakecomputing.com";
        let state = OAuthState::for_account(account_url).to_json()?;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/complete-oauth/snowflake")
                    .query_param("code", "redirect-code")
                    .query_param("state", &state);
                then.status(302)
                    .header("Set-Cookie", "user-abc=TOKEN==; Path=/; HttpOnly")
                    .body("<html></html>");
            })
            .await;

        let result = authentication_token_from_oauth_redirect(
            &RequestExecutor::default(),
            &server.base_url(),
            account_url,
            "redirect-code",
        )
        .await?;
        mock.assert_async().await;
        let artifact = RedirectArtifact::parse(&result)?;
        assert_eq!(artifact.authentication_cookie, "user-abc=TOKEN==; Path=/; HttpOnly");
        Ok(())
    }
}
