//! This crate provides a client for the internal REST API behind Snowflake's Snowsight console
//! and its classic web UI.
//!
//! The `lib.rs` file contains the `SnowsightClient` struct, which holds a signed-in Snowsight
//! session and exposes worksheets, dashboards, charts, folders and query monitoring.
//! Signing in is done with the functions in [`auth`], and every call ends up in the
//! [`RequestExecutor`], which handles credentials, logging and failures.
//!
//! Calls return the raw response body. If a call fails for any reason other than a malformed
//! session token, the failure is logged and the body is an empty string. Use the `try_*`
//! methods on [`RequestExecutor`] when you need to know why.
//!
//! Example usage:
//!
//! ```rust,no_run
//! use light_snowsight_connector::{
//!     auth, ExecutionContext, RedirectArtifact, RequestExecutor, SnowsightClient, SnowsightError,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SnowsightError> {
//!     let executor = RequestExecutor::default();
//!
//!     // The OAuth redirect code comes from auth::oauth_redirect_from_master_token
//!     let completed = auth::authentication_token_from_oauth_redirect(
//!         &executor,
//!         "https://apps-api.c1.us-west-2.aws.app.snowflake.com",
//!         "https://xyz.snowflakecomputing.com",
//!         "REDIRECT_CODE",
//!     )
//!     .await?;
//!     let artifact = RedirectArtifact::parse(&completed)?;
//!
//!     let client = SnowsightClient {
//!         executor,
//!         app_server_url: "https://apps-api.c1.us-west-2.aws.app.snowflake.com".into(),
//!         account_url: "https://xyz.snowflakecomputing.com".into(),
//!         organization_id: "ORG_ID".into(),
//!         user_name: "USER".into(),
//!         auth_token: artifact.authentication_cookie,
//!     };
//!
//!     let worksheets = client.worksheets().await?;
//!     if worksheets.is_empty() {
//!         println!("Nothing came back, check the logs");
//!     }
//!
//!     let context = ExecutionContext {
//!         role: "ANALYST".into(),
//!         warehouse: "WH".into(),
//!         database: "DB".into(),
//!         schema: "PUBLIC".into(),
//!     };
//!     let result = client
//!         .execute_worksheet("WORKSHEET_ID", "SELECT 1", "[]", &context)
//!         .await?;
//!     println!("{result}");
//!     Ok(())
//! }
//! ```
use serde::Serialize;

pub mod artifact;
pub mod auth;
mod charts;
pub mod context;
pub mod cookie;
mod dashboards;
mod entities;
mod errors;
pub mod executor;
pub mod metadata;
mod queries;
pub mod redact;
pub mod telemetry;
mod worksheets;

pub use artifact::RedirectArtifact;
pub use context::{AuthenticationContext, Credential};
pub use cookie::SessionCookie;
pub use dashboards::DisplayMode;
pub use entities::EntityKind;
pub use errors::{SnowsightError, SnowsightResult};
pub use executor::RequestExecutor;
pub use telemetry::{LogFacade, RequestLogger};
pub use worksheets::ExecutionContext;

use auth::JSON;
use context::SNOWSIGHT_REFERER;

const FORM: &str = "application/x-www-form-urlencoded";

/// A signed-in Snowsight session
///
/// `auth_token` is the raw session cookie string, as found in
/// [`RedirectArtifact::authentication_cookie`].
#[derive(Debug, Clone)]
pub struct SnowsightClient {
    pub executor: RequestExecutor,
    pub app_server_url: String,
    pub account_url: String,
    pub organization_id: String,
    pub user_name: String,
    pub auth_token: String,
}

impl SnowsightClient {
    /// The credentials and headers Snowsight expects on every call of this session
    pub fn context(&self) -> AuthenticationContext {
        AuthenticationContext::anonymous()
            .with_session_token(&self.auth_token)
            .with_user_context(&self.user_name, &self.account_url)
            .with_referer(SNOWSIGHT_REFERER)
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        context: &AuthenticationContext,
    ) -> SnowsightResult<String> {
        self.executor
            .get(&self.app_server_url, path, JSON, context)
            .await
    }

    pub(crate) async fn post_form<T: Serialize + ?Sized>(
        &self,
        path: &str,
        form: &T,
    ) -> SnowsightResult<String> {
        let body = serde_urlencoded::to_string(form)?;
        self.executor
            .post(&self.app_server_url, path, JSON, &body, FORM, &self.context())
            .await
    }

    pub(crate) async fn delete(&self, path: &str) -> SnowsightResult<String> {
        self.executor
            .delete(&self.app_server_url, path, JSON, &self.context())
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TOKEN: &str = "user-abc123=TOKENVALUE==; Path=/; HttpOnly; Secure";

    /// A client pointed at a mock app server
    pub(crate) fn client(app_server_url: &str) -> SnowsightClient {
        SnowsightClient {
            executor: RequestExecutor::default(),
            app_server_url: app_server_url.to_owned(),
            account_url: "https://xyz.snowflakecomputing.com".into(),
            organization_id: "123456".into(),
            user_name: "ME".into(),
            auth_token: TOKEN.into(),
        }
    }

    /// Decode a form body into its pairs, in order
    pub(crate) fn form_pairs(body: &str) -> Vec<(String, String)> {
        serde_urlencoded::from_str(body).unwrap()
    }

    #[test]
    fn session_context() {
        let context = client("https://apps-api.example.com").context();
        assert_eq!(context.credential(), &Credential::SessionToken(TOKEN.into()));
        assert_eq!(
            context.snowflake_context(),
            Some("ME::https://xyz.snowflakecomputing.com")
        );
        assert_eq!(context.referer(), Some("https://app.snowflake.com/"));
        assert_eq!(context.role(), None);
    }
}
