//! Discovering where an account's Snowsight lives, and who the signed-in user is
use crate::auth::{OAuthState, HTML, SNOWSIGHT_URL};
use crate::context::AuthenticationContext;
use crate::errors::SnowsightResult;
use crate::executor::RequestExecutor;
use crate::SnowsightClient;

/// Ask Snowsight which app server and endpoints serve `account_name`
pub async fn account_app_endpoints(
    executor: &RequestExecutor,
    account_name: &str,
) -> SnowsightResult<String> {
    let query = serde_urlencoded::to_string([("url", account_name)])?;
    executor
        .get(
            SNOWSIGHT_URL,
            &format!("v0/validate-snowflake-url?{query}"),
            "*/*",
            &AuthenticationContext::anonymous(),
        )
        .await
}

/// Start the OAuth flow on the app server
///
/// The response is the HTML (or redirect) that carries Snowsight's OAuth client id
/// for this deployment.
pub async fn snowsight_client_id(
    executor: &RequestExecutor,
    app_server_url: &str,
    account_url: &str,
) -> SnowsightResult<String> {
    let state = OAuthState::for_account(account_url).to_json()?;
    let query =
        serde_urlencoded::to_string([("accountUrl", account_url), ("state", state.as_str())])?;
    executor
        .get(
            app_server_url,
            &format!("start-oauth/snowflake?{query}"),
            HTML,
            &AuthenticationContext::anonymous(),
        )
        .await
}

impl SnowsightClient {
    /// Organization and user details for the session, including the organization id
    pub async fn organization_and_user_context(
        &self,
        region: &str,
        account_name: &str,
    ) -> SnowsightResult<String> {
        self.get(&format!("bootstrap/{region}/{account_name}"), &self.context())
            .await
    }
}
