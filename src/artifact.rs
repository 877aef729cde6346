use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::cookie::SESSION_COOKIE_PREFIX;
use crate::errors::SnowsightResult;

/// Path prefix of the OAuth completion endpoint, the one call whose result is a cookie
pub const OAUTH_COMPLETION_PATH: &str = "complete-oauth/snowflake";

/// What the OAuth completion GET returns instead of its HTML body
/// when the server hands out a session cookie
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedirectArtifact {
    /// The raw `Set-Cookie` value, ready to be used as a session token
    pub authentication_cookie: String,
    /// The original response body, base64 encoded
    pub result_page: String,
}

impl RedirectArtifact {
    pub fn new(authentication_cookie: &str, body: &str) -> RedirectArtifact {
        RedirectArtifact {
            authentication_cookie: authentication_cookie.to_owned(),
            result_page: base64::engine::general_purpose::STANDARD.encode(body),
        }
    }

    pub fn parse(text: &str) -> SnowsightResult<RedirectArtifact> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> SnowsightResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the original response body
    ///
    /// Returns `None` if the page is not valid base64 or not UTF-8.
    pub fn decoded_result_page(&self) -> Option<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.result_page)
            .ok()?;
        String::from_utf8(bytes).ok()
    }
}

pub(crate) fn is_oauth_completion(path: &str) -> bool {
    path.trim_start_matches('/').starts_with(OAUTH_COMPLETION_PATH)
}

/// Pick the session cookie out of a response's `Set-Cookie` values. The last match wins.
pub fn harvest_session_cookie<'a>(set_cookies: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    set_cookies
        .into_iter()
        .filter(|cookie| cookie.starts_with(SESSION_COOKIE_PREFIX))
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() -> SnowsightResult<()> {
        let artifact = RedirectArtifact::new("user-abc=TOKEN; Path=/", "<html></html>");
        let json: serde_json::Value = serde_json::from_str(&artifact.to_json()?)?;
        assert_eq!(json["authenticationCookie"], "user-abc=TOKEN; Path=/");
        assert_eq!(json["resultPage"], "PGh0bWw+PC9odG1sPg==");
        Ok(())
    }

    #[test]
    fn page_decodes_exactly() -> SnowsightResult<()> {
        let body = "<html>\n  <body>Signed in ✓ \"quoted\"</body>\n</html>";
        let artifact = RedirectArtifact::parse(&RedirectArtifact::new("user-a=b", body).to_json()?)?;
        assert_eq!(artifact.decoded_result_page().as_deref(), Some(body));
        Ok(())
    }

    #[test]
    fn last_session_cookie_wins() {
        let cookies = [
            "user-first=1; Path=/",
            "csrf=abc; Path=/",
            "user-second=2; Path=/",
            "other=3",
        ];
        assert_eq!(
            harvest_session_cookie(cookies),
            Some("user-second=2; Path=/")
        );
        assert_eq!(harvest_session_cookie(["csrf=abc"]), None);
    }

    #[test]
    fn completion_path() {
        assert!(is_oauth_completion("complete-oauth/snowflake?code=1&state=2"));
        assert!(is_oauth_completion("/complete-oauth/snowflake"));
        assert!(!is_oauth_completion("start-oauth/snowflake"));
    }
}
