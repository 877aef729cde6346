use reqwest::{Method, StatusCode};

#[derive(thiserror::Error, Debug)]
pub enum SnowsightError {
    /// The authentication token did not contain a `user-...` segment.
    ///
    /// This is the only error that the collapsing request methods pass through to the caller.
    #[error("No cookie name was found in the authentication token")]
    MissingSessionCookie,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("Snowflake server error: {code}: {message}")]
    ServerError { code: String, message: String },
    #[error(transparent)]
    JSONError(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
    #[error(transparent)]
    FormError(#[from] serde_urlencoded::ser::Error),
}

impl SnowsightError {
    /// Whether this error must reach the caller instead of degrading to an empty body
    pub fn is_terminal(&self) -> bool {
        matches!(self, SnowsightError::MissingSessionCookie)
    }

    /// The HTTP status, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SnowsightError::Status { status, .. } => Some(*status),
            SnowsightError::Request(err) => err.status(),
            _ => None,
        }
    }

    /// 401 and 403, the failures worth surfacing to an interactive user
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

pub type SnowsightResult<T> = Result<T, SnowsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> SnowsightError {
        SnowsightError::Status {
            method: Method::GET,
            url: "https://app.snowflake.com/v0/folders/abc".into(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn only_missing_cookie_is_terminal() {
        assert!(SnowsightError::MissingSessionCookie.is_terminal());
        assert!(!status_error(StatusCode::UNAUTHORIZED).is_terminal());
        assert!(!SnowsightError::ServerError {
            code: "390100".into(),
            message: "Incorrect username or password".into()
        }
        .is_terminal());
    }

    #[test]
    fn authentication_failures() {
        assert!(status_error(StatusCode::UNAUTHORIZED).is_authentication_failure());
        assert!(status_error(StatusCode::FORBIDDEN).is_authentication_failure());
        assert!(!status_error(StatusCode::INTERNAL_SERVER_ERROR).is_authentication_failure());
        assert!(!SnowsightError::MissingSessionCookie.is_authentication_failure());
    }

    #[test]
    fn status_display() {
        assert_eq!(
            status_error(StatusCode::FORBIDDEN).to_string(),
            "GET https://app.snowflake.com/v0/folders/abc returned 403 Forbidden"
        );
    }
}
