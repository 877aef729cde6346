use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::errors::{SnowsightError, SnowsightResult};

/// Every Snowsight session cookie is named `user-<hex>`
pub const SESSION_COOKIE_PREFIX: &str = "user-";

/// A Snowsight session cookie, parsed from the raw `Set-Cookie` style string
/// returned by the OAuth completion endpoint.
///
/// Example input:
///
/// ```text
/// user-646f64...2325=CFBrZWxTQ0U3...oxw==; Path=/; Expires=Wed, 12 May 2021 02:18:33 GMT; Max-Age=2419200; HttpOnly; Secure; SameSite=Lax
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Always the host of the URL the cookie is sent to
    pub domain: String,
    pub path: String,
    pub expires: Option<DateTime<Utc>>,
    pub http_only: bool,
    pub secure: bool,
}

impl SessionCookie {
    /// Parse a raw cookie string and bind it to `domain`
    ///
    /// Attribute order does not matter and unknown attributes are skipped.
    /// An unparseable `Expires` is skipped, keeping any earlier valid one.
    ///
    /// Fails with [`SnowsightError::MissingSessionCookie`] if no `user-...=` segment is present.
    pub fn parse(raw: &str, domain: &str) -> SnowsightResult<SessionCookie> {
        let mut name = None;
        let mut value = String::new();
        let mut path = None;
        let mut expires = None;
        let mut http_only = false;
        let mut secure = false;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            match segment.split_once('=') {
                None if segment.eq_ignore_ascii_case("HttpOnly") => http_only = true,
                None if segment.eq_ignore_ascii_case("Secure") => secure = true,
                None => {}
                Some((key, attribute)) if key.eq_ignore_ascii_case("Path") => {
                    path = Some(attribute.to_owned());
                }
                Some((key, attribute)) if key.eq_ignore_ascii_case("Expires") => {
                    if let Some(parsed) = parse_expiry(attribute) {
                        expires = Some(parsed);
                    }
                }
                // Base64 padding stays in the value
                Some((key, token)) if key.starts_with(SESSION_COOKIE_PREFIX) => {
                    name = Some(key.to_owned());
                    value = token.to_owned();
                }
                Some(_) => {}
            }
        }

        let name = name.ok_or(SnowsightError::MissingSessionCookie)?;
        Ok(SessionCookie {
            name,
            value,
            domain: domain.to_owned(),
            path: path.unwrap_or_else(|| "/".to_owned()),
            expires,
            http_only,
            secure,
        })
    }

    /// The `name=value` pair as sent in a `Cookie` request header
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 3] = [
        // Netscape
        "%a, %d-%b-%Y %H:%M:%S GMT",
        // RFC 850
        "%A, %d-%b-%y %H:%M:%S GMT",
        // asctime
        "%a %b %e %H:%M:%S %Y",
    ];
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
