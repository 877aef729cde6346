use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Endpoints whose request bodies carry a password
pub const LOGIN_PATHS: [&str; 2] = ["session/authenticate-request", "session/v1/login-request"];

const PASSWORD_MASK: &str = r#""PASSWORD":"****""#;

/// A well-formed JSON string value followed by `,`, `}`, `]` or the end of the line.
/// Anything else is masked through to the end of the line.
fn password_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?im)"PASSWORD"\s*:\s*(?:"(?:[^"\\]|\\.)*"(?P<end>\s*(?:[,}\]]|$))|".*$)"#,
        )
        .expect("password pattern is valid")
    })
}

pub fn is_login_path(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    LOGIN_PATHS.iter().any(|login| path.starts_with(login))
}

/// The copy of a request body that is safe to write to a log
///
/// Bodies sent to a login endpoint have their `"PASSWORD": "..."` value masked.
/// Everything else is returned as is.
pub fn loggable_body(path: &str, body: &str) -> String {
    if is_login_path(path) {
        password_pattern()
            .replace_all(body, r#""PASSWORD":"****"${end}"#)
            .into_owned()
    } else {
        body.to_owned()
    }
}

/// Format a duration as `[d.]hh:mm:ss[.fffffff]`
pub fn clock(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let (days, hours, minutes, seconds) = (
        seconds / 86_400,
        seconds / 3_600 % 24,
        seconds / 60 % 60,
        seconds % 60,
    );
    // 100ns ticks
    let fraction = elapsed.subsec_nanos() / 100;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if fraction > 0 {
        out.push_str(&format!(".{fraction:07}"));
    }
    out
}
