use std::time::Instant;

use log::Level;
use reqwest::Method;
use uuid::Uuid;

use crate::redact;

/// `log` target of the diagnostic channel
pub const OPERATOR_TARGET: &str = "snowsight";
/// `log` target of the user-facing channel
pub const CONSOLE_TARGET: &str = "snowsight::console";

/// Where the request executor reports what it did
///
/// The operator channel gets the full request and response detail of every call.
/// The console channel only hears about failures a user can act on:
/// rejected credentials (401/403) and calls that never got a response.
pub trait RequestLogger: Send + Sync {
    fn operator(&self, level: Level, message: &str);
    fn console(&self, level: Level, message: &str);
}

/// Forwards both channels to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl RequestLogger for LogFacade {
    fn operator(&self, level: Level, message: &str) {
        log::log!(target: OPERATOR_TARGET, level, "{message}");
    }

    fn console(&self, level: Level, message: &str) {
        log::log!(target: CONSOLE_TARGET, level, "{message}");
    }
}

/// Logs how long a call took when dropped, whichever way the call ended
pub(crate) struct CallTimer<'a> {
    logger: &'a dyn RequestLogger,
    method: Method,
    url: &'a str,
    request_id: Uuid,
    started: Instant,
}

impl<'a> CallTimer<'a> {
    pub fn start(logger: &'a dyn RequestLogger, method: Method, url: &'a str) -> CallTimer<'a> {
        CallTimer {
            logger,
            method,
            url,
            request_id: Uuid::new_v4(),
            started: Instant::now(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Drop for CallTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        self.logger.operator(
            Level::Info,
            &format!(
                "{} {} took {} ({} ms) [request {}]",
                self.method,
                self.url,
                redact::clock(elapsed),
                elapsed.as_millis(),
                self.request_id
            ),
        );
    }
}
