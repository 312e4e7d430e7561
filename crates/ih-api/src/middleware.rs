//! Middleware for request logging.

use actix_web::middleware::Logger;

// Returns the standard request logger for the image-hoster API.
// Output: remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}
