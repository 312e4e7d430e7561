//! Signed-cookie sessions.
//!
//! The cookie holds `base64(username).hex(hmac_sha256(base64(username)))`.
//! Handlers turn a valid cookie into a `User` and pass it down explicitly;
//! nothing below this layer ever touches the session.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "ih_session";

pub struct SessionSigner {
    secret: Vec<u8>,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).expect("hmac key")
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Builds the login cookie for `username`.
    pub fn issue(&self, username: &str) -> Cookie<'static> {
        let payload = URL_SAFE_NO_PAD.encode(username);
        let signature = self.sign(&payload);
        Cookie::build(SESSION_COOKIE, format!("{payload}.{signature}"))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish()
    }

    /// Returns the username carried by a validly signed session cookie.
    pub fn authenticate(&self, req: &HttpRequest) -> Option<String> {
        let cookie = req.cookie(SESSION_COOKIE)?;
        let (payload, signature) = cookie.value().split_once('.')?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        if mac.verify_slice(&hex::decode(signature).ok()?).is_err() {
            return None;
        }
        let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
        String::from_utf8(decoded).ok()
    }

    /// An expired cookie that logs the browser out.
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .finish();
        cookie.make_removal();
        cookie
    }
}
