//! One-time notices that survive a redirect.
//!
//! A flash is stored client-side in the `flash` cookie as a URL-encoded
//! `level`/`message` pair. `dispatch` reads it into the request context and
//! [`consume_flash`] expires the cookie once a page has been rendered with it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::router::{PostMiddleware, build_cookie};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Flash {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Flash::new(Level::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Flash::new(Level::Error, message)
    }

    pub fn encode(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Option<Flash> {
        serde_urlencoded::from_str(raw).ok()
    }

    /// `Set-Cookie` value carrying this notice to the next request.
    pub fn to_cookie(&self) -> String {
        build_cookie(FLASH_COOKIE, &self.encode(), None, false)
    }

    pub fn clear_cookie() -> String {
        build_cookie(FLASH_COOKIE, "", Some(0), false)
    }
}

/// Post-middleware expiring a displayed flash.
///
/// The cookie is only cleared when the incoming request carried a flash, the
/// response is a rendered page (2xx) and the handler did not queue a new one.
pub fn consume_flash() -> PostMiddleware {
    Arc::new(|ctx, resp| {
        let rendered = (200..300).contains(&resp.status_code);
        if ctx.flash.is_some() && rendered && resp.cookie_value(FLASH_COOKIE).is_none() {
            resp.with_cookie(Flash::clear_cookie())
        } else {
            resp
        }
    })
}
