//! Caller identity
//!
//! Sessions are issued elsewhere. The service sits behind a gateway that has
//! already verified the session and forwards the user id, either as
//! `Authorization: Bearer <uuid>` or as `X-User-Id: <uuid>`.

use hyper::header::{HeaderMap, AUTHORIZATION};
use starsailors_core::{Error, Result, UserId};

/// Header set by the gateway when it does not rewrite `Authorization`
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the calling user from request headers.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, headers: &HeaderMap) -> Result<UserId>;
}

/// Trusts identity headers set by an upstream gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderAuthenticator;

impl Authenticator for HeaderAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<UserId> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer);

        bearer
            .or_else(|| {
                headers
                    .get(USER_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
            })
            .ok_or(Error::Unauthorized)
    }
}

/// Parse `Bearer <uuid>`; anything else is no identity
fn parse_bearer(header: &str) -> Option<UserId> {
    let token = header.strip_prefix("Bearer ")?;
    token.trim().parse().ok()
}
