//! Viewer identity extraction.
//!
//! JWT verification happens in the upstream gateway; this service trusts the
//! user id the gateway forwards in `x-user-id`. Handlers declare whether a
//! request must be authenticated by taking `UserId` (required) or
//! `MaybeUserId` (anonymous allowed, no annotation and no authoring).

use actix_web::{error::ErrorUnauthorized, dev::Payload, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

/// Header the gateway sets after authenticating the caller
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user id; extraction fails with 401 when absent
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

/// Optional viewer identity; anonymous requests resolve to `None`
#[derive(Debug, Clone, Copy)]
pub struct MaybeUserId(pub Option<Uuid>);

fn user_id_from_headers(req: &HttpRequest) -> Result<Option<Uuid>, Error> {
    let Some(value) = req.headers().get(USER_ID_HEADER) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| ErrorUnauthorized("Invalid user ID header"))?;
    let user_id =
        Uuid::parse_str(raw).map_err(|_| ErrorUnauthorized("Invalid user ID header"))?;

    Ok(Some(user_id))
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(user_id_from_headers(req).and_then(|id| {
            id.map(UserId)
                .ok_or_else(|| ErrorUnauthorized("User ID missing"))
        }))
    }
}

impl FromRequest for MaybeUserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(user_id_from_headers(req).map(MaybeUserId))
    }
}
