use crate::catchers::ErrorMessage;
use rocket::{
    http::Status,
    outcome::Outcome::{Error as Failure, Success},
    request::{FromRequest, Outcome, Request},
};
use threads_common::errors::ThreadsServerError;

pub const IDENTITY_HEADER: &str = "X-User-Id";

/// External id of the caller, issued and verified by the identity provider in
/// front of this service
pub struct AuthenticatedUser(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.headers().get_one(IDENTITY_HEADER).map(str::trim) {
            Some(external_id) if !external_id.is_empty() => {
                Success(AuthenticatedUser(external_id.to_string()))
            }
            _ => {
                request.local_cache(|| ErrorMessage(Some(ThreadsServerError::MissingIdentity)));
                Failure((Status::Unauthorized, ()))
            }
        }
    }
}
