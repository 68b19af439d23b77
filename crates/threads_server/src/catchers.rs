use rocket::request::Request;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use threads_common::errors::ThreadsServerError;

#[derive(Responder)]
pub enum ThreadsResponse {
    #[response(status = 400)]
    BadRequest(Json<ErrorBody>),
    #[response(status = 401)]
    Unauthorized(Json<ErrorBody>),
    #[response(status = 403)]
    Forbidden(Json<ErrorBody>),
    #[response(status = 404)]
    NotFound(Json<ErrorBody>),
    #[response(status = 409)]
    Conflict(Json<ErrorBody>),
    #[response(status = 422)]
    Unprocessable(Json<ErrorBody>),
    #[response(status = 500)]
    InternalError(Json<ErrorBody>),
}

/// Error left in the request's local cache by a failing guard
pub struct ErrorMessage(pub Option<ThreadsServerError>);

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub message: String,
    pub error: Option<ThreadsServerError>,
}

impl ErrorBody {
    pub fn new(error: ThreadsServerError) -> Json<Self> {
        Json(ErrorBody {
            message: error.to_string(),
            error: Some(error),
        })
    }

    pub fn message(message: &str) -> Json<Self> {
        Json(ErrorBody {
            message: message.to_string(),
            error: None,
        })
    }
}

impl From<ThreadsServerError> for ThreadsResponse {
    fn from(error: ThreadsServerError) -> Self {
        match error.root_cause() {
            ThreadsServerError::ThreadNotFound(_) | ThreadsServerError::UserNotFound(_) => {
                ThreadsResponse::NotFound(ErrorBody::new(error))
            }
            ThreadsServerError::TextTooShort(_) | ThreadsServerError::InvalidObjectId(_) => {
                ThreadsResponse::BadRequest(ErrorBody::new(error))
            }
            ThreadsServerError::UsernameTaken(_) => ThreadsResponse::Conflict(ErrorBody::new(error)),
            ThreadsServerError::MissingIdentity => {
                ThreadsResponse::Unauthorized(ErrorBody::new(error))
            }
            ThreadsServerError::NotThreadAuthor(_, _) => {
                ThreadsResponse::Forbidden(ErrorBody::new(error))
            }
            _ => ThreadsResponse::InternalError(ErrorBody::new(error)),
        }
    }
}

fn cached(req: &Request) -> Option<ThreadsServerError> {
    req.local_cache(|| ErrorMessage(None)).0.clone()
}

#[catch(400)]
pub fn bad_request(req: &Request) -> ThreadsResponse {
    match cached(req) {
        Some(e) => ThreadsResponse::BadRequest(ErrorBody::new(e)),
        None => ThreadsResponse::BadRequest(ErrorBody::message(
            "Unknown bad request error has occurred",
        )),
    }
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> ThreadsResponse {
    match cached(req) {
        Some(e) => ThreadsResponse::Unauthorized(ErrorBody::new(e)),
        None => ThreadsResponse::Unauthorized(ErrorBody::message(
            "Unknown authorization error has occurred",
        )),
    }
}

#[catch(403)]
pub fn forbidden(req: &Request) -> ThreadsResponse {
    match cached(req) {
        Some(e) => ThreadsResponse::Forbidden(ErrorBody::new(e)),
        None => ThreadsResponse::Forbidden(ErrorBody::message("Action not permitted")),
    }
}

#[catch(404)]
pub fn not_found(req: &Request) -> ThreadsResponse {
    match cached(req) {
        Some(e) => ThreadsResponse::NotFound(ErrorBody::new(e)),
        None => ThreadsResponse::NotFound(ErrorBody::message("Asset not found")),
    }
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> ThreadsResponse {
    ThreadsResponse::Unprocessable(ErrorBody::message("Request body could not be parsed"))
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> ThreadsResponse {
    ThreadsResponse::InternalError(ErrorBody::message("Unknown server error has occurred"))
}
