use crate::refresh::RefreshError;
use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use thiserror::Error;

/// Errors surfaced to clients of the HTTP api
#[derive(Error, Debug)]
pub enum CountdownError {
    #[error("Internal server error")]
    InternalError,
    #[error("Invalid data provided: Error message: `{0}`")]
    BadClientData(String),
    /// Lost an optimistic concurrency check or the request does not fit the current store
    #[error("There was a conflict with the request. Error message: `{0}`")]
    Conflict(String),
    #[error("404 Not found. Error message: `{0}`")]
    NotFound(String),
    #[error("The service is shutting down and can not handle the request")]
    Unavailable,
}

impl actix_web::error::ResponseError for CountdownError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadClientData(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .body(self.to_string())
    }
}

impl From<RefreshError> for CountdownError {
    fn from(e: RefreshError) -> Self {
        match e {
            RefreshError::Stopped => Self::Unavailable,
            RefreshError::Persistence(_)
            | RefreshError::InvalidEvent(_, _)
            | RefreshError::Logic(_) => Self::InternalError,
        }
    }
}
