use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use tracing::error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    UnknownError,
    DbError,
    ConfigReadError,
    ConfigParseError,
    NotFound,
    InternalServer,
    BodyParsing,
    PathParsing,
    QueryParsing,
    UnAuthorized,
    ParseError,
    IOError,
    BadRequest,
    /// the caller is known but may not act on the target
    Forbidden,
    /// a relationship already links the two users, in either ordering
    DuplicateRelationship,
    /// a channel could not deliver an event; never leaves the channel
    NotificationDelivery,
    MailError,
    TemplateError,
}

#[derive(Debug, Serialize)]
pub struct Error {
    kind: ErrorKind,
    details: Option<String>,
    #[serde(skip)]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    #[inline]
    pub fn new(
        kind: ErrorKind,
        details: impl Into<String>,
        source: impl StdError + 'static + Send + Sync,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            details: Some(details.into()),
        }
    }

    #[inline]
    pub fn with_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            source: None,
            details: None,
        }
    }

    #[inline]
    pub fn with_details(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            details: Some(details.into()),
        }
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    #[inline]
    pub fn internal(error: impl StdError + 'static + Send + Sync) -> Self {
        Self {
            kind: ErrorKind::InternalServer,
            details: Some(error.to_string()),
            source: Some(Box::new(error)),
        }
    }

    #[inline]
    pub fn internal_with_details(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::InternalServer, details)
    }

    #[inline]
    pub fn unauthorized(
        error: impl StdError + 'static + Send + Sync,
        details: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::UnAuthorized, details, error)
    }

    #[inline]
    pub fn unauthorized_with_details(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::UnAuthorized, details)
    }

    #[inline]
    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::BadRequest, details)
    }

    #[inline]
    pub fn forbidden(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::Forbidden, details)
    }

    #[inline]
    pub fn not_found() -> Self {
        Self::with_kind(ErrorKind::NotFound)
    }

    #[inline]
    pub fn not_found_with_details(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::NotFound, details)
    }

    #[inline]
    pub fn duplicate_relationship(requester: &str, recipient: &str) -> Self {
        Self::with_details(
            ErrorKind::DuplicateRelationship,
            format!("a request or friendship already exists between {requester} and {recipient}"),
        )
    }

    #[inline]
    pub fn notification_delivery(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::NotificationDelivery, details)
    }

    #[inline]
    pub fn body_parsing(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::BodyParsing, details)
    }

    #[inline]
    pub fn query_parsing(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::QueryParsing, details)
    }

    #[inline]
    pub fn path_parsing(err: impl StdError + 'static + Send + Sync) -> Self {
        Self::new(ErrorKind::PathParsing, err.to_string(), err)
    }

    #[inline]
    pub fn is_duplicate_relationship(&self) -> bool {
        self.kind == ErrorKind::DuplicateRelationship
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::BodyParsing => StatusCode::BAD_REQUEST,
            ErrorKind::PathParsing => StatusCode::BAD_REQUEST,
            ErrorKind::QueryParsing => StatusCode::BAD_REQUEST,
            ErrorKind::UnAuthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DbError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ParseError | ErrorKind::ConfigReadError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ConfigParseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::IOError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::DuplicateRelationship => StatusCode::CONFLICT,
            ErrorKind::NotificationDelivery => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::MailError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::TemplateError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{:?}: {}", self.kind, details),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            error!("custom error to http error{:?}", self);
        }
        (status_code, Json(self)).into_response()
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value.to_string(), value)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Self {
        Self::new(ErrorKind::ConfigParseError, value.to_string(), value)
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        Self::new(ErrorKind::DbError, value.to_string(), value)
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::new(ErrorKind::DbError, value.to_string(), value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorKind::ParseError, value.to_string(), value)
    }
}

impl From<tera::Error> for Error {
    fn from(value: tera::Error) -> Self {
        Self::new(ErrorKind::TemplateError, value.to_string(), value)
    }
}

impl From<lettre::error::Error> for Error {
    fn from(value: lettre::error::Error) -> Self {
        Self::new(ErrorKind::MailError, value.to_string(), value)
    }
}

impl From<lettre::address::AddressError> for Error {
    fn from(value: lettre::address::AddressError) -> Self {
        Self::new(ErrorKind::MailError, value.to_string(), value)
    }
}

impl From<lettre::transport::smtp::Error> for Error {
    fn from(value: lettre::transport::smtp::Error) -> Self {
        Self::new(ErrorKind::MailError, value.to_string(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_relationship_maps_to_conflict() {
        let err = Error::duplicate_relationship("u1", "u2");
        assert!(err.is_duplicate_relationship());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("u1"));
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(Error::not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::not_found().to_string(), "NotFound");
    }

    #[test]
    fn forbidden_maps_to_403() {
        let err = Error::forbidden("not friends");
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn sqlx_error_keeps_source() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::DbError);
        assert!(err.source().is_some());
    }
}
