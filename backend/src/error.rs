use std::fmt::{Debug, Display};

use actix_web::{http::StatusCode, ResponseError};
use diesel_async::pooled_connection::deadpool::PoolError;

pub type Result<R> = core::result::Result<R, Error>;

/// Handler error: an [`eyre::Report`] plus the status it should surface
/// as. Anything without an explicit status is a 500.
pub struct Error {
    error: eyre::Report,
    status: StatusCode,
}

impl Error {
    pub fn not_found(what: impl Display) -> Self {
        Self {
            error: eyre::eyre!("no such {what}"),
            status: StatusCode::NOT_FOUND,
        }
    }
}

impl From<eyre::Report> for Error {
    fn from(error: eyre::Report) -> Self {
        Self {
            error,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PoolError> for Error {
    fn from(error: PoolError) -> Self {
        eyre::Report::new(error)
            .wrap_err("Failed to get database connection")
            .into()
    }
}

impl From<diesel::result::Error> for Error {
    fn from(error: diesel::result::Error) -> Self {
        eyre::Report::new(error).wrap_err("Database query failed").into()
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.error, f)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.error, f)
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> actix_web::HttpResponse<actix_web::body::BoxBody> {
        if self.status.is_server_error() {
            log::error!("{:?}", self.error);
        }
        actix_web::HttpResponse::new(self.status_code())
    }
}
