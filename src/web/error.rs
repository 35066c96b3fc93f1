use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::{routes::WaitlistError, types::DataParsingError};

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("waitlist error: {0}")]
    Waitlist(#[from] WaitlistError),

    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),
    #[error("json body rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::DataParsing(data_er) => (
                StatusCode::BAD_REQUEST,
                InvalidInput(data_er.client_message()),
            ),
            Error::JsonRejection(_) => (
                StatusCode::BAD_REQUEST,
                InvalidInput("Invalid request body"),
            ),
            Error::QueryRejection(_) => (
                StatusCode::BAD_REQUEST,
                InvalidInput("Invalid query parameters"),
            ),

            Error::Waitlist(WaitlistError::AlreadyOnWaitlist) => {
                (StatusCode::CONFLICT, AlreadyOnWaitlist)
            }
            Error::Waitlist(WaitlistError::Insert(er)) => {
                let (details, code) = store_diagnostics(er);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SignupFailed { details, code },
                )
            }
            Error::Waitlist(WaitlistError::Lookup(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, LookupFailed)
            }

            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// Message and SQLSTATE code reported by the database, if it reported any.
fn store_diagnostics(er: &sqlx::Error) -> (Option<String>, Option<String>) {
    match er {
        sqlx::Error::Database(db_er) => (
            Some(db_er.message().to_string()),
            db_er.code().map(|code| code.into_owned()),
        ),
        er => (Some(er.to_string()), None),
    }
}

#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("{_0}")]
    InvalidInput(&'static str),
    #[display("This email is already on the waitlist")]
    AlreadyOnWaitlist,
    #[display("Failed to join waitlist. Please try again.")]
    SignupFailed {
        details: Option<String>,
        code: Option<String>,
    },
    #[display("Failed to check email")]
    LookupFailed,
    #[display("Internal server error")]
    ServiceError,
}
