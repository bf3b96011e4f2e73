use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use thiserror::Error;

use crate::{data_objects::JsonResponse, dispatcher::DispatchError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    AuthenticationError(#[from] AuthRejection),
    #[error("customerId required")]
    MissingCustomerId,
    #[error("Invalid enable flag. {0}")]
    InvalidEnableFlag(String),
    #[error("Method {0} is not allowed")]
    MethodNotAllowed(String),
    #[error("Upstream error. {0}")]
    UpstreamError(String),
    #[error("{0}")]
    DomainUserError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationError(e) => e.status_code(),
            Self::MissingCustomerId => StatusCode::BAD_REQUEST,
            Self::InvalidEnableFlag(_) => StatusCode::BAD_REQUEST,
            Self::DomainUserError(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Self::MethodNotAllowed(_) = self {
            response.insert_header((header::ALLOW, "GET, POST, OPTIONS"));
        }
        response.json(JsonResponse::failure(self))
    }
}

impl From<DispatchError> for ServerError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Upstream(s) => Self::UpstreamError(s),
            DispatchError::DomainUser(s) => Self::DomainUserError(s),
        }
    }
}

/// Why a request failed authentication. Messages are short and never contain request or secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("Bad signature")]
    BadSignature,
    #[error("Bad session token")]
    BadSessionToken,
    #[error("No credential")]
    NoCredential,
    #[error("Wrong shop")]
    WrongShop,
    #[error("Stale request")]
    StaleRequest,
}

impl AuthRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadSignature | Self::BadSessionToken | Self::NoCredential => StatusCode::UNAUTHORIZED,
            Self::WrongShop | Self::StaleRequest => StatusCode::BAD_REQUEST,
        }
    }
}

/// Session token failures. These are only ever logged; callers see [`AuthRejection::BadSessionToken`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is not a bearer token.")]
    NotABearerToken,
    #[error("Session token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Session token algorithm {0} is not accepted.")]
    UnsupportedAlgorithm(String),
    #[error("Session token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Session token has expired. {0}")]
    ExpiredToken(String),
}
