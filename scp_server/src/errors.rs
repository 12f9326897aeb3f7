use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use scp_engine::traits::{ChatGatewayError, OrderGatewayError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    OrderError(#[from] OrderGatewayError),
    #[error("{0}")]
    ChatError(#[from] ChatGatewayError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedRole(_) => StatusCode::BAD_REQUEST,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::MissingSupplierAffiliation => StatusCode::FORBIDDEN,
            },
            Self::OrderError(e) => match e {
                OrderGatewayError::OrderNotFound(_) | OrderGatewayError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                OrderGatewayError::Unauthorized(_) => StatusCode::FORBIDDEN,
                OrderGatewayError::InvalidTransition { .. } => StatusCode::CONFLICT,
                OrderGatewayError::InsufficientStock(_) => StatusCode::CONFLICT,
                OrderGatewayError::ProductSupplierMismatch { .. } |
                OrderGatewayError::BelowMinimumOrderQuantity { .. } |
                OrderGatewayError::EmptyOrderTotal |
                OrderGatewayError::ProductModificationNoOp => StatusCode::BAD_REQUEST,
                OrderGatewayError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::ChatError(e) => match e {
                ChatGatewayError::ConversationNotFound(_) | ChatGatewayError::ComplaintNotFound(_) => {
                    StatusCode::NOT_FOUND
                },
                ChatGatewayError::ResolutionTooShort { .. } => StatusCode::BAD_REQUEST,
                ChatGatewayError::ComplaintAlreadyResolved(_) => StatusCode::CONFLICT,
                ChatGatewayError::Unauthorized(_) => StatusCode::FORBIDDEN,
                ChatGatewayError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No authenticated identity was attached to the request.")]
    MissingIdentity,
    #[error("The authenticated role is not recognised. {0}")]
    PoorlyFormattedRole(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Supplier staff must carry a supplier affiliation.")]
    MissingSupplierAffiliation,
}
