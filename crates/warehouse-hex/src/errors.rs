//! Transport-agnostic error taxonomy and its two status projections.
//!
//! Everything the core can fail with is an [`AppError`]: a closed kind, a
//! caller-facing message and an optional internal cause that never reaches
//! the wire. The HTTP and RPC status vocabularies appear here and nowhere
//! else; orchestrators and the aggregate compare errors by kind, not text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warehouse_types::domain::order::OrderError;
use warehouse_types::domain::user::UserError;
use warehouse_types::ports::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    Database,
    Internal,
}

/// Status codes of the RPC transport, using the gRPC vocabulary. Kept as a
/// local enum so the core stays independent of any particular RPC framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcCode {
    Ok,
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    FailedPrecondition,
    Internal,
}

#[derive(Error, Debug)]
#[error("{kind:?}: {message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    cause: Option<anyhow::Error>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attaches an internal cause. The cause is logged server-side but
    /// never serialized into a caller-facing payload.
    pub fn with_cause(mut self, cause: anyhow::Error) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Database | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn rpc_code(&self) -> RpcCode {
        match self.kind {
            ErrorKind::Validation => RpcCode::InvalidArgument,
            ErrorKind::NotFound => RpcCode::NotFound,
            ErrorKind::Unauthorized => RpcCode::Unauthenticated,
            ErrorKind::Forbidden => RpcCode::PermissionDenied,
            ErrorKind::Conflict => RpcCode::FailedPrecondition,
            ErrorKind::Database | ErrorKind::Internal => RpcCode::Internal,
        }
    }

    /// Emits the error at its kind's default severity, including the
    /// internal cause when present.
    pub fn log(&self) {
        let cause = self
            .cause
            .as_ref()
            .map(|c| format!("{c:#}"))
            .unwrap_or_default();
        match self.kind {
            ErrorKind::Database | ErrorKind::Internal => {
                tracing::error!(kind = ?self.kind, message = %self.message, %cause, "request failed");
            }
            ErrorKind::Unauthorized | ErrorKind::Forbidden => {
                tracing::warn!(kind = ?self.kind, message = %self.message, %cause, "request denied");
            }
            _ => {
                tracing::debug!(kind = ?self.kind, message = %self.message, %cause, "request rejected");
            }
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyItems | OrderError::ZeroQuantity => {
                Self::validation(err.to_string())
            }
            OrderError::TotalOverflow => {
                Self::internal("order total out of range").with_cause(anyhow::anyhow!(err))
            }
            OrderError::InvalidTransition { .. } | OrderError::NotEditable(_) => {
                Self::conflict(err.to_string())
            }
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(detail) => {
                Self::database("storage error").with_cause(anyhow::anyhow!(detail))
            }
            StoreError::Rejected(domain) => domain.into(),
            StoreError::DuplicateLogin(login) => {
                Self::conflict(format!("login already taken: {login}"))
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.http_status();
        let message = match self.kind {
            // Internal detail stays out of 500 bodies.
            ErrorKind::Database | ErrorKind::Internal => "internal error".to_string(),
            _ => self.message,
        };
        let body = serde_json::to_string(&ErrorBody { error: message })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (status, [("content-type", "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warehouse_types::domain::order::OrderStatus;

    #[test]
    fn http_projection_covers_every_kind() {
        let cases = [
            (ErrorKind::Validation, StatusCode::BAD_REQUEST),
            (ErrorKind::Unauthorized, StatusCode::UNAUTHORIZED),
            (ErrorKind::Forbidden, StatusCode::FORBIDDEN),
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Conflict, StatusCode::CONFLICT),
            (ErrorKind::Database, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(AppError::new(kind, "x").http_status(), status);
        }
    }

    #[test]
    fn rpc_projection_covers_every_kind() {
        let cases = [
            (ErrorKind::Validation, RpcCode::InvalidArgument),
            (ErrorKind::Unauthorized, RpcCode::Unauthenticated),
            (ErrorKind::Forbidden, RpcCode::PermissionDenied),
            (ErrorKind::NotFound, RpcCode::NotFound),
            (ErrorKind::Conflict, RpcCode::FailedPrecondition),
            (ErrorKind::Database, RpcCode::Internal),
            (ErrorKind::Internal, RpcCode::Internal),
        ];
        for (kind, code) in cases {
            assert_eq!(AppError::new(kind, "x").rpc_code(), code);
        }
    }

    #[test]
    fn domain_rejections_map_to_kinds_structurally() {
        let conflict: AppError = OrderError::InvalidTransition {
            from: OrderStatus::Executed,
            to: OrderStatus::Active,
        }
        .into();
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let validation: AppError = OrderError::EmptyItems.into();
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let internal: AppError = OrderError::TotalOverflow.into();
        assert_eq!(internal.kind(), ErrorKind::Internal);
    }

    #[test]
    fn store_backend_failures_become_database_kind() {
        let err: AppError = StoreError::Backend("disk on fire".into()).into();
        assert_eq!(err.kind(), ErrorKind::Database);
        // The backend detail is a cause, not a caller-facing message.
        assert_eq!(err.message(), "storage error");
    }
}
