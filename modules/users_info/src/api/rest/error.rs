use api_ingress::{Problem, ProblemResponse};
use axum::http::StatusCode;
use tracing::error;

use crate::domain::error::DomainError;

/// Render a domain error as problem+json. Server-side failures are logged
/// here and reach the client without their internal detail.
pub fn map_domain_error(e: &DomainError, instance: &str, request_id: &str) -> ProblemResponse {
    let problem = match e {
        DomainError::UsernameRequired | DomainError::PasswordRequired => {
            Problem::new(StatusCode::BAD_REQUEST, "USERS_VALIDATION", e.to_string())
        }
        DomainError::UsernameTaken { .. } => {
            Problem::new(StatusCode::CONFLICT, "USERS_USERNAME_TAKEN", e.to_string())
        }
        DomainError::Enrichment { .. } => {
            error!(request_id, error = %e, "user enrichment failed");
            Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "USERS_ENRICHMENT",
                "Failed to build the user list",
            )
        }
        DomainError::SourceFetch { .. }
        | DomainError::Database { .. }
        | DomainError::ConsistencyViolation { .. } => {
            error!(request_id, error = %e, "users_info internal error");
            Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "USERS_INTERNAL",
                "An internal error occurred",
            )
        }
    };

    problem.for_request(instance, request_id).into()
}
