use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use set_store::StoreError;
use thiserror::Error;

use crate::models::Feeling;

pub type Result<T> = std::result::Result<T, RecommenderError>;

#[derive(Debug, Error)]
pub enum RecommenderError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("User {user_id} already {existing} item {item_id}; remove that rating first")]
    ConflictingRating {
        user_id: String,
        item_id: String,
        existing: Feeling,
    },

    #[error("Invalid id: {0}")]
    InvalidId(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for RecommenderError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        HttpResponse::build(code).json(ErrorResponse {
            error: self.to_string(),
            code: code.as_u16(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            RecommenderError::ConflictingRating { .. } => StatusCode::CONFLICT,
            RecommenderError::InvalidId(_) => StatusCode::BAD_REQUEST,
            RecommenderError::Store(StoreError::InvalidScore { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RecommenderError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let conflict = RecommenderError::ConflictingRating {
            user_id: "u".into(),
            item_id: "i".into(),
            existing: Feeling::Disliked,
        };
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            RecommenderError::InvalidId(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RecommenderError::Store(StoreError::Connection("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_conflict_message_names_existing_rating() {
        let err = RecommenderError::ConflictingRating {
            user_id: "chris".into(),
            item_id: "batman".into(),
            existing: Feeling::Liked,
        };
        assert_eq!(
            err.to_string(),
            "User chris already liked item batman; remove that rating first"
        );
    }
}
