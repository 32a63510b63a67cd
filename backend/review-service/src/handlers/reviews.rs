/// Review handlers - HTTP endpoints for review operations
use actix_web::{web, HttpResponse};
use event_schema::ReviewStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{NewReview, ReviewUpdate};
use crate::services::ReviewService;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub post_id: Uuid,
    pub reviewer_id: Uuid,
    /// One of draft, published, pending, rejected, approved
    pub status: String,
    #[validate(length(max = 1000, message = "comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    pub post_id: Uuid,
    pub reviewer_id: Uuid,
    pub status: String,
    #[validate(length(max = 1000, message = "comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub deleted: u64,
}

fn parse_status(raw: &str) -> Result<ReviewStatus> {
    raw.parse::<ReviewStatus>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Record a review decision
pub async fn create_review(
    service: web::Data<ReviewService>,
    req: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let status = parse_status(&req.status)?;

    let review = service
        .create_review(NewReview {
            post_id: req.post_id,
            reviewer_id: req.reviewer_id,
            status,
            comment: req.comment.clone(),
        })
        .await?;

    Ok(HttpResponse::Created().json(review))
}

/// Get a review by ID
pub async fn get_review(
    service: web::Data<ReviewService>,
    review_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match service.get_review(*review_id).await? {
        Some(review) => Ok(HttpResponse::Ok().json(review)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// List all reviews, newest decisions first
pub async fn get_reviews(service: web::Data<ReviewService>) -> Result<HttpResponse> {
    let reviews = service.get_reviews().await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// Re-decide an existing review
pub async fn update_review(
    service: web::Data<ReviewService>,
    review_id: web::Path<Uuid>,
    req: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let status = parse_status(&req.status)?;

    let updated = service
        .update_review(
            *review_id,
            ReviewUpdate {
                post_id: req.post_id,
                reviewer_id: req.reviewer_id,
                status,
                comment: req.comment.clone(),
            },
        )
        .await?;

    match updated {
        Some(review) => Ok(HttpResponse::Ok().json(review)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// Delete a single review
pub async fn delete_review(
    service: web::Data<ReviewService>,
    review_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if service.delete_review(*review_id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(HttpResponse::NotFound().finish())
    }
}

/// List reviews for a post
pub async fn get_reviews_by_post(
    service: web::Data<ReviewService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let reviews = service.get_reviews_by_post(*post_id).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// List reviews with a given outcome
pub async fn get_reviews_by_status(
    service: web::Data<ReviewService>,
    status: web::Path<String>,
) -> Result<HttpResponse> {
    let status = parse_status(&status)?;
    let reviews = service.get_reviews_by_status(status).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// Purge every review for a post.
///
/// Called by post-service while cascading a post deletion. Idempotent:
/// purging an already-empty set reports zero deletions and succeeds.
pub async fn delete_reviews_by_post(
    service: web::Data<ReviewService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let deleted = service.delete_reviews_by_post(*post_id).await?;
    Ok(HttpResponse::Ok().json(PurgeResponse { deleted }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_outside_closed_set_is_bad_request() {
        assert!(matches!(
            parse_status("archived"),
            Err(AppError::BadRequest(_))
        ));
        assert!(parse_status("approved").is_ok());
    }

    #[test]
    fn test_over_long_comment_is_rejected() {
        let req = CreateReviewRequest {
            post_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            status: "pending".to_string(),
            comment: Some("x".repeat(1001)),
        };
        assert!(req.validate().is_err());
    }
}
