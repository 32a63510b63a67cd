/// Comment handlers - HTTP endpoints for comment operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::services::CommentService;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[validate(length(min = 1, max = 1000, message = "content must be 1-1000 characters"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "content must be 1-1000 characters"))]
    pub content: String,
}

/// Create a new comment
pub async fn create_comment(
    service: web::Data<CommentService>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let comment = service.create_comment(req.post_id, &req.content).await?;
    Ok(HttpResponse::Created().json(comment))
}

/// Get a comment by ID
pub async fn get_comment(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match service.get_comment(*comment_id).await? {
        Some(comment) => Ok(HttpResponse::Ok().json(comment)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// List all comments, newest first
pub async fn get_comments(service: web::Data<CommentService>) -> Result<HttpResponse> {
    let comments = service.get_comments().await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// List comments for a post, oldest first
pub async fn get_comments_by_post(
    service: web::Data<CommentService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comments = service.get_comments_by_post(*post_id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// Edit a comment
pub async fn update_comment(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    match service.update_comment(*comment_id, &req.content).await? {
        Some(comment) => Ok(HttpResponse::Ok().json(comment)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// Delete a comment
pub async fn delete_comment(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if service.delete_comment(*comment_id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(HttpResponse::NotFound().finish())
    }
}
