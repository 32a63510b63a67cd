/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{NewPost, PostSearch, PostUpdate};
use crate::services::{DeletionCoordinator, PostService};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[validate(length(min = 1, max = 100, message = "author must be 1-100 characters"))]
    pub author: String,
    #[validate(length(min = 1, max = 100, message = "category must be 1-100 characters"))]
    pub category: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[validate(length(min = 1, max = 100, message = "author must be 1-100 characters"))]
    pub author: String,
    #[validate(length(min = 1, max = 100, message = "category must be 1-100 characters"))]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub content: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
}

/// Create a new post
pub async fn create_post(
    service: web::Data<PostService>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let post = service
        .create_post(NewPost {
            title: req.title.clone(),
            content: req.content.clone(),
            author: req.author.clone(),
            category: req.category.clone(),
        })
        .await?;

    Ok(HttpResponse::Created().json(post))
}

/// Get a post by ID
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match service.get_post(*post_id).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// List all posts, newest first
pub async fn get_posts(service: web::Data<PostService>) -> Result<HttpResponse> {
    let posts = service.get_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Search posts by content substring, category or author
pub async fn search_posts(
    service: web::Data<PostService>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let posts = service
        .search_posts(PostSearch {
            content: query.content.clone(),
            category: query.category.clone(),
            author: query.author.clone(),
        })
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Update a post's editable fields
pub async fn update_post(
    service: web::Data<PostService>,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let updated = service
        .update_post(
            *post_id,
            PostUpdate {
                title: req.title.clone(),
                content: req.content.clone(),
                author: req.author.clone(),
                category: req.category.clone(),
            },
        )
        .await?;

    match updated {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// Delete a post, cascading into review-service first.
///
/// Succeeds only after the dependent reviews have been purged and the local
/// row is gone; a failed purge aborts the deletion with 502 so the caller
/// can retry the whole operation.
pub async fn delete_post(
    coordinator: web::Data<DeletionCoordinator>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    coordinator.delete_post(*post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_empty_title() {
        let req = CreatePostRequest {
            title: "".to_string(),
            content: "Body".to_string(),
            author: "imalik".to_string(),
            category: "politics".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_accepts_minimal_post() {
        let req = CreatePostRequest {
            title: "t".to_string(),
            content: "c".to_string(),
            author: "a".to_string(),
            category: "news".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
