/// Post service - post creation, retrieval and editing.
///
/// Deletion is not here: it crosses a service boundary and lives in
/// [`crate::services::deletion`]. Status changes are not here either; they
/// only arrive through the review-status consumer.
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{PostRepository, RepoError};
use crate::models::{NewPost, Post, PostSearch, PostUpdate};

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_post(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let post = self.repo.create(new_post).await?;
        tracing::info!(post_id = %post.id, author = %post.author, "post created");
        Ok(post)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.repo.find_by_id(id).await
    }

    pub async fn get_posts(&self) -> Result<Vec<Post>, RepoError> {
        self.repo.list().await
    }

    pub async fn search_posts(&self, filter: PostSearch) -> Result<Vec<Post>, RepoError> {
        self.repo.search(filter).await
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        update: PostUpdate,
    ) -> Result<Option<Post>, RepoError> {
        let updated = self.repo.update(id, update).await?;
        if updated.is_some() {
            tracing::info!(post_id = %id, "post updated");
        }
        Ok(updated)
    }
}
