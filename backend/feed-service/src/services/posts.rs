/// Post service - feed operations over the store and the image directory
///
/// Every operation is a plain load-modify-save against the store. There are
/// no transactions: two concurrent toggles on one post can lose an update.
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::FeedStore;
use crate::error::{AppError, Result};
use crate::metrics::{self, LIKE_TOGGLES_TOTAL};
use crate::models::{LikeAction, Post, PostView, User};
use crate::uploads::{ImageStore, StoredImage};
use crate::validation::{CommentInput, PostInput};

pub const NO_POST_FOUND: &str = "No post found";
pub const NO_USER_FOUND: &str = "No user found";
pub const IMAGE_REQUIRED: &str = "Image is required or invalid file extension";
pub const NOT_POST_OWNER: &str = "Not authorized to modify this post";

pub struct PostService {
    store: Arc<dyn FeedStore>,
    images: ImageStore,
}

impl PostService {
    pub fn new(store: Arc<dyn FeedStore>, images: ImageStore) -> Self {
        Self { store, images }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn store(&self) -> &Arc<dyn FeedStore> {
        &self.store
    }

    /// All posts, newest first, with user references expanded
    pub async fn list_posts(&self) -> Result<Vec<PostView>> {
        let mut posts = self.store.list_posts().await?;
        posts.reverse();
        self.expand(posts).await
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<PostView> {
        let post = self.load_post(post_id).await?;
        let mut views = self.expand(vec![post]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("expansion dropped a post".to_string()))
    }

    pub async fn create_post(
        &self,
        user_id: Uuid,
        input: PostInput,
        image: Option<StoredImage>,
    ) -> Result<Post> {
        let result = self.create_post_inner(user_id, input, image).await;
        metrics::record_operation("create", result.is_ok());
        result
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        input: PostInput,
        image: Option<StoredImage>,
    ) -> Result<Post> {
        let result = self.update_post_inner(post_id, user_id, input, image).await;
        metrics::record_operation("update", result.is_ok());
        result
    }

    pub async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = self.delete_post_inner(post_id, user_id).await;
        metrics::record_operation("delete", result.is_ok());
        result
    }

    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(LikeAction, Post)> {
        let mut post = self.load_post(post_id).await?;
        let action = post.toggle_like(user_id);
        self.store.save_post(&post).await?;

        LIKE_TOGGLES_TOTAL.with_label_values(&[action.as_str()]).inc();
        tracing::info!(post_id = %post_id, user_id = %user_id, action = action.as_str(), "like toggled");
        Ok((action, post))
    }

    pub async fn add_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        input: CommentInput,
    ) -> Result<Post> {
        let input = input.sanitized()?;
        let mut post = self.load_post(post_id).await?;
        post.add_comment(user_id, input.comment);
        self.store.save_post(&post).await?;

        tracing::info!(post_id = %post_id, user_id = %user_id, "comment added");
        Ok(post)
    }

    async fn create_post_inner(
        &self,
        user_id: Uuid,
        input: PostInput,
        image: Option<StoredImage>,
    ) -> Result<Post> {
        let input = self.or_abandon(image.as_ref(), input.sanitized()).await?;
        let image = image.ok_or_else(|| AppError::Unprocessable(IMAGE_REQUIRED.to_string()))?;

        let lookup = self.find_owner(user_id).await;
        let mut owner = self.or_abandon(Some(&image), lookup).await?;

        let post = Post::new(input.title, input.description, image.path.clone(), user_id);
        let inserted = self.store.insert_post(&post).await.map_err(AppError::from);
        self.or_abandon(Some(&image), inserted).await?;

        owner.add_post(post.id);
        if let Err(e) = self.store.save_user(&owner).await {
            tracing::error!(
                post_id = %post.id,
                user_id = %user_id,
                error = %e,
                "post stored but owner's post list not updated"
            );
            return Err(e.into());
        }

        tracing::info!(post_id = %post.id, user_id = %user_id, image = %post.image, "post created");
        Ok(post)
    }

    async fn find_owner(&self, user_id: Uuid) -> Result<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_USER_FOUND.to_string()))
    }

    async fn update_post_inner(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        input: PostInput,
        image: Option<StoredImage>,
    ) -> Result<Post> {
        let prepared = self.prepare_update(post_id, user_id, input).await;
        let (input, mut post) = self.or_abandon(image.as_ref(), prepared).await?;

        let replaced = image
            .as_ref()
            .map(|new_image| std::mem::replace(&mut post.image, new_image.path.clone()));

        post.title = input.title;
        post.description = input.description;
        post.touch();
        let saved = self.store.save_post(&post).await.map_err(AppError::from);
        self.or_abandon(image.as_ref(), saved).await?;

        // The old file goes only once the record points at the new one
        if let Some(old_image) = replaced {
            self.remove_image(&old_image).await;
        }

        tracing::info!(post_id = %post_id, user_id = %user_id, "post updated");
        Ok(post)
    }

    async fn prepare_update(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        input: PostInput,
    ) -> Result<(PostInput, Post)> {
        let input = input.sanitized()?;
        let post = self.load_post(post_id).await?;
        ensure_owner(&post, user_id)?;
        Ok((input, post))
    }

    async fn delete_post_inner(&self, post_id: Uuid, user_id: Uuid) -> Result<()> {
        let post = self.load_post(post_id).await?;
        ensure_owner(&post, user_id)?;

        self.remove_image(&post.image).await;
        if !self.store.delete_post(post_id).await? {
            tracing::warn!(post_id = %post_id, "post vanished before delete");
        }

        match self.store.find_user(post.post_by).await? {
            Some(mut owner) => {
                owner.remove_post(post_id);
                self.store.save_user(&owner).await?;
            }
            None => {
                tracing::warn!(post_id = %post_id, owner = %post.post_by, "post owner missing; nothing to unlink");
            }
        }

        tracing::info!(post_id = %post_id, user_id = %user_id, "post deleted");
        Ok(())
    }

    async fn load_post(&self, post_id: Uuid) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_POST_FOUND.to_string()))
    }

    async fn expand(&self, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let ids: Vec<Uuid> = posts
            .iter()
            .flat_map(|p| p.referenced_users())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users = self.store.find_user_summaries(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| PostView::expand(post, &users))
            .collect())
    }

    /// Delete a stored image before the response goes out. A failure is
    /// logged and the surrounding database change still goes ahead.
    async fn remove_image(&self, path: &str) {
        if let Err(e) = self.images.remove(path).await {
            tracing::error!(path = %path, error = %e, "failed to delete image file");
        }
    }

    /// Pass `result` through, discarding a freshly stored upload if it failed.
    async fn or_abandon<T>(&self, image: Option<&StoredImage>, result: Result<T>) -> Result<T> {
        if let (Err(_), Some(image)) = (&result, image) {
            self.images.discard(image).await;
        }
        result
    }
}

fn ensure_owner(post: &Post, user_id: Uuid) -> Result<()> {
    if post.post_by != user_id {
        tracing::warn!(post_id = %post.id, user_id = %user_id, "rejected write by non-owner");
        return Err(AppError::Forbidden(NOT_POST_OWNER.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::faulty::FaultyStore;
    use std::path::Path;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    struct Fixture {
        store: Arc<FaultyStore>,
        service: PostService,
        _dir: TempDir,
    }

    async fn fixture() -> (Fixture, User) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FaultyStore::default());
        let images = ImageStore::new(dir.path().join("images"), 1024);
        let shared: Arc<dyn FeedStore> = store.clone();
        let service = PostService::new(shared, images);

        let owner = User::new(Uuid::new_v4(), "Ada", "ada@example.com");
        store.save_user(&owner).await.unwrap();

        (
            Fixture {
                store,
                service,
                _dir: dir,
            },
            owner,
        )
    }

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            description: "d".repeat(120),
        }
    }

    async fn upload(service: &PostService, name: &str) -> StoredImage {
        service.images().persist(name, b"\x89PNG").await.unwrap()
    }

    #[tokio::test]
    async fn failed_update_keeps_old_image_and_discards_new_one() {
        let (fx, owner) = fixture().await;
        let old = upload(&fx.service, "old.png").await;
        let post = fx
            .service
            .create_post(owner.id, input("First title"), Some(old.clone()))
            .await
            .unwrap();

        fx.store.fail_save_post.store(true, Ordering::SeqCst);
        let new = upload(&fx.service, "new.png").await;
        let result = fx
            .service
            .update_post(post.id, owner.id, input("Second title"), Some(new.clone()))
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(Path::new(&old.path).exists());
        assert!(!Path::new(&new.path).exists());

        let stored = fx.store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(stored.image, old.path);
        assert_eq!(stored.title, "First title");
    }

    #[tokio::test]
    async fn successful_update_swaps_image_files() {
        let (fx, owner) = fixture().await;
        let old = upload(&fx.service, "old.png").await;
        let post = fx
            .service
            .create_post(owner.id, input("First title"), Some(old.clone()))
            .await
            .unwrap();

        let new = upload(&fx.service, "new.png").await;
        let updated = fx
            .service
            .update_post(post.id, owner.id, input("Second title"), Some(new.clone()))
            .await
            .unwrap();

        assert_eq!(updated.image, new.path);
        assert!(!Path::new(&old.path).exists());
        assert!(Path::new(&new.path).exists());
    }

    #[tokio::test]
    async fn owner_save_failure_surfaces_as_server_error() {
        let (fx, owner) = fixture().await;
        fx.store.fail_save_user.store(true, Ordering::SeqCst);

        let image = upload(&fx.service, "photo.png").await;
        let result = fx
            .service
            .create_post(owner.id, input("First title"), Some(image))
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        // The post row stays; the owner's list is left behind
        assert_eq!(fx.store.inner.post_count().await, 1);
        assert!(fx.store.find_user(owner.id).await.unwrap().unwrap().posts.is_empty());
    }
}
