/// Data models for feed-service
///
/// This module defines structures for:
/// - User: identity record owning a list of post ids
/// - Post: feed item with image, likes and comments
/// - PostView: a post with its user references expanded for responses
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub firstname: String,
    pub email: String,
    /// Ids of posts owned by this user, in creation order
    pub posts: Vec<Uuid>,
}

impl User {
    pub fn new(id: Uuid, firstname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            firstname: firstname.into(),
            email: email.into(),
            posts: Vec::new(),
        }
    }

    pub fn add_post(&mut self, post_id: Uuid) {
        self.posts.push(post_id);
    }

    /// Returns true when the id was present.
    pub fn remove_post(&mut self, post_id: Uuid) -> bool {
        let before = self.posts.len();
        self.posts.retain(|id| *id != post_id);
        before != self.posts.len()
    }
}

/// Selected user fields rendered in place of a stored user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub firstname: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub user: Uuid,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Liked,
    Disliked,
}

impl LikeAction {
    pub fn message(self) -> &'static str {
        match self {
            LikeAction::Liked => "Liked Successfully",
            LikeAction::Disliked => "Disliked Successfully",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LikeAction::Liked => "like",
            LikeAction::Disliked => "dislike",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Path of the stored image file
    pub image: String,
    pub post_by: Uuid,
    pub like_count: i64,
    pub liked_by: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: String, description: String, image: String, post_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            image,
            post_by,
            like_count: 0,
            liked_by: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.liked_by.contains(&user_id)
    }

    /// Flip the user's like. Membership and count always move together, so
    /// `like_count == liked_by.len()` holds for any toggle sequence.
    pub fn toggle_like(&mut self, user_id: Uuid) -> LikeAction {
        let action = if self.is_liked_by(user_id) {
            self.liked_by.retain(|id| *id != user_id);
            self.like_count -= 1;
            LikeAction::Disliked
        } else {
            self.liked_by.push(user_id);
            self.like_count += 1;
            LikeAction::Liked
        };
        self.touch();
        action
    }

    pub fn add_comment(&mut self, user: Uuid, comment: String) {
        self.comments.push(Comment { user, comment });
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Every user id this post refers to, for expansion lookups.
    pub fn referenced_users(&self) -> impl Iterator<Item = Uuid> + '_ {
        std::iter::once(self.post_by).chain(self.comments.iter().map(|c| c.user))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub user: Option<UserSummary>,
    pub comment: String,
}

/// Post with `postBy` and each comment's `user` expanded. References to
/// users that no longer exist render as `null`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub post_by: Option<UserSummary>,
    pub like_count: i64,
    pub liked_by: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    pub fn expand(post: Post, users: &HashMap<Uuid, UserSummary>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            image: post.image,
            post_by: users.get(&post.post_by).cloned(),
            like_count: post.like_count,
            liked_by: post.liked_by,
            comments: post
                .comments
                .into_iter()
                .map(|c| CommentView {
                    user: users.get(&c.user).cloned(),
                    comment: c.comment,
                })
                .collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
