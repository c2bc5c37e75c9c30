/// Post handlers - HTTP endpoints for feed operations
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::{TokenVerifier, UserId};
use crate::models::{Post, PostView};
use crate::services::PostService;
use crate::uploads::{read_form, FormData, ImagePolicy};
use crate::validation::{CommentInput, PostInput};

pub const INVALID_POST_ID: &str = "Invalid PostId";

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub status: bool,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostViewResponse {
    pub status: bool,
    pub post: PostView,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub status: bool,
    pub message: &'static str,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: bool,
    pub message: &'static str,
}

fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Unprocessable(INVALID_POST_ID.to_string()))
}

fn post_input(form: &FormData) -> PostInput {
    PostInput {
        title: form.field("title"),
        description: form.field("description"),
    }
}

/// List all posts, newest first
pub async fn get_posts(service: web::Data<PostService>) -> Result<HttpResponse> {
    let posts = service.list_posts().await?;
    Ok(HttpResponse::Ok().json(PostsResponse {
        status: true,
        posts,
    }))
}

/// Get a post by ID
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let post = service.get_post(post_id).await?;
    Ok(HttpResponse::Ok().json(PostViewResponse { status: true, post }))
}

/// Create a post from a multipart form with a required image
pub async fn create_post(
    req: HttpRequest,
    payload: web::Payload,
    service: web::Data<PostService>,
    verifier: web::Data<TokenVerifier>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let form = read_form(
        &req,
        payload,
        service.images(),
        &verifier,
        ImagePolicy::Accept,
    )
    .await?;

    let input = post_input(&form);
    let post = service.create_post(user_id.0, input, form.image).await?;

    Ok(HttpResponse::Created().json(PostResponse {
        status: true,
        message: "Created successfully",
        post,
    }))
}

/// Replace a post's title and description, and optionally its image
pub async fn update_post(
    req: HttpRequest,
    payload: web::Payload,
    service: web::Data<PostService>,
    verifier: web::Data<TokenVerifier>,
    user_id: UserId,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let form = read_form(
        &req,
        payload,
        service.images(),
        &verifier,
        ImagePolicy::Accept,
    )
    .await?;

    let input = post_input(&form);
    let post = service
        .update_post(post_id, user_id.0, input, form.image)
        .await?;

    Ok(HttpResponse::Created().json(PostResponse {
        status: true,
        message: "Updated successfully",
        post,
    }))
}

/// Toggle the caller's like on a post
pub async fn like_dislike(
    service: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let (action, post) = service.toggle_like(post_id, user_id.0).await?;

    Ok(HttpResponse::Ok().json(PostResponse {
        status: true,
        message: action.message(),
        post,
    }))
}

/// Append a comment by the caller
pub async fn add_comment(
    req: HttpRequest,
    payload: web::Payload,
    service: web::Data<PostService>,
    verifier: web::Data<TokenVerifier>,
    user_id: UserId,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let form = read_form(
        &req,
        payload,
        service.images(),
        &verifier,
        ImagePolicy::Ignore,
    )
    .await?;

    let input = CommentInput {
        comment: form.field("comment"),
    };
    let post = service.add_comment(post_id, user_id.0, input).await?;

    Ok(HttpResponse::Ok().json(PostResponse {
        status: true,
        message: "Commented",
        post,
    }))
}

/// Delete a post, its image and the owner's reference to it
pub async fn delete_post(
    service: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    service.delete_post(post_id, user_id.0).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        status: true,
        message: "Deleted Successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_id_must_be_a_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_post_id(&id.to_string()).unwrap(), id);

        match parse_post_id("64b7f0c2e1d3a4b5c6d7e8f9") {
            Err(AppError::Unprocessable(msg)) => assert_eq!(msg, INVALID_POST_ID),
            other => panic!("expected Unprocessable, got {:?}", other),
        }
    }

    #[test]
    fn missing_form_fields_become_empty_input() {
        let input = post_input(&FormData::default());
        assert!(input.title.is_empty());
        assert!(input.description.is_empty());
    }
}
