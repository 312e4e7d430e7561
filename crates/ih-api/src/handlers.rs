//! # ih-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! workflows. Handlers resolve the session cookie to a `User` and thread it
//! into every workflow call; a refused mutation renders the same detail
//! page with an inline banner rather than an error page.

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use chrono::Utc;
use ih_core::error::AppError;
use ih_core::models::{Comment, Image, User};
use ih_core::traits::{AuthProvider, ImageRepo, UserRepo};
use ih_services::{CommentWorkflow, DeleteOutcome, EditOutcome, ImageWorkflow, SubmitOutcome};
use ih_ui::{
    EditTemplate, ImageTemplate, ImagesTemplate, LoginTemplate, RegistrationTemplate,
    UploadTemplate,
};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::multipart::read_image_form;
use crate::session::SessionSigner;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Arc<dyn ImageRepo>,
    pub users: Arc<dyn UserRepo>,
    pub auth: Box<dyn AuthProvider>,
    pub images: ImageWorkflow,
    pub comments: CommentWorkflow,
    pub sessions: SessionSigner,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn ImageRepo>,
        users: Arc<dyn UserRepo>,
        auth: Box<dyn AuthProvider>,
        sessions: SessionSigner,
    ) -> Self {
        Self {
            images: ImageWorkflow::new(repo.clone()),
            comments: CommentWorkflow::new(repo.clone()),
            repo,
            users,
            auth,
            sessions,
        }
    }
}

/// Transport-level error wrapper around [`AppError`]. Page handlers that
/// find no session short-circuit to the login redirect instead of a 401.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    LoginRequired,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::App(err) => write!(f, "{err}"),
            ApiError::LoginRequired => write!(f, "login required"),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::LoginRequired => StatusCode::SEE_OTHER,
            ApiError::App(AppError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::App(AppError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::App(AppError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            ApiError::App(AppError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::App(AppError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::LoginRequired => see_other("/users/login"),
            ApiError::App(err) => {
                if matches!(err, AppError::Internal(_)) {
                    log::error!("request failed: {err}");
                }
                HttpResponse::build(self.status_code())
                    .content_type("text/plain")
                    .body(err.to_string())
            }
        }
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location.to_string()))
        .finish()
}

fn render<T: Template>(template: T) -> ApiResult {
    let html = template
        .render()
        .map_err(|err| AppError::Internal(format!("template rendering failed: {err}")))?;
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

fn detail_view(
    image: &Image,
    comments: &Vec<Comment>,
    edit_error: Option<&str>,
    delete_error: Option<&str>,
    username: &str,
) -> ApiResult {
    render(ImageTemplate {
        image,
        comments,
        edit_error,
        delete_error,
        username,
    })
}

/// Resolves the session cookie to a full `User`, or bounces to login.
async fn require_user(state: &AppState, req: &HttpRequest) -> Result<User, ApiError> {
    let username = state
        .sessions
        .authenticate(req)
        .ok_or(ApiError::LoginRequired)?;
    state
        .users
        .find_user_by_username(&username)
        .await?
        .ok_or(ApiError::LoginRequired)
}

#[derive(Deserialize)]
pub struct ImageIdQuery {
    #[serde(rename = "imageId")]
    image_id: Uuid,
}

#[derive(Deserialize)]
pub struct DeleteForm {
    image_id: Uuid,
}

#[derive(Deserialize)]
pub struct CommentForm {
    comment: String,
}

#[derive(Deserialize)]
pub struct CredentialsForm {
    username: String,
    password: String,
}

/// A simple entry point for "/".
pub async fn index() -> HttpResponse {
    see_other("/images")
}

/// The post-login home page: every user's images.
pub async fn list_images(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    let user = require_user(&data, &req).await?;
    let images = data.repo.list_images().await?;
    render(ImagesTemplate {
        images: &images,
        username: &user.username,
    })
}

/// The detail page: image, tags, and comments.
pub async fn show_image(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, String)>,
) -> ApiResult {
    let user = require_user(&data, &req).await?;
    let (image_id, title) = path.into_inner();
    let image = data
        .repo
        .find_image_by_id_and_title(image_id, &title)
        .await?
        .ok_or_else(|| AppError::NotFound("image".to_string(), image_id.to_string()))?;
    let comments = data.repo.list_comments(image_id).await?;
    detail_view(&image, &comments, None, None, &user.username)
}

pub async fn upload_form(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    let user = require_user(&data, &req).await?;
    render(UploadTemplate {
        username: &user.username,
    })
}

/// Orchestrates a new upload: decode the multipart form, then hand the
/// already-encoded payload to the workflow.
pub async fn create_image(
    data: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> ApiResult {
    let user = require_user(&data, &req).await?;
    let form = read_image_form(payload)
        .await
        .map_err(|err| AppError::Validation(format!("bad upload form: {err}")))?;
    data.images
        .upload(&user, &form.title, form.file_b64, &form.tags)
        .await?;
    Ok(see_other("/images"))
}

/// The edit form for owners; everyone else gets the read-only fallback.
pub async fn edit_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ImageIdQuery>,
) -> ApiResult {
    let user = require_user(&data, &req).await?;
    match data.images.begin_edit(query.image_id, &user).await? {
        EditOutcome::Editable { image, tag_line } => render(EditTemplate {
            image: &image,
            tag_line: &tag_line,
            username: &user.username,
        }),
        EditOutcome::Denied(denied) => detail_view(
            &denied.image,
            &denied.comments,
            Some(denied.message),
            None,
            &user.username,
        ),
    }
}

pub async fn edit_submit(
    data: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> ApiResult {
    let user = require_user(&data, &req).await?;
    let form = read_image_form(payload)
        .await
        .map_err(|err| AppError::Validation(format!("bad edit form: {err}")))?;
    let image_id = form
        .image_id
        .ok_or_else(|| AppError::Validation("missing image_id".to_string()))?;
    match data
        .images
        .submit_edit(image_id, &user, &form.title, form.file_b64, &form.tags)
        .await?
    {
        SubmitOutcome::Saved(image) => {
            Ok(see_other(&format!("/images/{}/{}", image.id, image.title)))
        }
        SubmitOutcome::Denied(denied) => detail_view(
            &denied.image,
            &denied.comments,
            Some(denied.message),
            None,
            &user.username,
        ),
    }
}

pub async fn delete_image(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<DeleteForm>,
) -> ApiResult {
    let user = require_user(&data, &req).await?;
    match data.images.delete(form.image_id, &user).await? {
        DeleteOutcome::Deleted => Ok(see_other("/images")),
        DeleteOutcome::Denied(denied) => detail_view(
            &denied.image,
            &denied.comments,
            None,
            Some(denied.message),
            &user.username,
        ),
    }
}

/// Appends a comment and re-renders the detail page.
pub async fn create_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, String)>,
    form: web::Form<CommentForm>,
) -> ApiResult {
    let user = require_user(&data, &req).await?;
    let (image_id, _title) = path.into_inner();
    let view = data
        .comments
        .add_comment(image_id, &user, &form.comment)
        .await?;
    detail_view(&view.image, &view.comments, None, None, &user.username)
}

pub async fn login_form(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    if data.sessions.authenticate(&req).is_some() {
        return Ok(see_other("/images"));
    }
    render(LoginTemplate { error: None })
}

pub async fn login_submit(
    data: web::Data<AppState>,
    form: web::Form<CredentialsForm>,
) -> ApiResult {
    let user = data.users.find_user_by_username(&form.username).await?;
    let verified = user
        .as_ref()
        .map(|user| data.auth.verify_password(&form.password, &user.password_hash))
        .unwrap_or(false);
    if !verified {
        log::warn!("failed login attempt for {:?}", form.username);
        return render(LoginTemplate {
            error: Some("Invalid username or password"),
        });
    }
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/images"))
        .cookie(data.sessions.issue(&form.username))
        .finish())
}

pub async fn registration_form() -> ApiResult {
    render(RegistrationTemplate { error: None })
}

pub async fn registration_submit(
    data: web::Data<AppState>,
    form: web::Form<CredentialsForm>,
) -> ApiResult {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return render(RegistrationTemplate {
            error: Some("Username and password are required"),
        });
    }
    let password_hash = data.auth.hash_password(&form.password)?;
    let user = User {
        id: Uuid::now_v7(),
        username: username.to_string(),
        password_hash,
        created_at: Utc::now(),
    };
    match data.users.insert_user(user).await {
        Ok(_) => Ok(see_other("/users/login")),
        Err(AppError::Conflict(_)) => render(RegistrationTemplate {
            error: Some("That username is already taken"),
        }),
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", "/users/login"))
        .cookie(data.sessions.clear())
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use ih_core::traits::{MockAuthProvider, MockImageRepo, MockUserRepo};

    fn state(users: MockUserRepo, auth: MockAuthProvider) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Arc::new(MockImageRepo::new()),
            Arc::new(users),
            Box::new(auth),
            SessionSigner::new(b"test-secret"),
        ))
    }

    #[actix_web::test]
    async fn anonymous_visitor_is_bounced_to_login() {
        let data = state(MockUserRepo::new(), MockAuthProvider::new());
        let app = test::init_service(
            App::new()
                .app_data(data)
                .route("/images", web::get().to(list_images)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/images").to_request())
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get("Location").unwrap().to_str().unwrap(),
            "/users/login"
        );
    }

    #[actix_web::test]
    async fn successful_login_sets_the_session_cookie() {
        let mut users = MockUserRepo::new();
        users
            .expect_find_user_by_username()
            .withf(|name| name == "alice")
            .returning(|_| {
                Ok(Some(User {
                    id: Uuid::now_v7(),
                    username: "alice".to_string(),
                    password_hash: "$argon2id$stub".to_string(),
                    created_at: Utc::now(),
                }))
            });
        let mut auth = MockAuthProvider::new();
        auth.expect_verify_password().returning(|_, _| true);

        let data = state(users, auth);
        let app = test::init_service(
            App::new()
                .app_data(data)
                .route("/users/login", web::post().to(login_submit)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/users/login")
                .set_form([("username", "alice"), ("password", "hunter2")])
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let cookies: Vec<_> = resp.response().cookies().collect();
        assert!(cookies.iter().any(|c| c.name() == crate::session::SESSION_COOKIE));
    }

    #[actix_web::test]
    async fn wrong_password_re_renders_the_login_form() {
        let mut users = MockUserRepo::new();
        users.expect_find_user_by_username().returning(|_| {
            Ok(Some(User {
                id: Uuid::now_v7(),
                username: "alice".to_string(),
                password_hash: "$argon2id$stub".to_string(),
                created_at: Utc::now(),
            }))
        });
        let mut auth = MockAuthProvider::new();
        auth.expect_verify_password().returning(|_, _| false);

        let data = state(users, auth);
        let app = test::init_service(
            App::new()
                .app_data(data)
                .route("/users/login", web::post().to(login_submit)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/users/login")
                .set_form([("username", "alice"), ("password", "wrong")])
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("Invalid username or password"));
    }
}
