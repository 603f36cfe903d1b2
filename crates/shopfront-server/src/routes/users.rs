//! Account routes: registration, sessions, password recovery, profile and
//! the administrator's user directory.

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use shopfront_auth::{LoginOutput, ProfileUpdate, RegisterInput};
use shopfront_core::models::user::User;
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extract::{
    ACCESS_COOKIE, AdminUser, ApiJson, ApiPath, ApiQuery, CurrentUser, PageQuery, REFRESH_COOKIE,
};
use crate::response::{Envelope, Page};
use crate::state::AppState;
use crate::upload::{self, ApiMultipart, MultipartForm, UPLOAD_BODY_LIMIT};

const AVATAR_FIELD: &str = "avatar";
const AVATAR_FOLDER: &str = "avatars";
const COOKIE_MAX_AGE_DAYS: i64 = 3;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(register).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh/accessToken", post(refresh))
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset/{token}", post(reset_password))
        .route("/profile", get(profile))
        .route(
            "/profile/update",
            post(update_profile).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/password/update", post(change_password))
        .route("/admin/users", get(list_users))
        .route(
            "/admin/user/{user_id}",
            get(get_user).put(update_role).delete(delete_user),
        )
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
struct LoginRequest {
    #[validate(length(min = 1, message = "Please provide email and password"))]
    email: String,
    #[validate(length(min = 1, message = "Please provide email and password"))]
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Please provide password and confirmPassword"))]
    password: String,
    #[validate(length(min = 1, message = "Please provide password and confirmPassword"))]
    confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
    confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RoleRequest {
    role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    user: User,
    access_token: String,
    refresh_token: String,
}

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(COOKIE_MAX_AGE_DAYS))
        .build()
}

fn start_session(state: &AppState, jar: CookieJar, output: LoginOutput) -> (CookieJar, Session) {
    let secure = state.web.secure_cookies;
    let jar = jar
        .add(auth_cookie(ACCESS_COOKIE, output.access_token.clone(), secure))
        .add(auth_cookie(REFRESH_COOKIE, output.refresh_token.clone(), secure));
    (
        jar,
        Session {
            user: output.user,
            access_token: output.access_token,
            refresh_token: output.refresh_token,
        },
    )
}

async fn register(
    State(state): State<AppState>,
    multipart: ApiMultipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = MultipartForm::read(multipart, AVATAR_FIELD, 1).await?;
    let (Some(full_name), Some(email), Some(password)) = (
        form.text("fullName"),
        form.text("email"),
        form.text("password"),
    ) else {
        return Err(ApiError::bad_request("All fields are required"));
    };

    let avatar = match form.files.pop() {
        Some(file) => Some(state.media.store(AVATAR_FOLDER, file).await?),
        None => None,
    };
    let input = RegisterInput {
        full_name,
        email,
        phone: form.text("phone"),
        password,
        avatar: avatar.clone(),
    };

    match state.auth.register(input).await {
        Ok(user) => Ok(Envelope::created(user, "User registered successfully")),
        Err(e) => {
            upload::discard(state.media.as_ref(), avatar.as_slice()).await;
            Err(e.into())
        }
    }
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    let output = state.auth.login(&body.email, &body.password).await?;
    let (jar, session) = start_session(&state, jar, output);
    Ok((jar, Envelope::ok(session, "User logged in successfully")))
}

async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.logout(user.id).await?;
    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((jar, Envelope::empty("User logged out successfully")))
}

async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let from_cookie = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let token = match from_cookie {
        Some(token) => token,
        None if body.is_empty() => String::new(),
        None => serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?
            .refresh_token
            .unwrap_or_default(),
    };

    let output = state.auth.refresh(&token).await?;
    let (jar, session) = start_session(&state, jar, output);
    Ok((jar, Envelope::ok(session, "Access token refreshed")))
}

async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    if let Some(reset) = state.auth.request_password_reset(&body.email).await? {
        let url = format!(
            "{}/reset/{}",
            state.web.frontend_url.trim_end_matches('/'),
            reset.raw_token
        );
        if let Err(e) = state.mailer.send_password_reset(&reset.user, &url).await {
            error!(user_id = %reset.user.id, error = %e, "Password reset email failed");
        }
    }
    Ok(Envelope::empty(
        "If an account exists for that email, a password reset link has been sent",
    ))
}

async fn reset_password(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    state
        .auth
        .reset_password(&token, &body.password, &body.confirm_password)
        .await?;
    Ok(Envelope::empty("Password reset successfully"))
}

async fn profile(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Envelope::ok(user, "User fetched successfully")
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: ApiMultipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = MultipartForm::read(multipart, AVATAR_FIELD, 1).await?;
    let avatar = match form.files.pop() {
        Some(file) => Some(state.media.store(AVATAR_FOLDER, file).await?),
        None => None,
    };
    let update = ProfileUpdate {
        full_name: form.text("fullName"),
        email: form.text("email"),
        phone: form.text("phone"),
        avatar: avatar.clone(),
    };

    match state.accounts.update_profile(user.id, update).await {
        Ok((user, replaced)) => {
            upload::discard(state.media.as_ref(), replaced.as_slice()).await;
            Ok(Envelope::ok(user, "Profile updated successfully"))
        }
        Err(e) => {
            upload::discard(state.media.as_ref(), avatar.as_slice()).await;
            Err(e.into())
        }
    }
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .change_password(
            user.id,
            &body.old_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await?;
    Ok(Envelope::empty("Password updated successfully"))
}

async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .accounts
        .list_users(query.default_pagination())
        .await?;
    Ok(Envelope::ok(Page::from(users), "Users fetched successfully"))
}

async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.get_user(user_id).await?;
    Ok(Envelope::ok(user, "User fetched successfully"))
}

async fn update_role(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .accounts
        .update_role(user_id, body.role.as_deref())
        .await?;
    Ok(Envelope::ok(user, "User role updated successfully"))
}

async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.delete_user(user_id).await?;
    upload::discard(state.media.as_ref(), user.avatar.as_slice()).await;
    Ok(Envelope::ok(user, "User deleted successfully"))
}
