use crate::{
    AppState,
    auth::{
        ActiveUser, ActiveVerifiedUser, AuthUser, Superuser, clear_session_cookie, hash_password,
        session_cookie,
    },
    error::{ApiError, AuthError, RepoError},
    extract::{ApiForm, ApiJson, ApiPath},
    models::{
        CreateItemRequest, DeleteItemResponse, ErrorBody, ForgotPasswordRequest, Item, LoginForm,
        RegisterUserRequest, ResetPasswordRequest, UpdateMeRequest, UpdateUserRequest, UserRead,
    },
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

const MIN_PASSWORD_CHARS: usize = 3;

fn password_is_acceptable(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
}

fn email_is_plausible(email: &str) -> bool {
    email.contains('@')
}

// --- Item Handlers ---

/// create_item
///
/// [Verified Route] Stores a new item. The guard runs before the body is parsed, so an
/// unauthenticated request never reaches validation or the store.
#[utoipa::path(
    post,
    path = "/items/",
    tag = "items",
    request_body = CreateItemRequest,
    responses(
        (status = 200, description = "Created", body = Item),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 403, description = "Not active and verified", body = ErrorBody),
        (status = 422, description = "Malformed body", body = ErrorBody)
    )
)]
pub async fn create_item(
    ActiveVerifiedUser(user): ActiveVerifiedUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let item = state.repo.create_item(payload).await?;
    tracing::info!(item_id = item.id, user_id = %user.id, "item created");
    Ok(Json(item))
}

/// delete_item
///
/// [Superuser Route] Removes an item. Idempotent: an unknown id gets the same
/// acknowledgement as an existing one.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    params(("id" = i64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Deleted (or already absent)", body = DeleteItemResponse),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 403, description = "Not an active superuser", body = ErrorBody)
    )
)]
pub async fn delete_item(
    Superuser(user): Superuser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DeleteItemResponse>, ApiError> {
    let removed = state.repo.delete_item(id).await?;
    tracing::info!(item_id = id, removed, user_id = %user.id, "item delete requested");
    Ok(Json(DeleteItemResponse::deleted()))
}

/// get_item
///
/// [Public Route] Fetches one item, or 404 when the id is unknown.
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(("id" = i64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Found", body = Item),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Item>, ApiError> {
    match state.repo.get_item(id).await? {
        Some(item) => Ok(Json(item)),
        None => Err(ApiError::not_found("Item", id)),
    }
}

/// list_items
///
/// [Public Route] Lists every item in insertion order.
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    responses((status = 200, description = "All items", body = [Item]))
)]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.repo.list_items().await?))
}

// --- Auth Handlers ---

/// register_user
///
/// [Public Route] Creates an active, unverified, non-superuser account.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserRead),
        (status = 400, description = "Email already registered", body = ErrorBody),
        (status = 422, description = "Invalid email or password", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserRead>), ApiError> {
    if !email_is_plausible(&payload.email) {
        return Err(ApiError::validation("email must contain '@'"));
    }
    if !password_is_acceptable(&payload.password) {
        return Err(ApiError::validation(
            "password must be at least 3 characters",
        ));
    }

    let user = state
        .identity
        .register(&payload.email, &payload.password, false, false)
        .await
        .map_err(|e| match e {
            AuthError::Repository(RepoError::Conflict(_)) => {
                ApiError::BadRequest("REGISTER_USER_ALREADY_EXISTS".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}

/// login
///
/// [Public Route] Verifies form credentials and sets the session cookie.
/// Unknown email, wrong password and inactive account all give the same 400.
#[utoipa::path(
    post,
    path = "/auth/jwt/login",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 204, description = "Logged in; session cookie set"),
        (status = 400, description = "Bad credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .identity
        .authenticate(&form.username, &form.password)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::BadRequest("LOGIN_BAD_CREDENTIALS".to_string()))?;

    let token = state.identity.issue(user.id)?;
    let cookie = session_cookie(&state.config, &token)?;

    tracing::info!(user_id = %user.id, "session issued");
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// logout
///
/// [Authenticated Route] Clears the session cookie. Tokens are stateless, so this only
/// instructs the client to drop it.
#[utoipa::path(
    post,
    path = "/auth/jwt/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Cookie cleared"),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn logout(
    ActiveUser(_user): ActiveUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let cookie = clear_session_cookie(&state.config)?;
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// forgot_password
///
/// [Public Route] Starts a password reset. The reset token is written to the log in place
/// of an e-mail. The answer is 202 whether or not the account exists, so the endpoint
/// does not reveal which emails are registered.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Accepted"),
        (status = 422, description = "Invalid email", body = ErrorBody)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if !email_is_plausible(&payload.email) {
        return Err(ApiError::validation("email must contain '@'"));
    }

    match state.repo.get_user_by_email(&payload.email).await? {
        Some(user) if user.is_active => {
            let token = state.identity.issue_reset_token(&user)?;
            tracing::info!(user_id = %user.id, reset_token = %token, "password reset requested");
        }
        _ => tracing::debug!("password reset requested for unknown or inactive account"),
    }

    Ok(StatusCode::ACCEPTED)
}

/// reset_password
///
/// [Public Route] Redeems a reset token. Any token problem (forged, expired, already used,
/// inactive account) gives the same 400.
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Bad token or unacceptable password", body = ErrorBody)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if !password_is_acceptable(&payload.password) {
        return Err(ApiError::BadRequest(
            "RESET_PASSWORD_INVALID_PASSWORD".to_string(),
        ));
    }

    let user = state
        .identity
        .reset_password(&payload.token, &payload.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::UnknownUser => {
                ApiError::BadRequest("RESET_PASSWORD_BAD_TOKEN".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "password reset");
    Ok(StatusCode::OK)
}

// --- User Handlers ---

/// get_me
///
/// [Authenticated Route] The caller's own account.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Profile", body = UserRead),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn get_me(ActiveUser(user): ActiveUser) -> Json<UserRead> {
    let AuthUser {
        id,
        email,
        active,
        verified,
        superuser,
    } = user;
    Json(UserRead {
        id,
        email,
        is_active: active,
        is_verified: verified,
        is_superuser: superuser,
    })
}

/// update_me
///
/// [Authenticated Route] Changes the caller's own email and/or password. Flags cannot be
/// changed here.
#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "users",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated", body = UserRead),
        (status = 400, description = "Email taken or unacceptable password", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 422, description = "Invalid email", body = ErrorBody)
    )
)]
pub async fn update_me(
    ActiveUser(user): ActiveUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateMeRequest>,
) -> Result<Json<UserRead>, ApiError> {
    if let Some(email) = &payload.email
        && !email_is_plausible(email)
    {
        return Err(ApiError::validation("email must contain '@'"));
    }

    let hashed_password = match payload.password {
        Some(password) if !password_is_acceptable(&password) => {
            return Err(ApiError::BadRequest(
                "UPDATE_USER_INVALID_PASSWORD".to_string(),
            ));
        }
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    let updated = state
        .repo
        .update_user_credentials(user.id, payload.email, hashed_password)
        .await
        .map_err(|e| match e {
            RepoError::Conflict(_) => {
                ApiError::BadRequest("UPDATE_USER_EMAIL_ALREADY_EXISTS".to_string())
            }
            other => other.into(),
        })?
        .ok_or_else(|| ApiError::not_found("User", user.id))?;

    tracing::info!(user_id = %updated.id, "own account updated");
    Ok(Json(updated.into()))
}

/// list_users
///
/// [Superuser Route] Every registered account.
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserRead]),
        (status = 403, description = "Not an active superuser", body = ErrorBody)
    )
)]
pub async fn list_users(
    Superuser(_admin): Superuser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserRead>>, ApiError> {
    let users = state.repo.list_users().await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

/// get_user
///
/// [Superuser Route] One account by id.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserRead),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_user(
    Superuser(_admin): Superuser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserRead>, ApiError> {
    match state.repo.get_user(id).await? {
        Some(user) => Ok(Json(user.into())),
        None => Err(ApiError::not_found("User", id)),
    }
}

/// update_user
///
/// [Superuser Route] Flips account flags. This is how accounts become verified, since
/// there is no e-mail verification flow.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserRead),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_user(
    Superuser(admin): Superuser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserRead>, ApiError> {
    match state.repo.update_user_flags(id, payload).await? {
        Some(user) => {
            tracing::info!(user_id = %user.id, admin_id = %admin.id, "user flags updated");
            Ok(Json(user.into()))
        }
        None => Err(ApiError::not_found("User", id)),
    }
}

/// delete_user
///
/// [Superuser Route] Removes an account. Its sessions stop resolving on the next request.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an active superuser", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_user(
    Superuser(admin): Superuser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_user(id).await? == 0 {
        return Err(ApiError::not_found("User", id));
    }
    tracing::info!(user_id = %id, admin_id = %admin.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
