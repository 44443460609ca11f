use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use crate::{
    dto::auth::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UpdateProfileRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::password::{ensure_password_length, hash_password, verify_password},
    state::AppState,
};

pub fn user_from_entity(model: &UserModel) -> User {
    User {
        id: model.id,
        email: model.email.clone(),
        name: model.name.clone(),
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn identity_of(model: &UserModel) -> AuthUser {
    AuthUser {
        user_id: model.id,
        email: model.email.clone(),
        role: model.role,
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a domain of at least two
/// non-empty dot-separated labels.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    if !clean(local) || !clean(domain) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

fn parse_role(role: Option<&str>) -> AppResult<Role> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(Role::Customer),
        Some("customer") => Ok(Role::Customer),
        Some("supplier") => Ok(Role::Supplier),
        Some(other) => Err(AppError::BadRequest(format!("invalid role `{other}`"))),
    }
}

pub async fn find_by_email(state: &AppState, email: &str) -> AppResult<Option<UserModel>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?;
    Ok(user)
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let RegisterRequest {
        name,
        email,
        password,
        role,
    } = payload;
    let name = name.trim().to_string();
    let email = normalize_email(&email);

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "name, email and password are required".to_string(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("invalid email address".to_string()));
    }
    ensure_password_length(&password)?;
    let role = parse_role(role.as_deref())?;

    if find_by_email(state, &email).await?.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let now = Utc::now().into();

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(name),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email is already taken".to_string())
        }
        _ => AppError::from(err),
    })?;

    let token = state.tokens.issue(&identity_of(&user))?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");

    Ok(ApiResponse::success(
        "User created",
        AuthResponse {
            user: user_from_entity(&user),
            token,
        },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let user = match find_by_email(state, &email).await? {
        Some(u) => u,
        None => return Err(AppError::InvalidCredentials),
    };

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(&identity_of(&user))?;
    tracing::debug!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            user: user_from_entity(&user),
            token,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        ProfileResponse {
            user: user_from_entity(&user),
        },
        None,
    ))
}

/// Name and password can change; the email is fixed after registration.
pub async fn update_profile(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let existing = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        active.name = Set(name.to_string());
    }
    if let Some(password) = payload.password.as_deref().filter(|p| !p.is_empty()) {
        ensure_password_length(password)?;
        active.password_hash = Set(hash_password(password)?);
    }
    active.updated_at = Set(Utc::now().into());

    let user = active.update(&state.orm).await?;
    let token = state.tokens.issue(&identity_of(&user))?;

    Ok(ApiResponse::success(
        "Profile updated",
        AuthResponse {
            user: user_from_entity(&user),
            token,
        },
        Some(Meta::empty()),
    ))
}
