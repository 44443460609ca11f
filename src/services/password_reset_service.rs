//! Password reset ledger.
//!
//! A user holds at most one usable token at a time: a second request while a token is
//! still live re-sends the same link instead of minting a new one.

use chrono::{Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    dto::auth::{ForgotPasswordRequest, ResetPasswordRequest, TokenValidity},
    entity::{
        reset_tokens::{
            ActiveModel as ResetTokenActive, Column as ResetCol, Entity as ResetTokens,
            Model as ResetTokenModel,
        },
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    mailer::password_reset_email,
    response::{ApiResponse, Meta},
    services::{
        auth_service::{find_by_email, normalize_email},
        password::{ensure_password_length, hash_password},
    },
    state::AppState,
};

pub const RESET_TOKEN_TTL_HOURS: i64 = 1;
const RESET_TOKEN_BYTES: usize = 32;

/// Returned whether or not the address belongs to an account.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent";

fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn is_usable(row: &ResetTokenModel) -> bool {
    !row.used && row.expires_at.with_timezone(&Utc) > Utc::now()
}

pub fn reset_link(app_url: &str, token: &str) -> String {
    format!("{}/reset-password?token={token}", app_url.trim_end_matches('/'))
}

async fn find_usable(state: &AppState, token: &str) -> AppResult<Option<ResetTokenModel>> {
    let row = ResetTokens::find()
        .filter(ResetCol::Token.eq(token))
        .one(&state.orm)
        .await?;
    Ok(row.filter(is_usable))
}

pub async fn request_reset(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }

    let generic = || {
        ApiResponse::success(
            RESET_REQUESTED_MESSAGE,
            serde_json::json!({}),
            Some(Meta::empty()),
        )
    };

    let Some(user) = find_by_email(state, &email).await? else {
        tracing::debug!("password reset requested for unknown email");
        return Ok(generic());
    };

    // Expiry is compared in memory so the check does not depend on how the backend
    // orders timestamps.
    let live = ResetTokens::find()
        .filter(ResetCol::UserId.eq(user.id))
        .filter(ResetCol::Used.eq(false))
        .order_by_desc(ResetCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .find(is_usable);

    let token = match live {
        Some(row) => {
            tracing::debug!(user_id = %user.id, "reusing live reset token");
            row.token
        }
        None => {
            let now = Utc::now();
            let row = ResetTokenActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.id),
                token: Set(generate_reset_token()),
                expires_at: Set((now + Duration::hours(RESET_TOKEN_TTL_HOURS)).into()),
                used: Set(false),
                created_at: Set(now.into()),
            }
            .insert(&state.orm)
            .await?;
            row.token
        }
    };

    let email = password_reset_email(&user.email, &user.name, &reset_link(&state.app_url, &token));
    if let Err(err) = state.mailer.send(email).await {
        tracing::warn!(error = %err, user_id = %user.id, "password reset mail failed");
    }

    Ok(generic())
}

pub async fn validate_token(
    state: &AppState,
    token: Option<String>,
) -> AppResult<ApiResponse<TokenValidity>> {
    let token = token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("token is required".to_string()))?;

    let valid = find_usable(state, &token).await?.is_some();
    Ok(ApiResponse::success("OK", TokenValidity { valid }, None))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let token = payload.token.trim();
    if token.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::BadRequest(
            "token and newPassword are required".to_string(),
        ));
    }
    ensure_password_length(&payload.new_password)?;

    let row = find_usable(state, token)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired token".to_string()))?;

    let user = Users::find_by_id(row.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let password_hash = hash_password(&payload.new_password)?;
    let txn = state.orm.begin().await?;

    // Guarded on `used = false` so two concurrent resets cannot both succeed.
    let marked = ResetTokens::update_many()
        .col_expr(ResetCol::Used, Expr::value(true))
        .filter(ResetCol::Id.eq(row.id))
        .filter(ResetCol::Used.eq(false))
        .exec(&txn)
        .await?;
    if marked.rows_affected != 1 {
        txn.rollback().await?;
        return Err(AppError::BadRequest("Invalid or expired token".to_string()));
    }

    let mut active: UserActive = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!(user_id = %user.id, "password reset");

    Ok(ApiResponse::success(
        "Password has been reset",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
