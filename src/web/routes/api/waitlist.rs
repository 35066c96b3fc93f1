use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use tracing::{info, Span};

use crate::web::{
    types::{
        DeserWaitlistEntry, ExistsQuery, ExistsResponse, SignupResponse, ValidWaitlistEntry,
        WaitlistRecord,
    },
    WebResult,
};
use crate::AppState;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error("the email is already on the waitlist")]
    AlreadyOnWaitlist,
    #[error("failed to insert the waitlist entry: {0}")]
    Insert(#[source] sqlx::Error),
    #[error("failed to look up the email: {0}")]
    Lookup(#[source] sqlx::Error),
}

// ###################################
// ->   API
// ###################################
#[tracing::instrument(
    name = "Adding a new entry to the waitlist",
    skip_all,
    fields(entry_email = tracing::field::Empty)
)]
pub async fn waitlist_signup(
    State(app_state): State<AppState>,
    payload: Result<Json<DeserWaitlistEntry>, JsonRejection>,
) -> WebResult<(StatusCode, Json<SignupResponse>)> {
    let Json(entry) = payload?;
    let entry: ValidWaitlistEntry = entry.try_into()?;
    Span::current().record("entry_email", entry.email.as_ref());

    let record = insert_entry(app_state.model_mgr.db(), &entry).await?;
    info!(entry_id = %record.id, "New entry succesfully added to the waitlist.");

    Ok((StatusCode::CREATED, Json(SignupResponse::new(record))))
}

#[tracing::instrument(
    name = "Checking if an email is on the waitlist",
    skip_all,
    fields(entry_email = tracing::field::Empty)
)]
pub async fn waitlist_exists(
    State(app_state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> WebResult<Json<ExistsResponse>> {
    let Query(pairs) = query?;
    let email = ExistsQuery::from_pairs(pairs).normalized_email()?;
    Span::current().record("entry_email", email.as_str());

    let found: Option<String> =
        sqlx::query_scalar(r#"SELECT email FROM waitlist WHERE email = $1"#)
            .bind(&email)
            .fetch_optional(app_state.model_mgr.db())
            .await
            .map_err(WaitlistError::Lookup)?;

    Ok(Json(ExistsResponse {
        exists: found.is_some(),
    }))
}

/// Inserts a validated entry and returns the columns the database filled in.
/// A duplicate email is reported as `WaitlistError::AlreadyOnWaitlist`, any other failure is passed on.
async fn insert_entry(
    db_pool: &PgPool,
    entry: &ValidWaitlistEntry,
) -> Result<WaitlistRecord, WaitlistError> {
    sqlx::query_as::<_, WaitlistRecord>(
        r#"
        INSERT INTO waitlist (full_name, email, phone, interests)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, created_at
    "#,
    )
    .bind(entry.full_name.as_ref())
    .bind(entry.email.as_ref())
    .bind(entry.phone.as_ref())
    .bind(entry.interests.as_slice())
    .fetch_one(db_pool)
    .await
    .map_err(|er| {
        if is_unique_violation(&er) {
            WaitlistError::AlreadyOnWaitlist
        } else {
            WaitlistError::Insert(er)
        }
    })
}

// ###################################
// ->   HELPERS
// ###################################
fn is_unique_violation(error: &sqlx::Error) -> bool {
    use sqlx::postgres::PgDatabaseError;

    match error {
        sqlx::Error::Database(er) => er
            .try_downcast_ref::<PgDatabaseError>()
            .is_some_and(|pg_er| pg_er.code() == UNIQUE_VIOLATION),
        _ => false,
    }
}
