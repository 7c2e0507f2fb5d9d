use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::mask,
    error::{AppError, Result},
    models::salary::SalaryDetail,
    repositories::{salary as salary_repo, staff as staff_repo},
    state::AppState,
};

/// Default salary year when the query does not name one.
const DEFAULT_YEAR: i32 = 2024;

#[derive(Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Serialize)]
pub struct YearsResponse {
    pub success: bool,
    pub data: Vec<i32>,
}

/// Profile plus one year's salary breakdown, identity number masked.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub work_id: String,
    pub id_card: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_level: Option<String>,
    pub salary: Option<SalaryDetail>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: ProfileData,
}

/// Lists the salary years available for a work id.
#[axum::debug_handler]
pub async fn years(
    State(state): State<AppState>,
    Path(work_id): Path<String>,
) -> Result<Response> {
    let years = salary_repo::years_for(&state.db, &work_id).await?;

    Ok((
        StatusCode::OK,
        Json(YearsResponse {
            success: true,
            data: years,
        }),
    )
        .into_response())
}

/// Returns a staff member's profile and salary detail for one year.
///
/// The identity number is decrypted from its at-rest form and masked before
/// it leaves the server; teachers never see the full value here.
#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Path(work_id): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Response> {
    let year = query.year.unwrap_or(DEFAULT_YEAR);

    let record = staff_repo::find_by_work_id(&state.db, &work_id)
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound)?;

    let id_card = state.codec.decrypt(&record.id_card);
    let salary = salary_repo::find_by_year(&state.db, &work_id, year).await?;

    Ok((
        StatusCode::OK,
        Json(ProfileResponse {
            success: true,
            data: ProfileData {
                work_id: record.work_id,
                id_card: mask::mask_id_number(&id_card),
                name: record.name,
                department: record.department,
                position_level: record.position_level,
                salary,
            },
        }),
    )
        .into_response())
}
