use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::mask,
    error::{AppError, Result},
    handlers::user::YearQuery,
    models::salary::SalaryDetail,
    repositories::{salary as salary_repo, staff as staff_repo},
    state::AppState,
};

/// Default salary year for the edit view.
const DEFAULT_YEAR: i32 = 2024;

/// One staff row in the admin list view. Identity numbers are masked in
/// lists; only the single-record edit view returns the full value.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffListItem {
    pub work_id: String,
    pub id_card: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_level: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StaffListResponse {
    pub success: bool,
    pub data: Vec<StaffListItem>,
}

/// Full staff detail for the edit view, identity number decrypted.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDetail {
    pub work_id: String,
    pub id_card: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_level: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub salary: Option<SalaryDetail>,
    pub year: i32,
}

#[derive(Serialize)]
pub struct StaffDetailResponse {
    pub success: bool,
    pub data: StaffDetail,
}

/// The request payload for updating a staff record. Absent fields are left
/// untouched.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub position_level: Option<String>,
    pub id_card: Option<String>,
}

/// The request payload for updating one year's salary breakdown. Absent
/// fields keep their stored values.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalaryRequest {
    pub year: Option<i32>,
    pub base_pay: Option<f64>,
    pub performance_pay: Option<f64>,
    pub allowance: Option<f64>,
    pub deduction: Option<f64>,
    pub net_pay: Option<f64>,
}

impl UpdateSalaryRequest {
    /// True when at least one salary field is present.
    fn has_updates(&self) -> bool {
        self.base_pay.is_some()
            || self.performance_pay.is_some()
            || self.allowance.is_some()
            || self.deduction.is_some()
            || self.net_pay.is_some()
    }
}

/// One logical staff row from the spreadsheet ingestion layer, already
/// reduced to plain strings per field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub work_id: Option<String>,
    pub id_card: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub position_level: Option<String>,
}

/// The request payload for bulk import.
#[derive(Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<ImportRow>,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub imported: u64,
    pub skipped: u64,
}

/// The request payload for bulk deletion.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStaffRequest {
    pub work_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

/// Lists all staff with masked identity numbers.
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<Response> {
    let records = staff_repo::list_all(&state.db).await?;

    let data = records
        .into_iter()
        .map(|record| {
            let id_card = state.codec.decrypt(&record.id_card);
            StaffListItem {
                work_id: record.work_id,
                id_card: mask::mask_id_number(&id_card),
                name: record.name,
                department: record.department,
                position_level: record.position_level,
                created_at: record.created_at,
                updated_at: record.updated_at,
            }
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(StaffListResponse {
            success: true,
            data,
        }),
    )
        .into_response())
}

/// Returns one staff record for editing, with the full decrypted identity
/// number. Admin-only by route layering.
#[axum::debug_handler]
pub async fn get_user(
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
        Json(StaffDetailResponse {
            success: true,
            data: StaffDetail {
                work_id: record.work_id,
                id_card,
                name: record.name,
                department: record.department,
                position_level: record.position_level,
                created_at: record.created_at,
                updated_at: record.updated_at,
                salary,
                year,
            },
        }),
    )
        .into_response())
}

/// Updates a staff record. A supplied identity number is re-encrypted before
/// it is written; re-encryption draws a fresh IV, so the stored bytes change
/// even when the number does not.
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(work_id): Path<String>,
    Json(payload): Json<UpdateStaffRequest>,
) -> Result<Response> {
    let encrypted_id_card = match payload.id_card.as_deref() {
        Some(id_card) => Some(state.codec.encrypt(id_card)?),
        None => None,
    };

    let updated = staff_repo::update_profile(
        &state.db,
        &work_id,
        payload.name.as_deref(),
        payload.department.as_deref(),
        payload.position_level.as_deref(),
        encrypted_id_card.as_deref(),
    )
    .await?;

    if !updated {
        return Err(AppError::NotFound);
    }

    tracing::info!("✅ Staff record updated: {}", work_id);

    Ok((
        StatusCode::OK,
        Json(MutationResponse {
            success: true,
            message: "Record updated".to_string(),
        }),
    )
        .into_response())
}

/// Updates one year's salary breakdown for a staff member, creating the
/// year's row if it does not exist yet.
#[axum::debug_handler]
pub async fn update_salary(
    State(state): State<AppState>,
    Path(work_id): Path<String>,
    Json(payload): Json<UpdateSalaryRequest>,
) -> Result<Response> {
    let year = payload
        .year
        .ok_or_else(|| AppError::Validation("Year is required".to_string()))?;

    if !payload.has_updates() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    salary_repo::upsert_detail(
        &state.db,
        &work_id,
        year,
        payload.base_pay,
        payload.performance_pay,
        payload.allowance,
        payload.deduction,
        payload.net_pay,
    )
    .await?;

    tracing::info!("✅ Salary detail updated: {} / {}", work_id, year);

    Ok((
        StatusCode::OK,
        Json(MutationResponse {
            success: true,
            message: "Salary detail updated".to_string(),
        }),
    )
        .into_response())
}

/// Initial password for an imported staff member: the last six characters of
/// the identity number, or a fixed fallback when it is too short.
fn default_password(id_card: &str) -> String {
    let chars: Vec<char> = id_card.chars().collect();
    if chars.len() >= 6 {
        chars[chars.len() - 6..].iter().collect()
    } else {
        "123456".to_string()
    }
}

/// Bulk-imports staff rows produced by the spreadsheet ingestion layer.
///
/// Rows missing a work id or identity number are skipped and counted. The
/// identity number and the derived initial password are encrypted before
/// the write; the repository only ever sees at-rest forms.
#[axum::debug_handler]
pub async fn import_users(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<Response> {
    let mut imported = 0u64;
    let mut skipped = 0u64;

    for row in &payload.rows {
        let (work_id, id_card) = match (row.work_id.as_deref(), row.id_card.as_deref()) {
            (Some(work_id), Some(id_card)) if !work_id.is_empty() && !id_card.is_empty() => {
                (work_id, id_card)
            }
            _ => {
                skipped += 1;
                continue;
            }
        };

        let password = default_password(id_card);
        let encrypted_id_card = state.codec.encrypt(id_card)?;
        let encrypted_password = state.codec.encrypt(&password)?;

        staff_repo::upsert(
            &state.db,
            work_id,
            &encrypted_id_card,
            &encrypted_password,
            row.name.as_deref().unwrap_or(""),
            row.department.as_deref(),
            row.position_level.as_deref(),
        )
        .await?;
        imported += 1;
    }

    tracing::info!("✅ Import finished: {} imported, {} skipped", imported, skipped);

    Ok((
        StatusCode::OK,
        Json(ImportResponse {
            success: true,
            message: format!("Imported {} record(s), skipped {}", imported, skipped),
            imported,
            skipped,
        }),
    )
        .into_response())
}

/// Bulk-deletes staff records by work id.
#[axum::debug_handler]
pub async fn delete_users(
    State(state): State<AppState>,
    Json(payload): Json<DeleteStaffRequest>,
) -> Result<Response> {
    if payload.work_ids.is_empty() {
        return Err(AppError::Validation("No work ids supplied".to_string()));
    }

    let deleted = staff_repo::delete_many(&state.db, &payload.work_ids).await?;

    tracing::info!("✅ Deleted {} staff record(s)", deleted);

    Ok((
        StatusCode::OK,
        Json(MutationResponse {
            success: true,
            message: format!("Deleted {} record(s)", deleted),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_import_password_is_last_six_id_chars() {
        assert_eq!(default_password("420106199001017710"), "017710");
        assert_eq!(default_password("123456"), "123456");
        // Too short to slice: fixed fallback.
        assert_eq!(default_password("12345"), "123456");
        assert_eq!(default_password(""), "123456");
    }

    #[test]
    fn salary_update_requires_at_least_one_field() {
        let empty = UpdateSalaryRequest {
            year: Some(2024),
            base_pay: None,
            performance_pay: None,
            allowance: None,
            deduction: None,
            net_pay: None,
        };
        assert!(!empty.has_updates());

        let with_field = UpdateSalaryRequest {
            net_pay: Some(1234.5),
            ..empty
        };
        assert!(with_field.has_updates());
    }
}
