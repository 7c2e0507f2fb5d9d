use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::Result,
    models::staff::StaffRecord,
};

/// A helper function to map a `tokio_postgres::Row` to a `StaffRecord`.
fn row_to_staff(row: &Row) -> Result<StaffRecord> {
    Ok(StaffRecord {
        work_id: row.try_get("work_id")?,
        id_card: row.try_get("id_card")?,
        password: row.try_get("password")?,
        name: row.try_get("name")?,
        department: row.try_get("department")?,
        position_level: row.try_get("position_level")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Finds staff records by exact work id.
pub async fn find_by_work_id(pool: &Pool, work_id: &str) -> Result<Vec<StaffRecord>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT work_id, id_card, password, name, department, position_level,
                   created_at, updated_at
            FROM users
            WHERE work_id = $1
            "#,
            &[&work_id],
        )
        .await?;
    rows.iter().map(row_to_staff).collect()
}

/// Finds staff records whose stored identity number matches either candidate
/// form (the encrypted form of the submitted principal, or the raw form for
/// legacy unencrypted rows). Row order is whatever storage returns.
pub async fn find_by_id_card(
    pool: &Pool,
    encrypted: &str,
    raw: &str,
) -> Result<Vec<StaffRecord>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT work_id, id_card, password, name, department, position_level,
                   created_at, updated_at
            FROM users
            WHERE id_card = $1 OR id_card = $2
            "#,
            &[&encrypted, &raw],
        )
        .await?;
    rows.iter().map(row_to_staff).collect()
}

/// Lists all staff records, newest first.
pub async fn list_all(pool: &Pool) -> Result<Vec<StaffRecord>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT work_id, id_card, password, name, department, position_level,
                   created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
            &[],
        )
        .await?;
    rows.iter().map(row_to_staff).collect()
}

/// Inserts a staff record or replaces an existing one by work id.
///
/// `id_card` and `password` must already be in their at-rest form; the
/// repository never encrypts.
pub async fn upsert(
    pool: &Pool,
    work_id: &str,
    id_card: &str,
    password: &str,
    name: &str,
    department: Option<&str>,
    position_level: Option<&str>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO users (work_id, id_card, password, name, department, position_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (work_id) DO UPDATE SET
                id_card = EXCLUDED.id_card,
                password = EXCLUDED.password,
                name = EXCLUDED.name,
                department = EXCLUDED.department,
                position_level = EXCLUDED.position_level,
                updated_at = NOW()
            "#,
            &[&work_id, &id_card, &password, &name, &department, &position_level],
        )
        .await?;
    Ok(())
}

/// Updates the editable fields of a staff record. `None` fields are left
/// untouched. Returns `true` if a row was updated.
pub async fn update_profile(
    pool: &Pool,
    work_id: &str,
    name: Option<&str>,
    department: Option<&str>,
    position_level: Option<&str>,
    id_card: Option<&str>,
) -> Result<bool> {
    let client = pool.get().await?;
    let updated = client
        .execute(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                department = COALESCE($3, department),
                position_level = COALESCE($4, position_level),
                id_card = COALESCE($5, id_card),
                updated_at = NOW()
            WHERE work_id = $1
            "#,
            &[&work_id, &name, &department, &position_level, &id_card],
        )
        .await?;
    Ok(updated > 0)
}

/// Deletes staff records by work id. Returns the number of rows removed.
pub async fn delete_many(pool: &Pool, work_ids: &[String]) -> Result<u64> {
    let client = pool.get().await?;
    let deleted = client
        .execute(
            r#"
            DELETE FROM users
            WHERE work_id = ANY($1)
            "#,
            &[&work_ids],
        )
        .await?;
    Ok(deleted)
}
