use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::Result,
    models::salary::SalaryDetail,
};

/// A helper function to map a `tokio_postgres::Row` to a `SalaryDetail`.
fn row_to_salary(row: &Row) -> Result<SalaryDetail> {
    Ok(SalaryDetail {
        work_id: row.try_get("work_id")?,
        year: row.try_get("year")?,
        base_pay: row.try_get("base_pay")?,
        performance_pay: row.try_get("performance_pay")?,
        allowance: row.try_get("allowance")?,
        deduction: row.try_get("deduction")?,
        net_pay: row.try_get("net_pay")?,
    })
}

/// Lists the distinct salary years available for a work id, newest first.
pub async fn years_for(pool: &Pool, work_id: &str) -> Result<Vec<i32>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT DISTINCT year
            FROM salary_details
            WHERE work_id = $1
            ORDER BY year DESC
            "#,
            &[&work_id],
        )
        .await?;
    Ok(rows.iter().map(|r| r.get("year")).collect())
}

/// Inserts or updates one year's salary breakdown for a work id.
///
/// `None` fields keep their stored values on an existing row and default to
/// zero on a new one.
pub async fn upsert_detail(
    pool: &Pool,
    work_id: &str,
    year: i32,
    base_pay: Option<f64>,
    performance_pay: Option<f64>,
    allowance: Option<f64>,
    deduction: Option<f64>,
    net_pay: Option<f64>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO salary_details
                (work_id, year, base_pay, performance_pay, allowance, deduction, net_pay)
            VALUES
                ($1, $2, COALESCE($3, 0), COALESCE($4, 0), COALESCE($5, 0),
                 COALESCE($6, 0), COALESCE($7, 0))
            ON CONFLICT (work_id, year) DO UPDATE SET
                base_pay = COALESCE($3, salary_details.base_pay),
                performance_pay = COALESCE($4, salary_details.performance_pay),
                allowance = COALESCE($5, salary_details.allowance),
                deduction = COALESCE($6, salary_details.deduction),
                net_pay = COALESCE($7, salary_details.net_pay)
            "#,
            &[
                &work_id,
                &year,
                &base_pay,
                &performance_pay,
                &allowance,
                &deduction,
                &net_pay,
            ],
        )
        .await?;
    Ok(())
}

/// Fetches one year's salary breakdown for a work id, if present.
pub async fn find_by_year(
    pool: &Pool,
    work_id: &str,
    year: i32,
) -> Result<Option<SalaryDetail>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT work_id, year, base_pay, performance_pay, allowance, deduction, net_pay
            FROM salary_details
            WHERE work_id = $1 AND year = $2
            "#,
            &[&work_id, &year],
        )
        .await?;
    row.map(|r| row_to_salary(&r)).transpose()
}
