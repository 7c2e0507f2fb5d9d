use deadpool_postgres::Pool;

use crate::{
    error::Result,
    models::admin::AdminRecord,
};

/// Finds an administrator by exact username and stored (plaintext) password.
pub async fn find_by_credentials(
    pool: &Pool,
    username: &str,
    password: &str,
) -> Result<Option<AdminRecord>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, username
            FROM admins
            WHERE username = $1 AND password = $2
            "#,
            &[&username, &password],
        )
        .await?;

    Ok(row.map(|r| AdminRecord {
        id: r.get("id"),
        username: r.get("username"),
    }))
}
