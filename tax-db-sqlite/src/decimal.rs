use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};
use tax_core::RepositoryError;

/// Reads a decimal column.
///
/// Amounts and rates are written as TEXT so they keep their exact decimal
/// form. INTEGER and REAL values, as produced by hand-written SQL, are
/// accepted too. NULL reads as zero.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            parse_decimal_text(&val).ok_or_else(|| {
                RepositoryError::Database(format!(
                    "Column '{}' holds '{}', which is not a decimal",
                    column, val
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            // Through the shortest round-trip text so 0.15 stays 0.15.
            parse_decimal_text(&val.to_string()).ok_or_else(|| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal", val))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Like [`get_decimal`], but NULL reads as `None`.
pub fn get_optional_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// The TEXT form a decimal is stored in.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

fn parse_decimal_text(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn create_test_table(pool: &sqlx::sqlite::SqlitePool) {
        sqlx::query(
            "CREATE TABLE test_decimals (
                id INTEGER PRIMARY KEY,
                int_value INTEGER,
                real_value REAL,
                null_value TEXT,
                text_value TEXT,
                blob_value BLOB
            )",
        )
        .execute(pool)
        .await
        .expect("Failed to create test table");
    }

    async fn setup_test_db() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_test_table(&pool).await;
        pool
    }

    async fn fetch(
        pool: &sqlx::sqlite::SqlitePool,
        insert: &str,
        column: &str,
    ) -> sqlx::sqlite::SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        sqlx::query(&format!("SELECT {column} FROM test_decimals WHERE id = 1"))
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    // get_decimal tests

    #[tokio::test]
    async fn test_get_decimal_from_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '100.01')",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(100.01)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_text_keeps_precision() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '0.123456789012345678')",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(0.123456789012345678)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_non_numeric_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, 'not a number')",
            "text_value",
        )
        .await;

        assert_eq!(
            get_decimal(&row, "text_value"),
            Err(RepositoryError::Database(
                "Column 'text_value' holds 'not a number', which is not a decimal".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, int_value) VALUES (1, -99999)",
            "int_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(-99999)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, real_value) VALUES (1, 0.15)",
            "real_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(0.15)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_null_returns_zero() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, null_value) VALUES (1, NULL)",
            "null_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "null_value"), Ok(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_get_decimal_column_not_found() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id) VALUES (1)", "id").await;

        let result = get_decimal(&row, "nonexistent_column");

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'nonexistent_column' not found:")));
    }

    #[tokio::test]
    async fn test_get_decimal_unexpected_type() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, blob_value) VALUES (1, x'00ff')",
            "blob_value",
        )
        .await;

        assert_eq!(
            get_decimal(&row, "blob_value"),
            Err(RepositoryError::Database(
                "Unexpected type 'BLOB' for column 'blob_value'".to_string()
            ))
        );
    }

    // get_optional_decimal tests

    #[tokio::test]
    async fn test_get_optional_decimal_from_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '3000')",
            "text_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(Some(dec!(3000))));
    }

    #[tokio::test]
    async fn test_get_optional_decimal_from_null_returns_none() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, null_value) VALUES (1, NULL)",
            "null_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "null_value"), Ok(None));
    }

    // decimal_to_text tests

    #[test]
    fn test_decimal_to_text_drops_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(0.150)), "0.15");
        assert_eq!(decimal_to_text(dec!(100.00)), "100");
    }

    #[test]
    fn test_decimal_to_text_keeps_sign_and_fraction() {
        assert_eq!(decimal_to_text(dec!(-456.78)), "-456.78");
        assert_eq!(decimal_to_text(dec!(0.0001)), "0.0001");
    }
}
