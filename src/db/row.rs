use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use sqlx::sqlite::{SqliteColumn, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// One result row, keyed by column name in SELECT order.
pub type JsonRow = Map<String, Value>;

pub fn to_json(row: &SqliteRow) -> Result<JsonRow, sqlx::Error> {
    let mut object = Map::with_capacity(row.len());
    for column in row.columns() {
        object.insert(column.name().to_string(), column_value(row, column)?);
    }
    Ok(object)
}

fn column_value(row: &SqliteRow, column: &SqliteColumn) -> Result<Value, sqlx::Error> {
    let index = column.ordinal();
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    // SQLite is dynamically typed: the value carries its storage class while
    // the column carries whatever type the table declared.
    let storage = raw.type_info().name().to_string();

    match column.type_info().name() {
        "BOOLEAN" if storage == "INTEGER" => {
            return Ok(Value::Bool(row.try_get::<i64, _>(index)? != 0));
        }
        "DATE" => {
            if let Ok(date) = row.try_get::<NaiveDate, _>(index) {
                return Ok(Value::String(date.format("%Y-%m-%d").to_string()));
            }
        }
        "DATETIME" => {
            if let Ok(ts) = row.try_get::<NaiveDateTime, _>(index) {
                return Ok(Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()));
            }
        }
        _ => {}
    }

    let value = match storage.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" => Number::from_f64(row.try_get::<f64, _>(index)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(index)?),
        _ => Value::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::TestDb;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_storage_classes() {
        let store = TestDb::new().await;
        let rows = store
            .db
            .fetch_rows(
                "SELECT 7 AS i, 2.5 AS r, 'text' AS t, NULL AS n, x'0102' AS b",
                None,
            )
            .await
            .unwrap();

        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"i": 7, "r": 2.5, "t": "text", "n": null, "b": [1, 2]})
        );
    }

    #[actix_web::test]
    async fn test_column_order_follows_select() {
        let store = TestDb::new().await;
        store.seed_customer(1, "Alice", "London", "555-1212").await;

        let rows = store
            .db
            .fetch_rows("SELECT phone, id, city, name FROM customers", None)
            .await
            .unwrap();

        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["phone", "id", "city", "name"]);
    }

    #[actix_web::test]
    async fn test_declared_types_refine_values() {
        let store = TestDb::new().await;
        store.seed_customer(1, "Alice", "London", "555-1212").await;
        store
            .exec(
                "INSERT INTO room_types (room_type, def_rate, max_guests) \
                 VALUES ('DOUBLE', 85.0, 2)",
            )
            .await;
        store
            .exec(
                "INSERT INTO rooms (room_no, rate, room_type, no_guests) \
                 VALUES (101, 85.0, 'DOUBLE', 2)",
            )
            .await;
        store
            .exec(
                "INSERT INTO reservations \
                 (id, cust_id, room_no, checkin_date, checkout_date, no_guests, booking_date) \
                 VALUES (1, 1, 101, '2024-03-01', NULL, 2, '2024-01-15 09:30:00')",
            )
            .await;
        store
            .exec(
                "INSERT INTO invoices (id, res_id, total, invoice_date, paid) \
                 VALUES (1, 1, 170.0, '2024-03-03', 1)",
            )
            .await;

        let reservation = store
            .db
            .fetch_rows("SELECT * FROM reservations", None)
            .await
            .unwrap();
        assert_eq!(reservation[0]["checkin_date"], json!("2024-03-01"));
        assert_eq!(reservation[0]["checkout_date"], Value::Null);
        assert_eq!(reservation[0]["booking_date"], json!("2024-01-15T09:30:00"));

        let invoice = store.db.fetch_rows("SELECT * FROM invoices", None).await.unwrap();
        assert_eq!(invoice[0]["paid"], json!(true));
        assert_eq!(invoice[0]["total"], json!(170.0));
    }

    #[actix_web::test]
    async fn test_undecodable_date_falls_back_to_text() {
        let store = TestDb::new().await;
        store
            .exec("INSERT INTO reservations (id, checkin_date) VALUES (9, 'next tuesday')")
            .await;

        let rows = store
            .db
            .fetch_rows("SELECT checkin_date FROM reservations", None)
            .await
            .unwrap();
        assert_eq!(rows[0]["checkin_date"], json!("next tuesday"));
    }
}
