//! Tests against a real PostgreSQL server
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

mod common;

use common::Business;
use rowhaus::prelude::*;
use std::sync::Arc;

async fn connect() -> Arc<PgExecutor> {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    Arc::new(PgExecutor::new(pool))
}

/// Create `table` with one column per declared attribute of `Business`
async fn create_table(executor: &PgExecutor, table: &str) {
    let columns: Vec<String> = Business::schema()
        .attributes()
        .iter()
        .map(|attr| match attr.name() {
            "id" => "id BIGSERIAL PRIMARY KEY".to_string(),
            "username" => "username TEXT NOT NULL UNIQUE".to_string(),
            "created" => "created TIMESTAMPTZ NOT NULL DEFAULT now()".to_string(),
            name => format!("{} {}", name, attr.field_type().pg_type()),
        })
        .collect();

    executor
        .modify(&format!("DROP TABLE IF EXISTS {}", table), &[])
        .await
        .unwrap();
    executor
        .modify(
            &format!("CREATE TABLE {} ({})", table, columns.join(", ")),
            &[],
        )
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn test_mapper_against_postgres() {
    let executor = connect().await;
    create_table(&executor, "rowhaus_live_business").await;
    let mapper = Mapper::<Business>::new(executor.clone(), "rowhaus_live_business").unwrap();

    let signup = || {
        Record::<Business>::with_values([
            ("username", "alice"),
            ("password", "secret"),
            ("email", "alice@example.com"),
        ])
        .unwrap()
    };
    let created = mapper.insert(signup(), None).await.unwrap().unwrap();
    assert!(matches!(created.get("id"), Some(SqlValue::Integer(_))));
    assert!(matches!(created.get("created"), Some(SqlValue::Timestamp(_))));
    assert!(mapper.insert(signup(), None).await.unwrap().is_none());

    let lookup = Record::<Business>::with_values([("username", "alice")]).unwrap();
    let mut found = mapper.select(lookup, "username").await.unwrap().unwrap();
    assert_eq!(found, created);

    found.set("phone", "555-0100").unwrap();
    let updated = mapper.update(found, "id").await.unwrap().unwrap();
    assert_eq!(updated.get("phone"), Some(&SqlValue::from("555-0100")));

    let removed = mapper.delete(updated, "id").await.unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
#[ignore]
async fn test_bulk_against_postgres() {
    let executor = connect().await;
    create_table(&executor, "rowhaus_live_bulk").await;
    let bulk = BulkDb::new(executor.clone());

    let rows: Vec<BulkRow> = (0..7001)
        .map(|i| BulkRow::positional([format!("user{}", i), "pw".to_string(), format!("u{}@x", i)]))
        .collect();
    let returned = bulk
        .insert(
            "INSERT INTO rowhaus_live_bulk (username, password, email)",
            "({}, {}, {})",
            &rows,
            BulkOptions::new(3000).returning(),
        )
        .await
        .unwrap();
    assert_eq!(returned.len(), 7001);

    let updates: Vec<BulkRow> = returned
        .iter()
        .take(10)
        .map(|row| BulkRow::named([("id", row["id"].clone()), ("phone", SqlValue::from("000"))]))
        .collect();
    let changed = bulk
        .update(
            "UPDATE rowhaus_live_bulk",
            "({id}, {phone})",
            &updates,
            &["id"],
            None,
            BulkOptions::new(4).returning(),
        )
        .await
        .unwrap();
    assert_eq!(changed.len(), 10);
    assert!(changed.iter().all(|row| row["phone"] == SqlValue::from("000")));
}
