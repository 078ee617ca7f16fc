use super::*;
use crate::test_support::{row, CallKind, RecordingExecutor};
use type_mapping::SqlValue;

fn numbered_rows(count: i64) -> Vec<BulkRow> {
    (0..count).map(|i| BulkRow::positional([i])).collect()
}

fn users() -> Vec<BulkRow> {
    vec![
        BulkRow::named([
            ("id", SqlValue::from(1)),
            ("username", "a".into()),
            ("email", "a@x".into()),
        ]),
        BulkRow::named([
            ("email", SqlValue::from("b@x")),
            ("id", 2.into()),
            ("username", "b".into()),
        ]),
    ]
}

fn bulk() -> (Arc<RecordingExecutor>, BulkDb) {
    let executor = Arc::new(RecordingExecutor::new());
    let bulk = BulkDb::new(executor.clone());
    (executor, bulk)
}

// ========================================
// Chunking
// ========================================

#[tokio::test]
async fn test_insert_chunks_in_order() {
    let (executor, bulk) = bulk();
    let data = numbered_rows(7001);

    let returned = bulk
        .insert("INSERT INTO counter (n)", "({})", &data, BulkOptions::new(3000))
        .await
        .unwrap();
    assert!(returned.is_empty());

    let calls = executor.calls();
    assert_eq!(calls.len(), 3);
    let sizes: Vec<usize> = calls
        .iter()
        .map(|call| call.sql.matches('(').count() - 1)
        .collect();
    assert_eq!(sizes, vec![3000, 3000, 1]);

    assert!(calls.iter().all(|call| call.kind == CallKind::Modify));
    assert!(calls[0].sql.starts_with("INSERT INTO counter (n) values (0),(1),"));
    assert!(calls[1].sql.starts_with("INSERT INTO counter (n) values (3000),"));
    assert_eq!(
        calls[2].sql,
        "INSERT INTO counter (n) values (7000) ON CONFLICT DO NOTHING "
    );
}

#[tokio::test]
async fn test_failed_chunk_stops_the_batch() {
    let executor = Arc::new(RecordingExecutor::failing_on(1));
    let bulk = BulkDb::new(executor.clone());

    let err = bulk
        .insert("INSERT INTO counter (n)", "({})", &numbered_rows(25), BulkOptions::new(10))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Database(_)));
    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn test_returned_rows_follow_chunk_order() {
    let (executor, bulk) = bulk();
    executor.push_rows(vec![row([("id", 1)]), row([("id", 2)])]);
    executor.push_rows(vec![row([("id", 3)])]);

    let returned = bulk
        .insert(
            "INSERT INTO counter (n)",
            "({})",
            &numbered_rows(3),
            BulkOptions::new(2).returning(),
        )
        .await
        .unwrap();

    let ids: Vec<_> = returned.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![SqlValue::from(1), SqlValue::from(2), SqlValue::from(3)]);
    assert!(executor
        .calls()
        .iter()
        .all(|call| call.kind == CallKind::FetchAll && call.sql.ends_with(" RETURNING id ")));
}

#[tokio::test]
async fn test_invalid_batches_issue_nothing() {
    let (executor, bulk) = bulk();
    let header = "INSERT INTO counter (n)";

    let err = bulk
        .insert(header, "({})", &numbered_rows(3), BulkOptions::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Bulk(BulkError::InvalidBlockSize)));

    let mut mixed = numbered_rows(3);
    mixed.push(BulkRow::named([("n", 3)]));
    let err = bulk
        .insert(header, "({})", &mixed, BulkOptions::new(2))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Bulk(BulkError::MixedRows)));

    let returned = bulk
        .insert(header, "({})", &[], BulkOptions::default())
        .await
        .unwrap();
    assert!(returned.is_empty());
    assert!(executor.calls().is_empty());
}

#[test]
fn test_block_size_comes_from_config() {
    let executor = Arc::new(RecordingExecutor::new());
    let bulk = BulkDb::from_config(executor, &config::BulkConfig::new(500));
    assert_eq!(bulk.options(), BulkOptions::new(500));
    assert_eq!(BulkOptions::default().block, DEFAULT_BLOCK_SIZE);
}

// ========================================
// Rendering
// ========================================

#[test]
fn test_block_sql() {
    let rows = vec![
        BulkRow::positional([SqlValue::from(1), "x".into()]),
        BulkRow::positional([SqlValue::from(2), "it's".into()]),
    ];
    let block = Block::new("INSERT INTO t (a, b)", "({}, {})", &rows, true).unwrap();
    assert_eq!(
        block.sql(),
        "INSERT INTO t (a, b) values (1, 'x'),(2, 'it''s') ON CONFLICT DO NOTHING  RETURNING id "
    );
}

#[test]
fn test_block_sql_with_named_rows() {
    let rows = users();
    let block = Block::new("INSERT INTO business (id, username)", "({id}, {username})", &rows, false)
        .unwrap();
    assert_eq!(
        block.sql(),
        "INSERT INTO business (id, username) values (1, 'a'),(2, 'b') ON CONFLICT DO NOTHING "
    );
}

#[test]
fn test_block_update_sql() {
    let rows = users();
    let block = BlockUpdate::new(
        "UPDATE business",
        "({id}, {username}, {email})",
        &rows,
        &["id"],
        None,
        true,
    )
    .unwrap();

    assert_eq!(
        block.sql(),
        "UPDATE business update_tb  SET username=data.username,email=data.email  FROM  \
         (VALUES (1, 'a', 'a@x'),(2, 'b', 'b@x'))  AS data(id,username,email) \
         WHERE update_tb.id=data.id \
         RETURNING update_tb.id,update_tb.username,update_tb.email"
    );
}

#[test]
fn test_block_update_with_chosen_columns() {
    let rows = users();
    let block = BlockUpdate::new(
        "UPDATE business",
        "({id}, {username}, {email})",
        &rows,
        &["id", "username"],
        Some(&["email"][..]),
        false,
    )
    .unwrap();

    let sql = block.sql();
    assert!(sql.contains(" SET email=data.email  FROM "));
    assert!(sql.ends_with("WHERE update_tb.id=data.id AND update_tb.username=data.username"));
}

#[test]
fn test_block_update_validation() {
    let rows = users();
    let template = "({id}, {username}, {email})";

    let positional = vec![BulkRow::positional([1, 2])];
    assert_eq!(
        BlockUpdate::new("UPDATE t", "({}, {})", &positional, &["id"], None, false).unwrap_err(),
        BulkError::PositionalUpdate
    );
    assert!(matches!(
        BlockUpdate::new("UPDATE t", template, &rows, &[], None, false),
        Err(BulkError::InvalidKey(_))
    ));
    assert!(matches!(
        BlockUpdate::new("UPDATE t", template, &rows, &["uuid"], None, false),
        Err(BulkError::InvalidKey(_))
    ));
    assert!(matches!(
        BlockUpdate::new("UPDATE t", template, &rows, &["id"], Some(&["phone"][..]), false),
        Err(BulkError::InvalidKey(_))
    ));
    assert!(matches!(
        BlockUpdate::new("UPDATE t", "({id})", &rows, &["id"], None, false),
        Err(BulkError::InvalidKey(_))
    ));

    let partial = vec![rows[0].clone(), BulkRow::named([("id", 3)])];
    assert!(matches!(
        BlockUpdate::new("UPDATE t", template, &partial, &["id"], None, false),
        Err(BulkError::MissingColumn { row: 1, .. })
    ));
}

#[test]
fn test_block_list_binds_parameters() {
    let rows = vec![
        BulkRow::positional([SqlValue::from(1), "x".into()]),
        BulkRow::positional([SqlValue::from(2), "y".into()]),
    ];
    let block = BlockList::new("INSERT INTO t (a, b)", "({}, {})", &rows, false).unwrap();

    let (sql, args) = block.statement();
    assert_eq!(sql, "INSERT INTO t (a, b) values ($1, $2),($3, $4)");
    assert_eq!(
        args,
        vec![
            SqlValue::from(1),
            SqlValue::from("x"),
            SqlValue::from(2),
            SqlValue::from("y")
        ]
    );
}

#[tokio::test]
async fn test_block_list_parameter_limit() {
    let (executor, bulk) = bulk();
    let rows: Vec<BulkRow> = (0..32768).map(|i| BulkRow::positional([i, i])).collect();

    let err = bulk
        .insert_list("INSERT INTO t (a, b)", "({}, {})", &rows, BulkOptions::new(40000))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Bulk(BulkError::TooManyParameters { count: 65536, .. })
    ));
    assert!(executor.calls().is_empty());

    bulk.insert_list("INSERT INTO t (a, b)", "({}, {})", &rows, BulkOptions::new(20000))
        .await
        .unwrap();
    let calls = executor.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].args.len(), 40000);
    assert_eq!(calls[1].args.len(), 25536);
}

#[tokio::test]
async fn test_bulk_update_runs_per_chunk() {
    let (executor, bulk) = bulk();
    let rows = users();

    bulk.update(
        "UPDATE business",
        "({id}, {username})",
        &rows,
        &["id"],
        None,
        BulkOptions::new(1),
    )
    .await
    .unwrap();

    let calls = executor.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].sql.contains("(VALUES (2, 'b'))"));
}
