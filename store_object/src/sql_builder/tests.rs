use super::*;
use crate::record::Record;
use crate::test_support::{Business, Session};
use type_mapping::FieldType;

crate::record_kind! {
    struct Parcel: ParcelField {
        Id("id", FieldType::Integer) [not_null, has_default, read_only];
        Weight("weight", FieldType::Uom { base_unit: "kg" });
        Price("price", FieldType::Numeric);
        Label("label", FieldType::Text);
    }
}

const BUSINESS_COLUMNS: &str = "id, username, password, email, phone, full_address, \
                                hash_recovery, business_role, business_owner_id, created";

// ========================================
// Building from records
// ========================================

#[test]
fn test_select_projects_every_attribute() {
    let builder = SqlBuilder::from_record(&Record::<Business>::new());
    let (select, args) = builder.render_select("", &mut ParamCounter::new());

    assert_eq!(select, BUSINESS_COLUMNS);
    assert!(args.is_empty());
}

#[test]
fn test_numeric_attributes_project_as_float() {
    let builder = SqlBuilder::from_record(&Record::<Parcel>::new());
    let (select, _) = builder.render_select("", &mut ParamCounter::new());

    assert_eq!(
        select,
        "id, weight::float8 AS weight, price::float8 AS price, label"
    );
}

#[test]
fn test_explicit_null_is_omitted_from_where_and_insert() {
    let mut record = Record::<Business>::with_values([("username", "alice")]).unwrap();
    record.set("phone", SqlValue::Null).unwrap();
    let builder = SqlBuilder::from_record(&record);

    let (filter, args) = builder.render_where(" AND ", "", &mut ParamCounter::new());
    assert_eq!(filter, "username = $1");
    assert_eq!(args, vec![SqlValue::from("alice")]);

    let (columns, values, args) = builder.render_insert(&mut ParamCounter::new());
    assert_eq!(columns, "username");
    assert_eq!(values, "$1");
    assert_eq!(args.len(), 1);

    // Still projected
    let (select, _) = builder.render_select("", &mut ParamCounter::new());
    assert!(select.contains("phone"));
}

#[test]
fn test_read_only_attributes_only_filter() {
    let record = Record::<Business>::with_values([("id", SqlValue::from(7)), ("email", "a@b.c".into())])
        .unwrap();
    let builder = SqlBuilder::from_record(&record);

    let (filter, args) = builder.render_where(" AND ", "", &mut ParamCounter::new());
    assert_eq!(filter, "id = $1 AND email = $2");
    assert_eq!(args, vec![SqlValue::Integer(7), SqlValue::from("a@b.c")]);

    let (update, _) = builder.render_update("", &mut ParamCounter::new());
    assert_eq!(update, "email = $1");

    let (columns, _, _) = builder.render_insert(&mut ParamCounter::new());
    assert_eq!(columns, "email");
}

#[test]
fn test_list_values_filter_with_in() {
    let record = Record::<Business>::with_values([("id", vec![
        SqlValue::from(1),
        SqlValue::from(2),
        SqlValue::from(3),
    ])])
    .unwrap();
    let builder = SqlBuilder::from_record(&record);

    let (filter, args) = builder.render_where(" AND ", "", &mut ParamCounter::new());
    assert_eq!(filter, "id IN ($1, $2, $3)");
    assert_eq!(args.len(), 3);
}

// ========================================
// Clause bookkeeping
// ========================================

#[test]
fn test_empty_where_matches_everything() {
    let builder = SqlBuilder::new();
    let (filter, args) = builder.render_where(" AND ", "", &mut ParamCounter::new());
    assert_eq!(filter, "TRUE");
    assert!(args.is_empty());
}

#[test]
fn test_where_keeps_one_fragment_per_operator() {
    let mut builder = SqlBuilder::new();
    builder.add_where("id", Operator::Gte, Template::Param, vec![1.into()]);
    builder.add_where("id", Operator::Lt, Template::Param, vec![10.into()]);
    builder.add_where("id", Operator::Gte, Template::Param, vec![5.into()]);

    let (filter, args) = builder.render_where(" AND ", "t.", &mut ParamCounter::new());
    assert_eq!(filter, "t.id >= $1 AND t.id < $2");
    assert_eq!(args, vec![SqlValue::Integer(5), SqlValue::Integer(10)]);
}

#[test]
fn test_empty_list_matches_nothing() {
    let mut builder = SqlBuilder::new();
    builder.add_where("id", Operator::In, Template::List, vec![]);

    let (filter, args) = builder.render_where(" AND ", "", &mut ParamCounter::new());
    assert_eq!(filter, "id IN (NULL)");
    assert!(args.is_empty());
}

#[test]
fn test_readding_a_column_keeps_its_position() {
    let mut builder = SqlBuilder::new();
    builder.add_insert("a", Template::Param, vec![1.into()]);
    builder.add_insert("b", Template::Param, vec![2.into()]);
    builder.add_insert("a", Template::Param, vec![3.into()]);

    let (columns, values, args) = builder.render_insert(&mut ParamCounter::new());
    assert_eq!(columns, "a, b");
    assert_eq!(values, "$1, $2");
    assert_eq!(args, vec![SqlValue::Integer(3), SqlValue::Integer(2)]);
}

#[test]
fn test_delete_fragments() {
    let record = Record::<Business>::with_values([("username", "alice")]).unwrap();
    let mut builder = SqlBuilder::from_record(&record);

    assert!(builder.delete_where("username"));
    assert!(!builder.delete_where("username"));
    assert!(builder.delete_update("username"));
    assert!(builder.delete_insert("username"));
    assert!(builder.delete_select("created"));

    let (filter, _) = builder.render_where(" AND ", "", &mut ParamCounter::new());
    assert_eq!(filter, "TRUE");
    let (update, _) = builder.render_update("", &mut ParamCounter::new());
    assert_eq!(update, "");
    let (select, _) = builder.render_select("", &mut ParamCounter::new());
    assert!(!select.contains("created"));
}

// ========================================
// Placeholders
// ========================================

#[test]
fn test_counter_threads_across_clauses() {
    let record = Record::<Business>::with_values([("username", "bob"), ("email", "b@c.d")]).unwrap();
    let builder = SqlBuilder::from_record(&record);

    let mut params = ParamCounter::new();
    let (update, update_args) = builder.render_update("", &mut params);
    let (filter, where_args) = builder.render_where(" AND ", "", &mut params);

    assert_eq!(update, "username = $1, email = $2");
    assert_eq!(filter, "username = $3 AND email = $4");
    assert_eq!(params.issued(), update_args.len() + where_args.len());
}

#[test]
fn test_expression_templates() {
    let mut builder = SqlBuilder::new();
    builder.add_select(
        "distance",
        Some(Fragment::new(
            Template::expr("point(x, y) <-> point({}, {})"),
            vec![1.5.into(), 2.5.into()],
        )),
    );
    builder.add_select("label", None);

    let mut params = ParamCounter::starting_after(2);
    let (select, args) = builder.render_select("p.", &mut params);
    assert_eq!(select, "point(x, y) <-> point($3, $4) AS distance, p.label");
    assert_eq!(args.len(), 2);
    assert_eq!(params.next(), "$5");
}

#[test]
fn test_convert_args_drops_nulls() {
    assert_eq!(convert_args(&[1.into(), "a".into()]).map(|a| a.len()), Some(2));
    assert_eq!(convert_args(&[1.into(), SqlValue::Null]), None);
    assert_eq!(convert_args(&[]), Some(vec![]));
}

// ========================================
// Round trip
// ========================================

#[test]
fn test_returned_row_rebuilds_the_record() {
    let record = Record::<Session>::with_values([
        ("id", SqlValue::from("s-1")),
        ("lifetime", 3600.into()),
        ("set_cookie", true.into()),
    ])
    .unwrap();

    let builder = SqlBuilder::from_record(&record);
    let (filter, args) = builder.render_where(" AND ", "", &mut ParamCounter::new());
    assert_eq!(filter, "id = $1 AND lifetime = $2 AND set_cookie = $3");
    assert_eq!(args.len(), 3);

    let rebuilt = Record::<Session>::from_row(record.to_row());
    assert_eq!(rebuilt, record);
}
