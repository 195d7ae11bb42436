use super::*;
use crate::value::Param;
use serde_json::json;

#[test]
fn id_escapes() {
    assert_eq!(id("users").to_sql(), "users");
    assert_eq!(id("user").to_sql(), r#""user""#);
    assert_eq!(id("user").param_count(), 0);
}

#[test]
fn unsafe_sql_is_verbatim() {
    let f = unsafe_sql("now() - interval '1 day'");
    assert_eq!(f.to_sql(), "now() - interval '1 day'");
    assert_eq!(f.param_count(), 0);
}

#[test]
fn positional_values() {
    let f = values(vec![vec![1, 2], vec![3, 4]]).unwrap();
    assert_eq!(f.to_sql(), "VALUES ($1, $2), ($3, $4)");
    assert_eq!(
        f.params(),
        &[Param::Int(1), Param::Int(2), Param::Int(3), Param::Int(4)]
    );
}

#[test]
fn positional_values_empty_is_error() {
    let err = values(Vec::<Vec<i32>>::new()).unwrap_err();
    assert!(err.is_empty_input());
}

#[test]
fn keyed_values_with_explicit_columns() {
    let rows = [json!({"id": 1, "name": "A", "extra": true}), json!({"name": "B", "id": 2})];
    let f = values_of(&rows, Some(&["id", "name"])).unwrap();
    assert_eq!(f.to_sql(), "VALUES ($1, $2), ($3, $4)");
    assert_eq!(
        f.params(),
        &[
            Param::Int(1),
            Param::Text("A".into()),
            Param::Int(2),
            Param::Text("B".into())
        ]
    );
}

#[test]
fn keyed_values_errors() {
    let empty: [serde_json::Value; 0] = [];
    assert!(values_of(&empty, None).unwrap_err().is_empty_input());
    assert!(values_of(&[json!({})], None).unwrap_err().is_no_columns());
    assert!(
        values_of(&[json!({"id": 1})], Some(&[]))
            .unwrap_err()
            .is_no_columns()
    );
}

#[test]
fn missing_column_names_row_and_column() {
    let rows = [json!({"id": 1, "name": "A"}), json!({"id": 2})];
    let err = values_of(&rows, Some(&["id", "name"])).unwrap_err();
    match err {
        Error::MissingColumn { row, column } => {
            assert_eq!(row, r#"{"id":2}"#);
            assert_eq!(column, "name");
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn default_columns_come_from_first_row() {
    let rows = [json!({"id": 1, "name": "A"}), json!({"id": 2})];
    let err = values_of(&rows, None).unwrap_err();
    assert!(err.is_missing_column());

    // extra keys on later rows are ignored
    let rows = [json!({"id": 1}), json!({"id": 2, "name": "B"})];
    assert_eq!(values_of(&rows, None).unwrap().to_sql(), "VALUES ($1), ($2)");
}

#[test]
fn values_table_aliases_and_escapes() {
    let rows = [json!({"id": 1, "Name": "A"}), json!({"id": 2, "Name": "B"})];
    let f = values_table("v", &rows, None).unwrap();
    assert_eq!(
        f.to_sql(),
        r#"(VALUES ($1, $2), ($3, $4)) AS v(id, "Name")"#
    );

    let f = values_table("select", &rows, Some(&["id"])).unwrap();
    assert_eq!(f.to_sql(), r#"(VALUES ($1), ($2)) AS "select"(id)"#);
}

#[test]
fn values_table_empty_is_error() {
    let empty: Vec<serde_json::Value> = Vec::new();
    assert!(values_table("t", &empty, None).unwrap_err().is_empty_input());
}

#[test]
fn insert_values_default_columns() {
    let rows = [
        json!({"name": "Alice", "age": 25}),
        json!({"name": "Bob", "age": 30}),
    ];
    let f = insert_values(&rows, None).unwrap();
    assert_eq!(f.to_sql(), "(name, age) VALUES ($1, $2), ($3, $4)");
    assert_eq!(
        f.params(),
        &[
            Param::Text("Alice".into()),
            Param::Int(25),
            Param::Text("Bob".into()),
            Param::Int(30)
        ]
    );
}

#[test]
fn insert_values_escapes_columns() {
    let rows = vec![vec![("order", Value::from(1)), ("first name", Value::from("x"))]];
    let f = insert_values(&rows, None).unwrap();
    assert_eq!(f.to_sql(), r#"("order", "first name") VALUES ($1, $2)"#);
}

#[test]
fn insert_values_empty_is_error() {
    let empty: Vec<serde_json::Value> = Vec::new();
    assert!(insert_values(&empty, None).unwrap_err().is_empty_input());
}

#[test]
fn array_cells_serialize_as_arrays() {
    let rows = [json!({"tags": ["a", "b"]})];
    let f = insert_values(&rows, None).unwrap();
    assert_eq!(f.to_sql(), "(tags) VALUES (ARRAY[$1, $2])");
}

#[test]
fn list_of_scalars() {
    let f = list([1, 2, 3]).unwrap();
    assert_eq!(f.to_sql(), "($1, $2, $3)");
    assert!(list(Vec::<i32>::new()).unwrap_err().is_empty_input());
}

#[test]
fn list_by_projects_key() {
    let rows = [json!({"id": 7}), json!({"id": 9})];
    let f = list_by(&rows, "id").unwrap();
    assert_eq!(f.to_sql(), "($1, $2)");
    assert_eq!(f.params(), &[Param::Int(7), Param::Int(9)]);

    assert!(list_by(&rows, "name").unwrap_err().is_missing_column());
    let empty: [serde_json::Value; 0] = [];
    assert!(list_by(&empty, "id").unwrap_err().is_empty_input());
}

#[test]
fn join_semantics() {
    assert!(join(Separator::And, Vec::new()).is_empty());

    let mut f1 = Fragment::literal("a = ");
    f1.push_value(1);
    assert_eq!(join(Separator::And, [f1.clone()]), f1);

    assert_eq!(comma([id("a"), id("b")]).to_sql(), "a, b");

    let mut f2 = Fragment::literal("b = ");
    f2.push_value(2);
    assert_eq!(and([f1.clone(), f2.clone()]).to_sql(), "a = $1 AND b = $2");
    assert_eq!(or([f1, f2]).to_sql(), "a = $1 OR b = $2");
}
