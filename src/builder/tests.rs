//! Compile-level tests for the clause state machine, driven through a
//! stub handle so nothing reaches a real engine.

use async_trait::async_trait;
use std::collections::HashMap;

use super::QueryBuilder;
use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;
use crate::results::ResultSet;
use crate::translation::PlaceholderStyle;
use crate::types::SqlValue;
use crate::validate::ValidationOptions;

#[derive(Default, Debug)]
struct StubHandle {
    tables: Vec<String>,
    columns: HashMap<String, Vec<String>>,
}

impl StubHandle {
    fn with_schema(table: &str, columns: &[&str]) -> Self {
        let mut map = HashMap::new();
        map.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        Self {
            tables: vec![table.to_string()],
            columns: map,
        }
    }
}

#[async_trait]
impl DatabaseHandle for StubHandle {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }

    fn supports_introspection(&self) -> bool {
        true
    }

    fn supports_backup(&self) -> bool {
        false
    }

    async fn execute_batch(&mut self, _sql: &str) -> Result<(), SqlFluentError> {
        Ok(())
    }

    async fn execute_select(
        &mut self,
        _sql: &str,
        _params: &[SqlValue],
    ) -> Result<ResultSet, SqlFluentError> {
        Ok(ResultSet::default())
    }

    async fn execute_dml(
        &mut self,
        _sql: &str,
        _params: &[SqlValue],
    ) -> Result<usize, SqlFluentError> {
        Ok(1)
    }

    async fn last_insert_id(&mut self) -> Result<Option<i64>, SqlFluentError> {
        Ok(Some(7))
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, SqlFluentError> {
        Ok(self.tables.clone())
    }

    async fn table_columns(&mut self, table: &str) -> Result<Vec<String>, SqlFluentError> {
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    async fn table_definition(&mut self, _table: &str) -> Result<String, SqlFluentError> {
        Err(SqlFluentError::Unsupported("stub".to_string()))
    }
}

fn no_checks() -> ValidationOptions {
    ValidationOptions {
        tables: false,
        columns: false,
    }
}

#[tokio::test]
async fn select_compiles_exact_base_statement() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &["id", "name"])
        .await
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT id,name FROM users");
    assert!(qb.bind_params().is_empty());
}

#[tokio::test]
async fn select_defaults_to_star() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
}

#[tokio::test]
async fn first_where_fragment_drops_its_connector() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .and_where("age", 21i64, ">")
        .await
        .unwrap()
        .or_where("name", "alice", "=")
        .await
        .unwrap();
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE (age>?) OR (name=?)"
    );
    assert_eq!(
        qb.bind_params(),
        vec![SqlValue::Int(21), SqlValue::Text("alice".into())]
    );
}

#[tokio::test]
async fn between_with_empty_bound_is_dropped_silently() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .and_where(
            "age",
            vec![SqlValue::Text(String::new()), SqlValue::Int(30)],
            "between",
        )
        .await
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
    assert!(qb.bind_params().is_empty());
}

#[tokio::test]
async fn between_binds_both_bounds_in_order() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .and_where(
            "age",
            vec![SqlValue::Int(18), SqlValue::Int(30)],
            "not between",
        )
        .await
        .unwrap();
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE (age NOT BETWEEN ? AND ?)"
    );
    assert_eq!(qb.bind_params(), vec![SqlValue::Int(18), SqlValue::Int(30)]);
}

#[tokio::test]
async fn in_emits_one_placeholder_per_element() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .and_where(
            "id",
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)],
            "in",
        )
        .await
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT * FROM users WHERE (id IN (?,?,?))");
    assert_eq!(qb.bind_params().len(), 3);
}

#[tokio::test]
async fn empty_in_list_is_rejected() {
    let err = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .and_where("id", Vec::<SqlValue>::new(), "in")
        .await
        .unwrap_err();
    assert!(matches!(err, SqlFluentError::InvalidArgument(_)));
}

#[tokio::test]
async fn raw_where_fragment_is_kept_verbatim() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .and_where_raw("(age>18 OR role='admin')")
        .and_where("active", 1i64, "=")
        .await
        .unwrap();
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE (age>18 OR role='admin') AND (active=?)"
    );
}

#[tokio::test]
async fn update_binds_set_values_before_where_values() {
    let qb = QueryBuilder::update(
        StubHandle::default(),
        no_checks(),
        "t",
        &[("name", SqlValue::Text("X".into()))],
    )
    .await
    .unwrap()
    .and_where("id", "1", "=")
    .await
    .unwrap();
    assert_eq!(qb.to_sql(), "UPDATE t SET name=? WHERE (id=?)");
    assert_eq!(
        qb.bind_params(),
        vec![SqlValue::Text("X".into()), SqlValue::Text("1".into())]
    );
}

#[tokio::test]
async fn insert_compiles_explicit_column_form() {
    let qb = QueryBuilder::insert(
        StubHandle::default(),
        no_checks(),
        "users",
        &[
            ("name", SqlValue::Text("alice".into())),
            ("age", SqlValue::Int(30)),
        ],
    )
    .await
    .unwrap();
    assert_eq!(qb.to_sql(), "INSERT INTO users (name,age) VALUES (?,?)");
    assert_eq!(qb.bind_params().len(), 2);
}

#[tokio::test]
async fn insert_maps_empty_values_to_null() {
    let qb = QueryBuilder::insert(
        StubHandle::default(),
        no_checks(),
        "users",
        &[
            ("name", SqlValue::Text(String::new())),
            ("age", SqlValue::Int(30)),
        ],
    )
    .await
    .unwrap();
    assert_eq!(
        qb.bind_params(),
        vec![SqlValue::Null, SqlValue::Int(30)]
    );
}

#[tokio::test]
async fn positional_insert_omits_the_column_list() {
    let qb = QueryBuilder::insert_values(
        StubHandle::default(),
        no_checks(),
        "users",
        &[SqlValue::Null, SqlValue::Text("alice".into())],
    )
    .await
    .unwrap();
    assert_eq!(qb.to_sql(), "INSERT INTO users VALUES (?,?)");
}

#[tokio::test]
async fn empty_insert_data_is_rejected() {
    let err = QueryBuilder::insert(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlFluentError::InvalidArgument(_)));
}

#[tokio::test]
async fn limit_shapes() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .limit(10);
    assert_eq!(qb.to_sql(), "SELECT * FROM users LIMIT 10");

    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .limit_offset(10, 5);
    assert_eq!(qb.to_sql(), "SELECT * FROM users LIMIT 5 OFFSET 10");
}

#[tokio::test]
async fn order_by_requires_a_direction_unless_randomizing() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .order_by("RANDOM()", "")
        .await
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT * FROM users ORDER BY RANDOM()");

    let err = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .order_by("id", "sideways")
        .await
        .unwrap_err();
    assert!(matches!(err, SqlFluentError::InvalidArgument(_)));
}

#[tokio::test]
async fn order_by_terms_join_with_commas() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "users", &[])
        .await
        .unwrap()
        .order_by("age", "desc")
        .await
        .unwrap()
        .order_by("name", "asc")
        .await
        .unwrap();
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users ORDER BY age DESC,name ASC"
    );
}

#[tokio::test]
async fn having_is_only_emitted_with_group_by() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "orders", &[])
        .await
        .unwrap()
        .having("count(*) > 5")
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT * FROM orders");

    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "orders", &[])
        .await
        .unwrap()
        .group_by("customer")
        .await
        .unwrap()
        .having("count(*) > 5")
        .unwrap();
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM orders GROUP BY customer HAVING count(*) > 5"
    );
}

#[tokio::test]
async fn clause_order_is_fixed() {
    let qb = QueryBuilder::select(StubHandle::default(), no_checks(), "orders", &["customer"])
        .await
        .unwrap()
        .and_where("total", 100i64, ">")
        .await
        .unwrap()
        .group_by("customer")
        .await
        .unwrap()
        .having("count(*) > 1")
        .unwrap()
        .order_by("customer", "asc")
        .await
        .unwrap()
        .limit_offset(20, 10);
    assert_eq!(
        qb.to_sql(),
        "SELECT customer FROM orders WHERE (total>?) GROUP BY customer \
         HAVING count(*) > 1 ORDER BY customer ASC LIMIT 10 OFFSET 20"
    );
}

#[tokio::test]
async fn preview_substitutes_literals_in_bind_order() {
    let qb = QueryBuilder::update(
        StubHandle::default(),
        no_checks(),
        "t",
        &[("name", SqlValue::Text("X".into()))],
    )
    .await
    .unwrap()
    .and_where("id", 1i64, "=")
    .await
    .unwrap();
    assert_eq!(qb.preview(), "UPDATE t SET name='X' WHERE (id='1')");
}

#[tokio::test]
async fn validation_rejects_unknown_identifiers_before_dispatch() {
    let checks = ValidationOptions::default();

    let err = QueryBuilder::select(
        StubHandle::with_schema("users", &["id", "name"]),
        checks,
        "missing",
        &[],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SqlFluentError::NotFound(_)));

    let err = QueryBuilder::select(
        StubHandle::with_schema("users", &["id", "name"]),
        checks,
        "users",
        &[],
    )
    .await
    .unwrap()
    .and_where("age", 21i64, ">")
    .await
    .unwrap_err();
    assert!(matches!(err, SqlFluentError::NotFound(_)));
}

#[tokio::test]
async fn run_dispatches_by_action_and_surfaces_insert_id() {
    let qb = QueryBuilder::insert(
        StubHandle::default(),
        no_checks(),
        "users",
        &[("name", SqlValue::Text("alice".into()))],
    )
    .await
    .unwrap();
    let outcome = qb.run().await.unwrap();
    assert_eq!(outcome.rows_affected(), 1);
    assert_eq!(outcome.last_insert_id(), Some(7));
}

#[tokio::test]
async fn raw_statements_sniff_the_select_token() {
    let qb = QueryBuilder::raw(
        StubHandle::default(),
        no_checks(),
        "SeLeCt * FROM users",
        vec![],
    );
    let outcome = qb.run().await.unwrap();
    assert!(outcome.rows().is_some());

    let qb = QueryBuilder::raw(
        StubHandle::default(),
        no_checks(),
        "DELETE FROM users WHERE id = ?",
        vec![SqlValue::Int(1)],
    );
    let outcome = qb.run().await.unwrap();
    assert!(outcome.rows().is_none());
    assert_eq!(outcome.rows_affected(), 1);
}
