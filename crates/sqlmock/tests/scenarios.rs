use sqlmock::{
    Error, FromValue, MockConfig, MockErrorKind, MockResult, QueryMatcher, Rows, Value,
};

const USER_QUERY: &str = "
		SELECT
			name,
			email,
			address,
			anotherfield
		FROM user
		where
			name    = 'John'
			and
			address = 'Jakarta'

	";

#[test]
fn strict_order_rejects_reversed_calls() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_query("^SELECT a").unwrap().will_return_rows(Rows::new(["a"]));
    mock.expect_query("^SELECT b").unwrap().will_return_rows(Rows::new(["b"]));

    let err = conn.query_sync("SELECT b FROM t", &[]).unwrap_err();
    assert_eq!(err.mock_kind(), Some(MockErrorKind::UnexpectedCall));
    assert!(mock.expectations_were_met().is_err());
}

#[test]
fn unordered_mode_accepts_any_order_exactly_once() {
    let (conn, mock) = sqlmock::new_with_config(MockConfig::new().ordered(false)).unwrap();
    mock.expect_query("^SELECT a").unwrap().will_return_rows(Rows::new(["a"]));
    mock.expect_query("^SELECT b").unwrap().will_return_rows(Rows::new(["b"]));

    conn.query_sync("SELECT b FROM t", &[]).unwrap();
    conn.query_sync("SELECT a FROM t", &[]).unwrap();
    mock.expectations_were_met().unwrap();

    let err = conn.query_sync("SELECT a FROM t", &[]).unwrap_err();
    assert_eq!(err.mock_kind(), Some(MockErrorKind::UnexpectedCall));
    assert!(
        err.to_string()
            .starts_with("all expectations were already fulfilled")
    );
}

#[test]
fn round_trip_rows() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_query("^SELECT name FROM user$")
        .unwrap()
        .will_return_rows(mock.new_rows(["name"]).add_row(["Ann"]));

    let mut cursor = conn.query_sync("SELECT name FROM user", &[]).unwrap();
    assert_eq!(cursor.columns(), ["name".to_string()]);
    let row = cursor.next().unwrap().unwrap();
    assert_eq!(row.values().cloned().collect::<Vec<_>>(), vec![Value::Text("Ann".into())]);
    assert!(cursor.next().is_none());
    cursor.close().unwrap();
    mock.expectations_were_met().unwrap();
}

#[test]
fn error_result_injection() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_exec("^INSERT (.+)")
        .unwrap()
        .will_return_result(MockResult::error(Error::Custom("disk full".into())));

    let result = conn.exec_sync("INSERT something", &[]).unwrap();
    let err = result.last_insert_id().unwrap_err();
    assert_eq!(err.to_string(), "disk full");
    assert!(matches!(err, Error::Custom(_)));
    mock.expectations_were_met().unwrap();
}

#[test]
fn multiline_query_matches_itself() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_query(USER_QUERY).unwrap();
    mock.expect_exec(USER_QUERY).unwrap();
    mock.expect_prepare(USER_QUERY).unwrap();

    // No rows or result configured: the calls fail but still count.
    let _ = conn.query_sync(USER_QUERY, &[]);
    let _ = conn.exec_sync(USER_QUERY, &[]);
    conn.prepare_sync(USER_QUERY).unwrap();

    mock.expectations_were_met().unwrap();
}

#[test]
fn reflowed_sql_does_not_match_literal_pattern() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_query("SELECT name, email FROM user")
        .unwrap()
        .will_return_rows(Rows::new(["name", "email"]));

    assert!(
        conn.query_sync("SELECT name,\n  email FROM user", &[])
            .is_err()
    );
}

#[test]
fn equal_matcher_requires_the_same_text() {
    let config = MockConfig::new().query_matcher(QueryMatcher::Equal);
    let (conn, mock) = sqlmock::new_with_config(config).unwrap();
    mock.expect_query("SELECT * FROM users WHERE id = ?")
        .unwrap()
        .will_return_rows(Rows::new(["id"]));

    assert!(conn.query_sync("SELECT * FROM users", &[]).is_err());
    conn.query_sync("SELECT * FROM users WHERE id = ?", &[]).unwrap();
    mock.expectations_were_met().unwrap();
}

fn text_and_arrays_only(value: &Value) -> sqlmock::Result<Value> {
    match value {
        Value::Text(_) | Value::Int(_) | Value::BigInt(_) => Ok(value.clone()),
        Value::Array(items) if items.iter().all(|v| matches!(v, Value::Text(_))) => {
            Ok(value.clone())
        }
        other => Err(Error::Custom(format!(
            "cannot convert {} with value {}",
            other.type_name(),
            other
        ))),
    }
}

#[test]
fn custom_converter_query_scan() {
    let config = MockConfig::new().converter(text_and_arrays_only);
    let (conn, mock) = sqlmock::new_with_config(config).unwrap();

    let tags = vec!["Three".to_string(), "Four".to_string()];
    mock.expect_query(USER_QUERY).unwrap().will_return_rows(
        Rows::new(["One", "Two", "Three"]).add_row([
            Value::from("ValueOne"),
            Value::from(2),
            Value::from(tags.clone()),
        ]),
    );

    let row = conn
        .query_sync(USER_QUERY, &[])
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(row.get_as::<String>(0).unwrap(), "ValueOne");
    assert_eq!(row.get_as::<i32>(1).unwrap(), 2);
    assert_eq!(Vec::<String>::from_value(row.get(2).unwrap()).unwrap(), tags);
    mock.expectations_were_met().unwrap();
}

#[test]
fn custom_converter_rejections_are_mismatches() {
    let config = MockConfig::new().converter(text_and_arrays_only);
    let (conn, mock) = sqlmock::new_with_config(config).unwrap();
    mock.expect_exec("^UPDATE")
        .unwrap()
        .with_args([Value::Bool(true)])
        .will_return_result(MockResult::new(0, 1));

    let err = conn.exec_sync("UPDATE t SET a = ?", &[Value::Bool(true)]).unwrap_err();
    assert_eq!(err.mock_kind(), Some(MockErrorKind::ArgumentMismatch));
}

#[test]
fn configured_query_error_is_returned_as_is() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_query("^SELECT")
        .unwrap()
        .will_return_error(Error::database("relation \"users\" does not exist"));

    let err = conn.query_sync("SELECT * FROM users", &[]).unwrap_err();
    assert!(matches!(err, Error::Query(_)));
    assert_eq!(err.mock_kind(), None);
    assert_eq!(err.to_string(), "relation \"users\" does not exist");
    mock.expectations_were_met().unwrap();
}

#[test]
fn row_errors_surface_while_iterating() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_query("^SELECT id")
        .unwrap()
        .will_return_rows(
            Rows::new(["id"])
                .add_rows([[1], [2], [3]])
                .row_error(2, Error::Custom("connection reset".into())),
        );

    let results: Vec<_> = conn.query_sync("SELECT id FROM t", &[]).unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_ok());
    assert_eq!(results[2].as_ref().unwrap_err().to_string(), "connection reset");
}

#[test]
fn unmet_expectations_are_listed_in_declaration_order() {
    let (conn, mock) = sqlmock::new().unwrap();
    mock.expect_begin();
    mock.expect_exec("^INSERT INTO orders").unwrap().will_return_result(MockResult::new(1, 1));
    mock.expect_commit();

    conn.begin_sync().unwrap();

    let err = mock.expectations_were_met().unwrap_err();
    assert_eq!(err.mock_kind(), Some(MockErrorKind::UnmetExpectations));
    assert_eq!(
        err.to_string(),
        "there are remaining expectations which were not met\n  1. Exec matching '^INSERT INTO orders'\n  2. Commit"
    );
}
