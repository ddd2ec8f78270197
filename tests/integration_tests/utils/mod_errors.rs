use objquery::errors::{QueryError, TransportError};
use objquery::query::command;
use objquery::query::parse_where_json;

#[test]
fn display_strings() {
    let e = TransportError::Http { status: 404, code: 101, message: "not found".into() };
    assert_eq!(e.to_string(), "HTTP 404 (code 101): not found");
    let q: QueryError = e.into();
    assert_eq!(q.to_string(), "HTTP 404 (code 101): not found");
    assert_eq!(QueryError::UnknownCommand("like".into()).to_string(), "unknown query command: like");
}

#[test]
fn argument_errors_are_classified() {
    let unknown = command::build("like", vec![]).unwrap_err();
    assert!(matches!(unknown, QueryError::UnknownCommand(ref n) if n == "like"));
    assert!(unknown.is_argument_error());
    assert!(command::build("", vec![]).unwrap_err().is_argument_error());
    assert!(parse_where_json("[1, 2]").unwrap_err().is_argument_error());
    let transport: QueryError = TransportError::InvalidResponse("x".into()).into();
    assert!(!transport.is_argument_error());
}

#[test]
fn bad_json_text_is_json_error() {
    assert!(matches!(parse_where_json("{nope"), Err(QueryError::Json(_))));
}
