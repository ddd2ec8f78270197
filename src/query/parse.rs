use serde_json::{Map, Value};

use super::condition::is_operator_map;
use super::constraint::{CmpOp, Constraint};
use super::types::{ConstraintMap, Term, WhereArg};
use crate::errors::QueryError;

/// Parse untyped where input: an object is the AND form, an array of objects the OR form.
///
/// # Errors
/// `InvalidArgument` for any other JSON type, for non-object array elements, and for
/// operator maps with malformed operands.
pub fn where_from_json(value: Value) -> Result<WhereArg, QueryError> {
    match value {
        Value::Object(map) => Ok(WhereArg::Fields(constraint_map(map)?)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => constraint_map(map),
                other => Err(QueryError::invalid(format!(
                    "where branch must be an object, got {}",
                    type_name(&other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(WhereArg::AnyOf),
        other => Err(QueryError::invalid(format!(
            "where argument must be an object or array, got {}",
            type_name(&other)
        ))),
    }
}

/// # Errors
/// Returns an error if the string is not JSON or not a valid where argument.
pub fn parse_where_json(json: &str) -> Result<WhereArg, QueryError> {
    let value: Value = serde_json::from_str(json)?;
    where_from_json(value)
}

fn constraint_map(map: Map<String, Value>) -> Result<ConstraintMap, QueryError> {
    let mut out = ConstraintMap::new();
    for (key, value) in map {
        match value {
            Value::Object(ops) if is_operator_map(&ops) && ops.keys().all(|k| is_known(k)) => {
                for c in operators_to_constraints(ops)? {
                    out = out.field(key.clone(), c);
                }
            }
            other => out = out.field(key, Term::Value(other)),
        }
    }
    Ok(out)
}

fn is_known(op: &str) -> bool {
    matches!(
        op,
        "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" | "$exists" | "$in" | "$nin" | "$all"
            | "$size" | "$regex" | "$options" | "$not"
    )
}

fn operators_to_constraints(mut ops: Map<String, Value>) -> Result<Vec<Constraint>, QueryError> {
    let options = match ops.remove("$options") {
        None => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => return Err(QueryError::invalid("$options must be a string")),
    };
    let mut out = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let c = match op.as_str() {
            "$eq" => Constraint::Eq(operand),
            "$ne" => Constraint::Cmp(CmpOp::Ne, operand),
            "$gt" => Constraint::Cmp(CmpOp::Gt, operand),
            "$gte" => Constraint::Cmp(CmpOp::Gte, operand),
            "$lt" => Constraint::Cmp(CmpOp::Lt, operand),
            "$lte" => Constraint::Cmp(CmpOp::Lte, operand),
            "$exists" => match operand {
                Value::Bool(b) => Constraint::Exists(b),
                _ => return Err(QueryError::invalid("$exists expects a boolean")),
            },
            "$in" => Constraint::In(array(operand, "$in")?),
            "$nin" => Constraint::NotIn(array(operand, "$nin")?),
            "$all" => Constraint::ContainsAll(array(operand, "$all")?),
            "$size" => operand
                .as_u64()
                .map(Constraint::SizeIs)
                .ok_or_else(|| QueryError::invalid("$size expects a non-negative integer"))?,
            "$regex" => match operand {
                Value::String(p) => Constraint::Matches { pattern: p, options: options.clone() },
                _ => return Err(QueryError::invalid("$regex expects a string")),
            },
            "$not" => match operand {
                Value::Object(inner) if is_operator_map(&inner) => {
                    let mut inner = operators_to_constraints(inner)?;
                    if inner.len() != 1 {
                        return Err(QueryError::invalid("$not expects exactly one operator"));
                    }
                    Constraint::not(inner.remove(0))
                }
                _ => return Err(QueryError::invalid("$not expects an operator object")),
            },
            other => return Err(QueryError::invalid(format!("unsupported operator {other}"))),
        };
        out.push(c);
    }
    if options.is_some() && !out.iter().any(|c| matches!(c, Constraint::Matches { .. })) {
        return Err(QueryError::invalid("$options requires $regex"));
    }
    // `$eq` folded after the other operators joins their map instead of forcing `$and`.
    out.sort_by_key(|c| matches!(c, Constraint::Eq(_)));
    Ok(out)
}

fn array(v: Value, op: &str) -> Result<Vec<Value>, QueryError> {
    match v {
        Value::Array(vs) => Ok(vs),
        _ => Err(QueryError::invalid(format!("{op} expects an array"))),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
