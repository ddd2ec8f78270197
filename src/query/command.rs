//! Named constraint constructors for the `key, command, args...` form of `where`.

use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use super::constraint::Constraint;
use crate::errors::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Exists,
    NotExists,
    In,
    NotIn,
    ContainsAll,
    SizeIs,
    Matches,
    #[cfg(feature = "regex")]
    StartsWith,
    #[cfg(feature = "regex")]
    EndsWith,
    #[cfg(feature = "regex")]
    Contains,
    Not,
}

impl CommandKind {
    pub const ALL: &'static [CommandKind] = &[
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Exists,
        Self::NotExists,
        Self::In,
        Self::NotIn,
        Self::ContainsAll,
        Self::SizeIs,
        Self::Matches,
        #[cfg(feature = "regex")]
        Self::StartsWith,
        #[cfg(feature = "regex")]
        Self::EndsWith,
        #[cfg(feature = "regex")]
        Self::Contains,
        Self::Not,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Exists => "exists",
            Self::NotExists => "notExists",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::ContainsAll => "containsAll",
            Self::SizeIs => "sizeIs",
            Self::Matches => "matches",
            #[cfg(feature = "regex")]
            Self::StartsWith => "startsWith",
            #[cfg(feature = "regex")]
            Self::EndsWith => "endsWith",
            #[cfg(feature = "regex")]
            Self::Contains => "contains",
            Self::Not => "not",
        }
    }

    fn constructor(self) -> CommandFn {
        match self {
            Self::Eq => |a| one(a, "eq").map(Constraint::Eq),
            Self::Ne => |a| one(a, "ne").map(Constraint::ne),
            Self::Gt => |a| one(a, "gt").map(Constraint::gt),
            Self::Gte => |a| one(a, "gte").map(Constraint::gte),
            Self::Lt => |a| one(a, "lt").map(Constraint::lt),
            Self::Lte => |a| one(a, "lte").map(Constraint::lte),
            Self::Exists => |a| none(a, "exists").map(|()| Constraint::exists()),
            Self::NotExists => |a| none(a, "notExists").map(|()| Constraint::not_exists()),
            Self::In => |a| list(a, "in").map(Constraint::In),
            Self::NotIn => |a| list(a, "notIn").map(Constraint::NotIn),
            Self::ContainsAll => |a| list(a, "containsAll").map(Constraint::ContainsAll),
            Self::SizeIs => |a: Vec<Value>| {
                let v = one(a, "sizeIs")?;
                v.as_u64()
                    .map(Constraint::SizeIs)
                    .ok_or_else(|| QueryError::invalid("sizeIs expects a non-negative integer"))
            },
            Self::Matches => |a: Vec<Value>| {
                let mut it = a.into_iter();
                match (it.next(), it.next(), it.next()) {
                    (Some(Value::String(p)), None, None) => Ok(Constraint::matches(p, None)),
                    (Some(Value::String(p)), Some(Value::String(o)), None) => {
                        Ok(Constraint::matches(p, Some(&o)))
                    }
                    _ => Err(QueryError::invalid("matches expects a pattern and optional flags")),
                }
            },
            #[cfg(feature = "regex")]
            Self::StartsWith => |a| string(a, "startsWith").map(|s| Constraint::starts_with(&s)),
            #[cfg(feature = "regex")]
            Self::EndsWith => |a| string(a, "endsWith").map(|s| Constraint::ends_with(&s)),
            #[cfg(feature = "regex")]
            Self::Contains => |a| string(a, "contains").map(|s| Constraint::contains(&s)),
            Self::Not => |a: Vec<Value>| {
                let mut it = a.into_iter();
                let name = match it.next() {
                    Some(Value::String(s)) => s,
                    _ => return Err(QueryError::invalid("not expects a command name")),
                };
                build(&name, it.collect()).map(Constraint::not)
            },
        }
    }
}

impl FromStr for CommandKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REGISTRY
            .get(s)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| QueryError::UnknownCommand(s.to_string()))
    }
}

type CommandFn = fn(Vec<Value>) -> Result<Constraint, QueryError>;

static REGISTRY: LazyLock<HashMap<&'static str, (CommandKind, CommandFn)>> = LazyLock::new(|| {
    CommandKind::ALL.iter().map(|k| (k.name(), (*k, k.constructor()))).collect()
});

/// Build a constraint from a command name and its arguments.
///
/// # Errors
/// `InvalidArgument` for an empty name or wrong arguments, `UnknownCommand` for an
/// unregistered name.
pub fn build(command: &str, args: Vec<Value>) -> Result<Constraint, QueryError> {
    if command.is_empty() {
        return Err(QueryError::invalid("query command must not be empty"));
    }
    let (_, ctor) =
        REGISTRY.get(command).ok_or_else(|| QueryError::UnknownCommand(command.to_string()))?;
    ctor(args)
}

/// Registered command names, in declaration order.
#[must_use]
pub fn names() -> Vec<&'static str> {
    CommandKind::ALL.iter().map(|k| k.name()).collect()
}

fn one(args: Vec<Value>, name: &str) -> Result<Value, QueryError> {
    let mut it = args.into_iter();
    match (it.next(), it.next()) {
        (Some(v), None) => Ok(v),
        _ => Err(QueryError::invalid(format!("{name} expects exactly one argument"))),
    }
}

fn none(args: Vec<Value>, name: &str) -> Result<(), QueryError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(QueryError::invalid(format!("{name} takes no arguments")))
    }
}

/// Accepts either one array argument or the values spread as arguments.
fn list(args: Vec<Value>, name: &str) -> Result<Vec<Value>, QueryError> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::Array(vs)]) => Ok(vs),
        Ok([v]) => Ok(vec![v]),
        Err(args) if !args.is_empty() => Ok(args),
        Err(_) => Err(QueryError::invalid(format!("{name} expects at least one value"))),
    }
}

#[cfg(feature = "regex")]
fn string(args: Vec<Value>, name: &str) -> Result<String, QueryError> {
    match one(args, name)? {
        Value::String(s) => Ok(s),
        _ => Err(QueryError::invalid(format!("{name} expects a string"))),
    }
}
