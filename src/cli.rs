//! Programmatic command layer under the `objquery` binary.

use std::io::Write;

use crate::App;
use crate::decoder::Record;
use crate::errors::QueryError;
use crate::http::AuthOptions;
use crate::query::{Order, Query, parse_where_json};

/// Query shape shared by every subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pub class: String,
    pub where_json: Option<String>,
    /// `field`, `-field`, `field:asc` or `field:desc`.
    pub order: Vec<String>,
    pub select: Vec<String>,
    pub include: Vec<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub return_acl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Find { spec: QuerySpec, master: bool },
    First { spec: QuerySpec, master: bool },
    Count { spec: QuerySpec, master: bool },
    Scan { spec: QuerySpec, max_pages: Option<usize> },
}

/// Parse one `--order` token.
///
/// # Errors
/// `InvalidArgument` for an empty field or unknown direction.
pub fn parse_order(token: &str) -> Result<(String, Order), QueryError> {
    let (field, order) = match token.split_once(':') {
        Some((f, dir)) => (f, dir.parse::<Order>()?),
        None => match token.strip_prefix('-') {
            Some(f) => (f, Order::Desc),
            None => (token, Order::Asc),
        },
    };
    if field.is_empty() {
        return Err(QueryError::invalid(format!("empty order field in {token:?}")));
    }
    Ok((field.to_string(), order))
}

/// # Errors
/// Invalid where JSON or order tokens.
pub fn build_query(app: &App, spec: &QuerySpec) -> Result<Query, QueryError> {
    let mut q = app.query(spec.class.clone());
    if let Some(json) = &spec.where_json {
        q.filter(parse_where_json(json)?)?;
    }
    for token in &spec.order {
        let (field, order) = parse_order(token)?;
        q.order_by(&field, order);
    }
    q.select(spec.select.iter().cloned()).include(spec.include.iter().cloned());
    if let Some(n) = spec.skip {
        q.skip(n);
    }
    if let Some(n) = spec.limit {
        q.limit(n);
    }
    if spec.return_acl {
        q.return_acl(true);
    }
    Ok(q)
}

fn record_json(r: Record) -> serde_json::Value {
    let mut map = r.data;
    map.insert("className".into(), r.class_name.into());
    if let Some(id) = r.object_id {
        map.insert("objectId".into(), id.into());
    }
    if let Some(t) = r.created_at {
        map.insert("createdAt".into(), t.to_rfc3339().into());
    }
    if let Some(t) = r.updated_at {
        map.insert("updatedAt".into(), t.to_rfc3339().into());
    }
    if let Some(acl) = r.acl {
        map.insert("ACL".into(), acl);
    }
    serde_json::Value::Object(map)
}

fn write_records(out: &mut dyn Write, records: Vec<Record>) -> Result<(), QueryError> {
    for r in records {
        writeln!(out, "{}", record_json(r)).map_err(|e| QueryError::Io(e.to_string()))?;
    }
    Ok(())
}

fn auth(master: bool) -> AuthOptions {
    AuthOptions { use_master_key: master, ..AuthOptions::default() }
}

/// Run `cmd`, writing NDJSON records (or the count) to `out`.
///
/// # Errors
/// Argument, transport and decode errors, plus write failures as `Io`.
pub async fn run(app: &App, cmd: Command, out: &mut dyn Write) -> Result<(), QueryError> {
    match cmd {
        Command::Find { spec, master } => {
            let q = build_query(app, &spec)?;
            write_records(out, q.find(&auth(master)).await?)
        }
        Command::First { spec, master } => {
            let q = build_query(app, &spec)?;
            write_records(out, q.first(&auth(master)).await?.into_iter().collect())
        }
        Command::Count { spec, master } => {
            let q = build_query(app, &spec)?;
            let n = q.count(&auth(master)).await?;
            writeln!(out, "{n}").map_err(|e| QueryError::Io(e.to_string()))
        }
        Command::Scan { spec, max_pages } => {
            let q = build_query(app, &spec)?;
            let mut it = q.scan(AuthOptions::default());
            let mut pages = 0usize;
            while max_pages.is_none_or(|m| pages < m) {
                let page = it.next().await?;
                if page.done {
                    break;
                }
                pages += 1;
                write_records(out, page.value)?;
            }
            log::info!("scan {}: {pages} page(s)", spec.class);
            Ok(())
        }
    }
}
