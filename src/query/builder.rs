use serde_json::Value;
use std::future::Future;

use super::command;
use super::condition::Condition;
use super::cursor::ScanIterator;
use super::parse::where_from_json;
use super::types::{
    ConstraintMap, CountResponse, ListResponse, Order, QueryParams, WhereArg,
};
use crate::App;
use crate::decoder::{Decoder, RecordDecoder};
use crate::errors::{QueryError, TransportError};
use crate::http::{AuthOptions, HttpRequest};

/// Fluent query against one collection.
///
/// Configuration methods mutate the builder in place and return it for chaining;
/// `find`, `first`, `count` and `scan` read its current state.
///
/// ```no_run
/// # async fn demo(app: objquery::App) -> Result<(), objquery::QueryError> {
/// use objquery::query::{Constraint, ConstraintMap, Order};
/// let mut q = app.query("Post");
/// q.filter(ConstraintMap::new().field("status", "published").field("likes", Constraint::gt(10)))?
///     .order_by("createdAt", Order::Desc)
///     .limit(20);
/// let posts = q.find(&Default::default()).await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Query<D: Decoder = RecordDecoder> {
    app: App,
    class_name: String,
    decoder: D,
    order: Vec<String>,
    include: Vec<String>,
    keys: Vec<String>,
    condition: Condition,
    skip: Option<i64>,
    limit: Option<i64>,
    return_acl: Option<bool>,
}

fn add_unique(set: &mut Vec<String>, key: String) {
    if !set.contains(&key) {
        set.push(key);
    }
}

fn joined(set: &[String]) -> Option<String> {
    if set.is_empty() { None } else { Some(set.join(",")) }
}

fn invalid_response(e: serde_json::Error) -> QueryError {
    TransportError::InvalidResponse(e.to_string()).into()
}

impl<D: Decoder> Query<D> {
    pub fn new(app: App, class_name: impl Into<String>, decoder: D) -> Self {
        Self {
            app,
            class_name: class_name.into(),
            decoder,
            order: Vec::new(),
            include: Vec::new(),
            keys: Vec::new(),
            condition: Condition::new(),
            skip: None,
            limit: None,
            return_acl: None,
        }
    }

    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Current condition, or `None` when nothing has been constrained.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        (!self.condition.is_empty()).then_some(&self.condition)
    }

    pub fn set_condition(&mut self, condition: Condition) -> &mut Self {
        self.condition = condition;
        self
    }

    /// Fold constraints into the condition.
    ///
    /// - [`WhereArg::Fields`]: every entry is ANDed into the current condition.
    /// - [`WhereArg::AnyOf`]: each branch is folded from the current condition on
    ///   its own; empty results are dropped, a single survivor replaces the
    ///   condition and several survivors are combined under `$or`.
    /// - [`WhereArg::Command`]: sugar for `Fields` with one named constraint.
    ///
    /// Empty inputs leave the query unchanged.
    ///
    /// # Errors
    /// `InvalidArgument` for malformed input and `UnknownCommand` for an
    /// unregistered command name. The query is unchanged on error.
    pub fn filter(&mut self, arg: impl Into<WhereArg>) -> Result<&mut Self, QueryError> {
        match arg.into() {
            WhereArg::Fields(map) => {
                if !map.is_empty() {
                    let base = std::mem::take(&mut self.condition);
                    self.condition = map.fold_into(base);
                }
            }
            WhereArg::AnyOf(branches) => {
                if !branches.iter().any(ConstraintMap::has_defined_terms) {
                    return Ok(self);
                }
                let mut survivors: Vec<Condition> = branches
                    .into_iter()
                    .map(|m| m.fold_into(self.condition.clone()))
                    .filter(|c| !c.is_empty())
                    .collect();
                match survivors.len() {
                    0 => {}
                    1 => self.condition = survivors.remove(0),
                    _ => self.condition = Condition::any_of(survivors),
                }
            }
            WhereArg::Command { key, command, args } => {
                let c = command::build(&command, args)?;
                return self.filter(ConstraintMap::new().field(key, c));
            }
            WhereArg::Json(v) => {
                let parsed = where_from_json(v)?;
                return self.filter(parsed);
            }
        }
        Ok(self)
    }

    /// `where(key, command, args...)`.
    ///
    /// # Errors
    /// See [`Query::filter`].
    pub fn filter_cmd(
        &mut self,
        key: impl Into<String>,
        command: &str,
        args: Vec<Value>,
    ) -> Result<&mut Self, QueryError> {
        self.filter(WhereArg::Command { key: key.into(), command: command.to_string(), args })
    }

    pub fn select<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for k in keys {
            add_unique(&mut self.keys, k.into());
        }
        self
    }

    pub fn include<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for k in keys {
            add_unique(&mut self.include, k.into());
        }
        self
    }

    /// No range check; the server validates.
    pub fn skip(&mut self, n: i64) -> &mut Self {
        self.skip = Some(n);
        self
    }

    /// No range check; the server validates.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    /// A field appears in the order list in at most one direction.
    pub fn order_by(&mut self, key: &str, order: Order) -> &mut Self {
        let desc = format!("-{key}");
        let (add, drop) = match order {
            Order::Asc => (key.to_string(), desc),
            Order::Desc => (desc, key.to_string()),
        };
        add_unique(&mut self.order, add);
        self.order.retain(|k| *k != drop);
        self
    }

    /// # Errors
    /// `InvalidArgument` unless `direction` is `asc` or `desc`.
    pub fn order_by_str(&mut self, key: &str, direction: &str) -> Result<&mut Self, QueryError> {
        let order: Order = direction.parse()?;
        Ok(self.order_by(key, order))
    }

    pub fn return_acl(&mut self, enable: bool) -> &mut Self {
        self.return_acl = Some(enable);
        self
    }

    #[must_use]
    pub fn params(&self) -> QueryParams {
        QueryParams {
            condition: self.condition().cloned(),
            skip: self.skip,
            limit: self.limit,
            order: joined(&self.order),
            include: joined(&self.include),
            keys: joined(&self.keys),
            return_acl: self.return_acl.filter(|b| *b),
            ..QueryParams::default()
        }
    }

    /// # Errors
    /// Propagates the decoder's error.
    pub fn decode_object(&self, data: Value) -> Result<D::Output, QueryError> {
        self.decoder.decode(&self.app, data, &self.class_name)
    }

    fn listing_path(&self) -> String {
        format!("/1.1/classes/{}", self.class_name)
    }

    async fn fetch(&self, params: QueryParams, options: &AuthOptions) -> Result<Vec<D::Output>, QueryError> {
        let body = self.app.request(HttpRequest::get(self.listing_path(), params), options).await?;
        let resp: ListResponse = serde_json::from_value(body).map_err(invalid_response)?;
        log::debug!("find {}: {} result(s)", self.class_name, resp.results.len());
        resp.results.into_iter().map(|r| self.decode_object(r)).collect()
    }

    /// # Errors
    /// Transport and decode failures.
    pub async fn find(&self, options: &AuthOptions) -> Result<Vec<D::Output>, QueryError> {
        self.fetch(self.params(), options).await
    }

    /// First matching record, fetched with `limit = 1`. The builder's own limit is
    /// never touched.
    ///
    /// # Errors
    /// Transport and decode failures.
    pub async fn first(&self, options: &AuthOptions) -> Result<Option<D::Output>, QueryError> {
        let params = QueryParams { limit: Some(1), ..self.params() };
        Ok(self.fetch(params, options).await?.into_iter().next())
    }

    /// # Errors
    /// Transport failures.
    pub async fn count(&self, options: &AuthOptions) -> Result<u64, QueryError> {
        let params = QueryParams { limit: Some(0), count: Some(1), ..self.params() };
        let body = self.app.request(HttpRequest::get(self.listing_path(), params), options).await?;
        let resp: CountResponse = serde_json::from_value(body).map_err(invalid_response)?;
        Ok(resp.count)
    }

    /// Snapshot limit and condition into a cursor scan.
    ///
    /// The scan endpoint requires master credentials, so `use_master_key` is always
    /// forced on regardless of `options`.
    #[must_use]
    pub fn scan(&self, mut options: AuthOptions) -> ScanIterator<D> {
        if !options.use_master_key {
            log::debug!("scan {}: forcing master credentials", self.class_name);
        }
        options.use_master_key = true;
        ScanIterator::new(
            self.app.clone(),
            self.class_name.clone(),
            self.decoder.clone(),
            self.limit,
            self.condition().cloned(),
            options,
        )
    }

    /// Visit every scanned record in order with its running index.
    ///
    /// # Errors
    /// Stops at the first transport, decode or callback error.
    pub async fn each<F, Fut>(&self, options: AuthOptions, mut f: F) -> Result<usize, QueryError>
    where
        F: FnMut(D::Output, usize) -> Fut,
        Fut: Future<Output = Result<(), QueryError>>,
    {
        let mut it = self.scan(options);
        let mut index = 0usize;
        loop {
            let page = it.next().await?;
            if page.done {
                return Ok(index);
            }
            for item in page.value {
                f(item, index).await?;
                index += 1;
            }
        }
    }
}
