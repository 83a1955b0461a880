//! Per-endpoint query specifications.
//!
//! A [`QuerySpecification`] describes, for one root entity, which request
//! fields are filterable and how each becomes a [`Condition`], how the query
//! is scoped to a workspace, how rows are sorted and which joins both the
//! count and the data query share. It is built once when the endpoint is
//! wired and then only read, concurrently, by every request.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, IntoSimpleExpr, Order, QueryFilter, QueryOrder, Select,
    Value, sea_query::SimpleExpr,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

use super::{
    operators::FilteringOperator,
    request::{FilteringRequest, Predicate, SortRequest},
};

/// Builds the condition of one filter for a request. `None` means the filter
/// is absent from the request and matches every row.
type FilterFn<R> = Box<dyn Fn(&R) -> ResultEngine<Option<Condition>> + Send + Sync>;
type WorkspaceFilterFn = Box<dyn Fn(Uuid) -> Condition + Send + Sync>;
type AugmentFn<E> = Box<dyn Fn(Select<E>) -> Select<E> + Send + Sync>;

/// How raw string values of a column-bound filter are coerced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    /// Stored as its hyphenated string form.
    Uuid,
    /// `YYYY-MM-DD`.
    Date,
}

impl FieldKind {
    fn coerce(self, field: &str, raw: &str) -> ResultEngine<Value> {
        let invalid =
            || EngineError::Validation(format!("Invalid value '{raw}' for filter '{field}'"));
        Ok(match self {
            Self::Text => Value::from(raw.to_string()),
            Self::Integer => Value::from(raw.trim().parse::<i64>().map_err(|_| invalid())?),
            Self::Boolean => Value::from(raw.trim().parse::<bool>().map_err(|_| invalid())?),
            Self::Uuid => Value::from(
                Uuid::parse_str(raw.trim())
                    .map_err(|_| invalid())?
                    .to_string(),
            ),
            Self::Date => Value::from(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| invalid())?,
            ),
        })
    }
}

#[derive(Clone, Debug)]
struct SortClause {
    expr: SimpleExpr,
    order: Order,
}

pub struct QuerySpecification<E: EntityTrait, R> {
    filters: Vec<(String, FilterFn<R>)>,
    filter_tokens: HashSet<String>,
    operators: HashMap<String, Vec<FilteringOperator>>,
    sortable: HashMap<String, SimpleExpr>,
    default_sorting: Vec<SortClause>,
    workspace_filter: Option<WorkspaceFilterFn>,
    augment: Option<AugmentFn<E>>,
}

impl<E: EntityTrait, R> std::fmt::Debug for QuerySpecification<E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySpecification")
            .field("entity", &E::default().table_name())
            .field("filters", &self.filter_tokens)
            .field("sortable", &self.sortable.keys().collect::<Vec<_>>())
            .field("default_sorting", &self.default_sorting.len())
            .field("workspace_scoped", &self.workspace_filter.is_some())
            .finish()
    }
}

impl<E, R> QuerySpecification<E, R>
where
    E: EntityTrait,
    R: FilteringRequest,
{
    /// Return a builder for `QuerySpecification`.
    pub fn builder() -> QuerySpecificationBuilder<E, R> {
        QuerySpecificationBuilder::default()
    }

    pub fn has_workspace_filter(&self) -> bool {
        self.workspace_filter.is_some()
    }

    pub fn is_filterable(&self, token: &str) -> bool {
        self.filter_tokens.contains(token)
    }

    /// Reject predicates on fields this specification does not declare, and
    /// operators a field does not accept.
    pub fn validate_request(&self, request: &R) -> ResultEngine<()> {
        for predicate in request.predicates() {
            if !self.is_filterable(&predicate.field) {
                return Err(EngineError::Validation(format!(
                    "Unknown filter field: '{}'",
                    predicate.field
                )));
            }
            let accepted = self
                .operators
                .get(&predicate.field)
                .is_none_or(|allowed| allowed.contains(&predicate.operator));
            if !accepted {
                return Err(EngineError::Validation(format!(
                    "Unsupported filter operator: '{}' for field '{}'",
                    predicate.operator, predicate.field
                )));
            }
        }
        Ok(())
    }

    /// Conjunction of every registered filter and the workspace scope.
    ///
    /// `None` when nothing restricts the query.
    pub fn condition(
        &self,
        request: &R,
        workspace_id: Option<Uuid>,
    ) -> ResultEngine<Option<Condition>> {
        let mut parts = Vec::new();
        for (_, filter) in &self.filters {
            if let Some(condition) = filter(request)? {
                parts.push(condition);
            }
        }
        if let Some(condition) = self.workspace_condition(workspace_id)? {
            parts.push(condition);
        }

        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            parts
                .into_iter()
                .fold(Condition::all(), |all, part| all.add(part)),
        ))
    }

    fn workspace_condition(&self, workspace_id: Option<Uuid>) -> ResultEngine<Option<Condition>> {
        let Some(workspace_id) = workspace_id else {
            return Ok(None);
        };
        match &self.workspace_filter {
            Some(filter) => Ok(Some(filter(workspace_id))),
            None => {
                let table = E::default().table_name().to_string();
                tracing::error!(table, "workspace id supplied to an unscoped specification");
                Err(EngineError::Configuration(format!(
                    "workspace filter is not configured for '{table}'"
                )))
            }
        }
    }

    /// Root query with the shared augmentation and the filter conjunction.
    pub fn filtered_query(&self, request: &R, workspace_id: Option<Uuid>) -> ResultEngine<Select<E>> {
        let mut query = E::find();
        if let Some(augment) = &self.augment {
            query = augment(query);
        }
        if let Some(condition) = self.condition(request, workspace_id)? {
            query = query.filter(condition);
        }
        Ok(query)
    }

    /// Apply the request sort when its field is wired, then every default
    /// clause in registration order.
    pub fn apply_sorting(&self, mut query: Select<E>, sort: Option<&SortRequest>) -> Select<E> {
        if let Some(sort) = sort {
            match self.sortable.get(&sort.field) {
                Some(expr) => query = query.order_by(expr.clone(), sort.direction.order()),
                None => tracing::debug!(
                    field = %sort.field,
                    "sort field is not sortable, keeping default sorting"
                ),
            }
        }
        for clause in &self.default_sorting {
            query = query.order_by(clause.expr.clone(), clause.order.clone());
        }
        query
    }
}

/// The builder for `QuerySpecification`.
pub struct QuerySpecificationBuilder<E: EntityTrait, R> {
    filters: Vec<(String, FilterFn<R>)>,
    operators: Vec<(String, Vec<FilteringOperator>)>,
    sortable: Vec<(String, SimpleExpr)>,
    default_sorting: Vec<SortClause>,
    workspace_filter: Option<WorkspaceFilterFn>,
    augment: Option<AugmentFn<E>>,
}

impl<E: EntityTrait, R> Default for QuerySpecificationBuilder<E, R> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            operators: Vec::new(),
            sortable: Vec::new(),
            default_sorting: Vec::new(),
            workspace_filter: None,
            augment: None,
        }
    }
}

impl<E, R> QuerySpecificationBuilder<E, R>
where
    E: EntityTrait,
    R: FilteringRequest,
{
    /// Register a single-valued filter. `extract` returns `None` when the
    /// request does not filter on `token`.
    pub fn on_filter<V, X, B>(mut self, token: &str, extract: X, build: B) -> Self
    where
        X: Fn(&R) -> Option<V> + Send + Sync + 'static,
        B: Fn(V) -> Condition + Send + Sync + 'static,
    {
        let filter: FilterFn<R> = Box::new(move |request: &R| Ok(extract(request).map(&build)));
        self.filters.push((token.to_string(), filter));
        self
    }

    /// Register a multi-valued filter. An empty collection matches every row.
    pub fn on_filter_in<V, X, B>(mut self, token: &str, extract: X, build: B) -> Self
    where
        X: Fn(&R) -> Vec<V> + Send + Sync + 'static,
        B: Fn(Vec<V>) -> Condition + Send + Sync + 'static,
    {
        let filter: FilterFn<R> = Box::new(move |request: &R| {
            let values = extract(request);
            Ok((!values.is_empty()).then(|| build(values)))
        });
        self.filters.push((token.to_string(), filter));
        self
    }

    /// Bind `token` of the string grammar to a column. Every predicate on the
    /// token is coerced by `kind` and compared according to its operator; the
    /// predicates are combined with AND.
    pub fn on_column<C>(mut self, token: &str, column: C, kind: FieldKind) -> Self
    where
        C: ColumnTrait + Send + Sync + 'static,
    {
        let field = token.to_string();
        let filter: FilterFn<R> = Box::new(move |request: &R| {
            let mut condition: Option<Condition> = None;
            for predicate in request.predicates().iter().filter(|p| p.field == field) {
                if let Some(expr) = column_expr(&column, kind, predicate)? {
                    condition = Some(condition.unwrap_or_else(Condition::all).add(expr));
                }
            }
            Ok(condition)
        });
        self.filters.push((token.to_string(), filter));
        self
    }

    /// Accept only `operators` on the registered filter `token`. Without a
    /// restriction every operator reaches the filter.
    pub fn with_operators(mut self, token: &str, operators: &[FilteringOperator]) -> Self {
        self.operators.push((token.to_string(), operators.to_vec()));
        self
    }

    /// Register how the query is scoped to a workspace.
    pub fn workspace_filter<F>(mut self, build: F) -> Self
    where
        F: Fn(Uuid) -> Condition + Send + Sync + 'static,
    {
        self.workspace_filter = Some(Box::new(build));
        self
    }

    /// Append an ordering clause. Clauses apply in registration order, so
    /// the last ones break ties of the first.
    pub fn add_default_sorting<S>(mut self, expr: S, order: Order) -> Self
    where
        S: IntoSimpleExpr,
    {
        self.default_sorting.push(SortClause {
            expr: expr.into_simple_expr(),
            order,
        });
        self
    }

    /// Allow requests to sort on `token`.
    pub fn on_sort<S>(mut self, token: &str, expr: S) -> Self
    where
        S: IntoSimpleExpr,
    {
        self.sortable
            .push((token.to_string(), expr.into_simple_expr()));
        self
    }

    /// Structural changes (joins) shared by the count and the data query.
    pub fn configure<F>(mut self, augment: F) -> Self
    where
        F: Fn(Select<E>) -> Select<E> + Send + Sync + 'static,
    {
        self.augment = Some(Box::new(augment));
        self
    }

    /// Construct `QuerySpecification`
    pub fn build(self) -> ResultEngine<QuerySpecification<E, R>> {
        let table = E::default().table_name().to_string();

        let mut filter_tokens = HashSet::new();
        for (token, _) in &self.filters {
            if !filter_tokens.insert(token.clone()) {
                return Err(EngineError::Configuration(format!(
                    "filter '{token}' registered twice for '{table}'"
                )));
            }
        }

        let mut operators = HashMap::new();
        for (token, allowed) in self.operators {
            if !filter_tokens.contains(&token) {
                return Err(EngineError::Configuration(format!(
                    "operators restricted for unregistered filter '{token}' on '{table}'"
                )));
            }
            if operators.insert(token.clone(), allowed).is_some() {
                return Err(EngineError::Configuration(format!(
                    "operators of filter '{token}' restricted twice for '{table}'"
                )));
            }
        }

        let mut sortable = HashMap::new();
        for (token, expr) in self.sortable {
            if sortable.insert(token.clone(), expr).is_some() {
                return Err(EngineError::Configuration(format!(
                    "sort field '{token}' registered twice for '{table}'"
                )));
            }
        }

        Ok(QuerySpecification {
            filters: self.filters,
            filter_tokens,
            operators,
            sortable,
            default_sorting: self.default_sorting,
            workspace_filter: self.workspace_filter,
            augment: self.augment,
        })
    }
}

fn column_expr<C: ColumnTrait>(
    column: &C,
    kind: FieldKind,
    predicate: &Predicate,
) -> ResultEngine<Option<SimpleExpr>> {
    let field = predicate.field.as_str();
    if predicate.operator.is_multi_valued() {
        if predicate.is_empty() {
            return Ok(None);
        }
        let values = predicate
            .values
            .iter()
            .map(|raw| kind.coerce(field, raw))
            .collect::<ResultEngine<Vec<_>>>()?;
        return Ok(Some(column.is_in(values)));
    }

    let Some(raw) = predicate.value() else {
        return Ok(None);
    };
    let value = kind.coerce(field, raw)?;
    Ok(Some(match predicate.operator {
        FilteringOperator::Eq => column.eq(value),
        FilteringOperator::Goe => column.gte(value),
        FilteringOperator::Loe => column.lte(value),
        FilteringOperator::In => column.is_in([value]),
    }))
}
