//! Evaluation of parsed chains against a live session.

use super::relation::{End, JoinKind};
use super::{parse, Call, ExpressionError, Literal, Relation};
use crate::binding::{inflect, AssociationKind, EntityBinding};
use crate::connection::Session;
use crate::db::{ColumnInfo, QueryResult, Row, Value};
use rust_decimal::Decimal;
use tracing::debug;

type Result<T> = std::result::Result<T, ExpressionError>;

/// Outcome of evaluating one chain (or one step of it).
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    /// A bare entity type, e.g. `Course`.
    Type(EntityBinding),
    Relation(Relation),
    /// `where` with no arguments, waiting for `.not(...)`.
    WhereChain(Relation),
    Records(Records),
    Record(Record),
    /// Single-column `pluck`, `ids` and similar.
    Values(Vec<Value>),
    /// Multi-column `pluck`.
    Tuples(Vec<Vec<Value>>),
    Scalar(Value),
    /// Grouped calculation: group key to aggregate.
    Grouped(Vec<(String, Value)>),
}

/// Loaded rows of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Records {
    pub entity: EntityBinding,
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
    /// Statement the rows were loaded with.
    pub sql: Option<String>,
}

impl Records {
    fn from_result(entity: EntityBinding, result: QueryResult, sql: Option<String>) -> Self {
        Self {
            entity,
            columns: result.columns,
            rows: result.rows,
            sql,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn record(&self, index: usize) -> Option<Record> {
        self.rows.get(index).map(|row| Record {
            entity: self.entity.clone(),
            columns: self.columns.clone(),
            row: row.clone(),
        })
    }
}

/// One loaded row of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub entity: EntityBinding,
    pub columns: Vec<ColumnInfo>,
    pub row: Row,
}

impl Record {
    /// Attribute value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .and_then(|i| self.row.get(i))
    }
}

/// Evaluates expressions against the session's bindings and connection.
pub struct Evaluator<'s> {
    session: &'s Session,
}

impl<'s> Evaluator<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Parses and evaluates `source`.
    pub async fn evaluate(&self, source: &str) -> Result<Evaluated> {
        let chain = parse(source)?;
        let root = chain.root();
        let entity = self
            .session
            .registry()
            .entity(&root)
            .ok_or_else(|| ExpressionError::unknown_name(format!("uninitialized constant {root}")))?
            .clone();

        let mut current = Evaluated::Type(entity);
        for call in &chain.calls {
            debug!(method = %call.method, "Evaluating expression step");
            current = self.apply(current, call).await?;
        }
        Ok(current)
    }

    /// `LearnHub::Course(id: integer, title: string)`.
    pub async fn type_signature(&self, entity: &EntityBinding) -> Result<String> {
        let columns = self.session.client().columns(&entity.table).await?;
        let fields: Vec<String> = columns
            .iter()
            .map(|c| format!("{}: {}", c.name, c.logical_type))
            .collect();
        Ok(format!("{}({})", self.qualified(entity), fields.join(", ")))
    }

    async fn apply(&self, current: Evaluated, call: &Call) -> Result<Evaluated> {
        match current {
            Evaluated::Type(entity) => self.apply_type(entity, call).await,
            Evaluated::Relation(relation) => self.apply_relation(relation, call).await,
            Evaluated::WhereChain(relation) => match call.method.as_str() {
                "not" => Ok(Evaluated::Relation(where_clause(relation, &call.args, true)?)),
                _ => Err(undefined(call, "a where chain")),
            },
            Evaluated::Record(record) => self.apply_record(record, call).await,
            Evaluated::Records(records) => apply_records(records, call),
            Evaluated::Values(values) => apply_values(values, call),
            Evaluated::Tuples(tuples) => match call.method.as_str() {
                "count" | "size" | "length" => Ok(count_value(tuples.len())),
                "first" => Ok(tuples
                    .into_iter()
                    .next()
                    .map(Evaluated::Values)
                    .unwrap_or(Evaluated::Scalar(Value::Null))),
                "last" => Ok(tuples
                    .into_iter()
                    .last()
                    .map(Evaluated::Values)
                    .unwrap_or(Evaluated::Scalar(Value::Null))),
                _ => Err(undefined(call, "an array")),
            },
            Evaluated::Scalar(value) => apply_scalar(value, call),
            Evaluated::Grouped(groups) => match call.method.as_str() {
                "count" | "size" | "length" => Ok(count_value(groups.len())),
                "keys" => Ok(Evaluated::Values(
                    groups.into_iter().map(|(k, _)| Value::String(k)).collect(),
                )),
                "values" => Ok(Evaluated::Values(
                    groups.into_iter().map(|(_, v)| v).collect(),
                )),
                _ => Err(undefined(call, "a hash")),
            },
        }
    }

    async fn apply_type(&self, entity: EntityBinding, call: &Call) -> Result<Evaluated> {
        match call.method.as_str() {
            "table_name" => Ok(Evaluated::Scalar(Value::String(entity.table.clone()))),
            "primary_key" => Ok(Evaluated::Scalar(Value::String(entity.primary_key.clone()))),
            "name" => Ok(Evaluated::Scalar(Value::String(self.qualified(&entity)))),
            "column_names" => {
                let columns = self.session.client().columns(&entity.table).await?;
                Ok(Evaluated::Values(
                    columns.into_iter().map(|c| Value::String(c.name)).collect(),
                ))
            }
            _ => {
                let relation = Relation::new(entity, self.session.adapter());
                self.apply_relation(relation, call).await
            }
        }
    }

    async fn apply_relation(&self, relation: Relation, call: &Call) -> Result<Evaluated> {
        let args = call.args.as_slice();
        let registry = self.session.registry();

        let next = match call.method.as_str() {
            "all" => relation,
            "where" if args.is_empty() => return Ok(Evaluated::WhereChain(relation)),
            "where" => where_clause(relation, args, false)?,
            "select" => relation.select(required(call)?)?,
            "distinct" | "uniq" => relation.distinct(),
            "joins" => args.iter().try_fold(relation, |r, arg| {
                r.join(registry, arg, JoinKind::Inner)
            })?,
            "left_joins" | "left_outer_joins" => args.iter().try_fold(relation, |r, arg| {
                r.join(registry, arg, JoinKind::LeftOuter)
            })?,
            "includes" | "preload" | "eager_load" => relation.check_associations(args)?,
            "references" => relation,
            "group" => relation.group(required(call)?)?,
            "having" => match args.split_first() {
                Some((Literal::Str(sql), binds)) => relation.having_sql(sql, binds)?,
                _ => return Err(bad_argument(call)),
            },
            "order" => relation.order(required(call)?)?,
            "reorder" => relation.reorder(args)?,
            "limit" => relation.limit(int_argument(call)?),
            "offset" => relation.offset(int_argument(call)?),
            "none" => relation.none(),
            _ => return self.terminal(relation, call).await,
        };
        Ok(Evaluated::Relation(next))
    }

    /// Methods that run SQL (or render it).
    async fn terminal(&self, relation: Relation, call: &Call) -> Result<Evaluated> {
        let args = call.args.as_slice();
        match call.method.as_str() {
            "to_sql" => Ok(Evaluated::Scalar(Value::String(relation.to_sql()))),
            "to_a" | "load" | "records" => {
                let sql = relation.to_sql();
                let result = self.run(&sql).await?;
                Ok(Evaluated::Records(Records::from_result(
                    relation.entity().clone(),
                    result,
                    Some(sql),
                )))
            }
            "count" | "size" | "length" => {
                if relation.is_grouped() {
                    return self.grouped(&relation, "COUNT", args.first()).await;
                }
                let sql = relation.count_sql(args.first())?;
                Ok(Evaluated::Scalar(self.scalar(&sql).await?))
            }
            "sum" | "average" | "minimum" | "maximum" => {
                let function = match call.method.as_str() {
                    "sum" => "SUM",
                    "average" => "AVG",
                    "minimum" => "MIN",
                    _ => "MAX",
                };
                let column = args.first().ok_or_else(|| bad_argument(call))?;
                if relation.is_grouped() {
                    return self.grouped(&relation, function, Some(column)).await;
                }
                let value = self.scalar(&relation.aggregate_sql(function, column)?).await?;
                Ok(Evaluated::Scalar(match (function, value) {
                    ("SUM", Value::Null) => Value::Int(0),
                    (_, value) => value,
                }))
            }
            "pluck" => {
                let result = self.run(&relation.pluck_sql(required(call)?)?).await?;
                Ok(plucked(result, args.len()))
            }
            "pick" => {
                let sql = relation.limit(1).pluck_sql(required(call)?)?;
                let result = self.run(&sql).await?;
                let row = result.rows.into_iter().next();
                Ok(match (row, args.len()) {
                    (None, _) => Evaluated::Scalar(Value::Null),
                    (Some(mut row), 1) => Evaluated::Scalar(row.swap_remove(0)),
                    (Some(row), _) => Evaluated::Values(row),
                })
            }
            "ids" => {
                let key = Literal::Symbol(relation.entity().primary_key.clone());
                let result = self.run(&relation.pluck_sql(&[key])?).await?;
                Ok(plucked(result, 1))
            }
            "first" | "last" | "take" => {
                let end = match call.method.as_str() {
                    "first" => End::First,
                    "last" => End::Last,
                    _ => End::Take,
                };
                match args.first() {
                    None => self.single(&relation, end).await,
                    Some(n) => {
                        let n = n.as_int().ok_or_else(|| bad_argument(call))?;
                        let sql = relation.ends_sql(n, end);
                        let mut result = self.run(&sql).await?;
                        if end == End::Last {
                            result.rows.reverse();
                        }
                        Ok(Evaluated::Records(Records::from_result(
                            relation.entity().clone(),
                            result,
                            Some(sql),
                        )))
                    }
                }
            }
            "find" => self.find(relation, call).await,
            "find_by" => {
                let filtered = where_clause(relation, args, false)?;
                self.single(&filtered, End::Take).await
            }
            "exists?" | "any?" | "empty?" | "none?" => {
                let filtered = match args.first() {
                    None => relation,
                    Some(Literal::Int(id)) => {
                        let key = relation.entity().primary_key.clone();
                        relation.where_hash(&[(key, Literal::Int(*id))], false)?
                    }
                    Some(_) if call.method == "exists?" => where_clause(relation, args, false)?,
                    Some(_) => return Err(bad_argument(call)),
                };
                let found = !self.run(&filtered.exists_sql()).await?.rows.is_empty();
                let answer = match call.method.as_str() {
                    "empty?" | "none?" => !found,
                    _ => found,
                };
                Ok(Evaluated::Scalar(Value::Bool(answer)))
            }
            _ => Err(undefined(
                call,
                &format!("a relation of {}", self.qualified(relation.entity())),
            )),
        }
    }

    async fn find(&self, relation: Relation, call: &Call) -> Result<Evaluated> {
        let ids: Vec<Literal> = match call.args.as_slice() {
            [Literal::Array(items)] => items.clone(),
            args => args.to_vec(),
        };
        if ids.is_empty() {
            return Err(ExpressionError::argument(format!(
                "Couldn't find {} without an ID",
                self.qualified(relation.entity())
            )));
        }

        let entity = relation.entity().clone();
        let key = entity.primary_key.clone();
        let many = ids.len() > 1 || matches!(call.args.as_slice(), [Literal::Array(_)]);
        let value = if many {
            Literal::Array(ids.clone())
        } else {
            ids[0].clone()
        };
        let filtered = relation.where_hash(&[(key.clone(), value)], false)?;
        let sql = filtered.to_sql();
        let result = self.run(&sql).await?;

        if !many {
            return match Records::from_result(entity.clone(), result, Some(sql)).record(0) {
                Some(record) => Ok(Evaluated::Record(record)),
                None => Err(ExpressionError::argument(format!(
                    "Couldn't find {} with '{key}'={}",
                    self.qualified(&entity),
                    ids[0]
                ))),
            };
        }

        if result.rows.len() < ids.len() {
            let listed: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
            return Err(ExpressionError::argument(format!(
                "Couldn't find all {} with '{key}': ({}) (found {} results, but was looking for {}).",
                inflect::pluralize(&self.qualified(&entity)),
                listed.join(", "),
                result.rows.len(),
                ids.len()
            )));
        }
        Ok(Evaluated::Records(Records::from_result(entity, result, Some(sql))))
    }

    async fn apply_record(&self, record: Record, call: &Call) -> Result<Evaluated> {
        if call.args.is_empty() {
            if let Some(value) = record.get(&call.method) {
                return Ok(Evaluated::Scalar(value.clone()));
            }
        }

        let Some(assoc) = record.entity.association(&call.method) else {
            return Err(undefined(
                call,
                &format!("an instance of {}", self.qualified(&record.entity)),
            ));
        };

        if assoc.kind == AssociationKind::BelongsTo
            && assoc.through.is_none()
            && record.get(&assoc.foreign_key).map_or(true, Value::is_null)
        {
            return Ok(Evaluated::Scalar(Value::Null));
        }

        let relation = Relation::for_association(
            self.session.registry(),
            self.session.adapter(),
            &record.entity,
            assoc,
            |column| record.get(column).map(value_literal),
        )?;

        match (assoc.kind, &assoc.through) {
            (AssociationKind::BelongsTo | AssociationKind::HasOne, None) => {
                self.single(&relation, End::Take).await
            }
            _ => Ok(Evaluated::Relation(relation)),
        }
    }

    /// First/last/any single row, or nil.
    async fn single(&self, relation: &Relation, end: End) -> Result<Evaluated> {
        let sql = relation.ends_sql(1, end);
        let result = self.run(&sql).await?;
        Ok(
            match Records::from_result(relation.entity().clone(), result, Some(sql)).record(0) {
                Some(record) => Evaluated::Record(record),
                None => Evaluated::Scalar(Value::Null),
            },
        )
    }

    async fn grouped(
        &self,
        relation: &Relation,
        function: &str,
        column: Option<&Literal>,
    ) -> Result<Evaluated> {
        let aggregate = relation.aggregate_expression(function, column)?;
        let result = self.run(&relation.grouped_sql(&aggregate)).await?;

        let groups = result
            .rows
            .into_iter()
            .filter_map(|mut row| {
                let value = row.pop()?;
                let key = match row.as_slice() {
                    [single] => single.to_display_string(),
                    keys => {
                        let parts: Vec<String> = keys.iter().map(Value::inspect).collect();
                        format!("[{}]", parts.join(", "))
                    }
                };
                Some((key, value))
            })
            .collect();
        Ok(Evaluated::Grouped(groups))
    }

    async fn scalar(&self, sql: &str) -> Result<Value> {
        let result = self.run(sql).await?;
        Ok(result.first_value().cloned().unwrap_or(Value::Null))
    }

    async fn run(&self, sql: &str) -> Result<QueryResult> {
        debug!(sql = %sql, "Running expression SQL");
        Ok(self.session.client().execute_query(sql).await?)
    }

    fn qualified(&self, entity: &EntityBinding) -> String {
        self.session.registry().qualified_name(entity)
    }
}

fn where_clause(relation: Relation, args: &[Literal], negate: bool) -> Result<Relation> {
    match args {
        [Literal::Hash(pairs)] => relation.where_hash(pairs, negate),
        [Literal::Str(sql), binds @ ..] => relation.where_sql(sql, binds, negate),
        [] => Err(ExpressionError::argument("wrong number of arguments (given 0, expected 1+)")),
        [other, ..] => Err(ExpressionError::argument(format!(
            "Unsupported argument type: {other}"
        ))),
    }
}

fn apply_records(records: Records, call: &Call) -> Result<Evaluated> {
    match call.method.as_str() {
        "to_a" | "load" => Ok(Evaluated::Records(records)),
        "count" | "size" | "length" => Ok(count_value(records.len())),
        "empty?" => Ok(Evaluated::Scalar(Value::Bool(records.is_empty()))),
        "any?" => Ok(Evaluated::Scalar(Value::Bool(!records.is_empty()))),
        "first" => Ok(records
            .record(0)
            .map(Evaluated::Record)
            .unwrap_or(Evaluated::Scalar(Value::Null))),
        "last" => Ok(records
            .len()
            .checked_sub(1)
            .and_then(|i| records.record(i))
            .map(Evaluated::Record)
            .unwrap_or(Evaluated::Scalar(Value::Null))),
        _ => Err(undefined(call, "an array")),
    }
}

fn apply_values(values: Vec<Value>, call: &Call) -> Result<Evaluated> {
    match call.method.as_str() {
        "count" | "size" | "length" => Ok(count_value(values.len())),
        "empty?" => Ok(Evaluated::Scalar(Value::Bool(values.is_empty()))),
        "first" => Ok(Evaluated::Scalar(values.into_iter().next().unwrap_or_default())),
        "last" => Ok(Evaluated::Scalar(values.into_iter().last().unwrap_or_default())),
        "uniq" => {
            let mut unique: Vec<Value> = Vec::with_capacity(values.len());
            for value in values {
                if !unique.contains(&value) {
                    unique.push(value);
                }
            }
            Ok(Evaluated::Values(unique))
        }
        "compact" => Ok(Evaluated::Values(
            values.into_iter().filter(|v| !v.is_null()).collect(),
        )),
        "sum" => {
            let mut total = Value::Int(0);
            for value in values.iter().filter(|v| !v.is_null()) {
                total = match (total, value) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
                    (Value::Decimal(a), Value::Decimal(b)) => Value::Decimal(a + *b),
                    (Value::Int(a), Value::Decimal(b)) => Value::Decimal(Decimal::from(a) + *b),
                    (a, b) => Value::Float(as_float(&a) + as_float(b)),
                };
            }
            Ok(Evaluated::Scalar(total))
        }
        _ => Err(undefined(call, "an array")),
    }
}

fn apply_scalar(value: Value, call: &Call) -> Result<Evaluated> {
    let converted = match (call.method.as_str(), &value) {
        ("nil?", _) => Value::Bool(value.is_null()),
        ("present?", _) => Value::Bool(!value.is_null()),
        ("to_s", Value::Null) => Value::String(String::new()),
        ("to_s", other) => Value::String(other.to_display_string()),
        ("to_i", Value::Float(x)) => Value::Int(x.trunc() as i64),
        ("to_i", Value::Decimal(d)) => Value::Int(d.trunc().to_string().parse().unwrap_or(0)),
        ("to_i", Value::String(s)) => Value::Int(leading_int(s)),
        ("to_i", Value::Int(n)) => Value::Int(*n),
        ("to_i", Value::Null) => Value::Int(0),
        ("to_f", v) if v.is_numeric() || v.is_null() => Value::Float(as_float(v)),
        ("round", Value::Float(x)) => {
            let digits = call.args.first().and_then(Literal::as_int).unwrap_or(0);
            let factor = 10f64.powi(digits as i32);
            if digits == 0 {
                Value::Int(x.round() as i64)
            } else {
                Value::Float((x * factor).round() / factor)
            }
        }
        ("round", Value::Decimal(d)) => {
            let digits = call.args.first().and_then(Literal::as_int).unwrap_or(0);
            Value::Decimal(d.round_dp(digits.max(0) as u32))
        }
        ("round", Value::Int(n)) => Value::Int(*n),
        ("upcase", Value::String(s)) => Value::String(s.to_uppercase()),
        ("downcase", Value::String(s)) => Value::String(s.to_lowercase()),
        ("length" | "size", Value::String(s)) => Value::Int(s.chars().count() as i64),
        _ => return Err(undefined(call, &value.inspect())),
    };
    Ok(Evaluated::Scalar(converted))
}

fn plucked(result: QueryResult, columns: usize) -> Evaluated {
    if columns == 1 {
        Evaluated::Values(
            result
                .rows
                .into_iter()
                .map(|mut row| if row.is_empty() { Value::Null } else { row.swap_remove(0) })
                .collect(),
        )
    } else {
        Evaluated::Tuples(result.rows)
    }
}

fn count_value(n: usize) -> Evaluated {
    Evaluated::Scalar(Value::Int(n as i64))
}

/// Converts a loaded value back into a literal for SQL conditions.
fn value_literal(value: &Value) -> Literal {
    match value {
        Value::Null => Literal::Nil,
        Value::Bool(b) => Literal::Bool(*b),
        Value::Int(n) => Literal::Int(*n),
        Value::Float(x) => Literal::Float(*x),
        other => Literal::Str(other.to_display_string()),
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(x) => *x,
        Value::Decimal(d) => d.to_string().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn leading_int(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().unwrap_or(0)
}

fn required(call: &Call) -> Result<&[Literal]> {
    if call.args.is_empty() {
        return Err(ExpressionError::argument(format!(
            "wrong number of arguments (given 0, expected 1+) for '{}'",
            call.method
        )));
    }
    Ok(&call.args)
}

fn int_argument(call: &Call) -> Result<i64> {
    match call.args.as_slice() {
        [Literal::Int(n)] if *n >= 0 => Ok(*n),
        _ => Err(bad_argument(call)),
    }
}

fn bad_argument(call: &Call) -> ExpressionError {
    let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
    ExpressionError::argument(format!(
        "invalid arguments for '{}': ({})",
        call.method,
        args.join(", ")
    ))
}

fn undefined(call: &Call, receiver: &str) -> ExpressionError {
    ExpressionError::unknown_name(format!(
        "undefined method '{}' for {receiver}",
        call.method
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::learn_hub_session;
    use pretty_assertions::assert_eq;

    async fn eval(source: &str) -> Result<Evaluated> {
        let session = learn_hub_session().await;
        Evaluator::new(&session).evaluate(source).await
    }

    fn scalar(evaluated: Evaluated) -> Value {
        match evaluated {
            Evaluated::Scalar(v) => v,
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bare_type_and_namespace() {
        assert!(matches!(eval("Course").await.unwrap(), Evaluated::Type(_)));
        assert!(matches!(
            eval("LearnHub::Course").await.unwrap(),
            Evaluated::Type(_)
        ));
        let err = eval("Teacher.all").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown model or method name —> uninitialized constant Teacher"
        );
    }

    #[tokio::test]
    async fn test_relation_stays_lazy() {
        let evaluated = eval("Course.where(level: \"beginner\").order(:title)").await.unwrap();
        let Evaluated::Relation(relation) = evaluated else {
            panic!("expected relation");
        };
        assert_eq!(
            relation.to_sql(),
            r#"SELECT "courses".* FROM "courses" WHERE "courses"."level" = 'beginner' ORDER BY "courses"."title" ASC"#
        );
    }

    #[tokio::test]
    async fn test_count_and_sum() {
        assert_eq!(scalar(eval("Course.count").await.unwrap()), Value::Int(3));
        assert_eq!(
            scalar(eval("Course.where(level: \"beginner\").count").await.unwrap()),
            Value::Int(2)
        );
        assert_eq!(
            scalar(eval("Course.where(level: \"expert\").sum(:price)").await.unwrap()),
            Value::Int(0)
        );
    }

    #[tokio::test]
    async fn test_pluck_and_ids() {
        assert_eq!(
            eval("Course.order(:id).pluck(:title)").await.unwrap(),
            Evaluated::Values(vec![
                Value::String("Intro to SQL".into()),
                Value::String("Joins in Depth".into()),
                Value::String("Query Planning".into()),
            ])
        );
        assert_eq!(
            eval("Course.where(level: \"beginner\").ids").await.unwrap(),
            Evaluated::Values(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[tokio::test]
    async fn test_find_and_missing_record() {
        let Evaluated::Record(record) = eval("Course.find(2)").await.unwrap() else {
            panic!("expected record");
        };
        assert_eq!(record.get("title"), Some(&Value::String("Joins in Depth".into())));

        let err = eval("Course.find(999)").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected error —> Couldn't find LearnHub::Course with 'id'=999"
        );
    }

    #[tokio::test]
    async fn test_find_by_returns_nil_when_missing() {
        assert_eq!(
            eval("Course.find_by(title: \"Nope\")").await.unwrap(),
            Evaluated::Scalar(Value::Null)
        );
    }

    #[tokio::test]
    async fn test_first_last() {
        let Evaluated::Record(first) = eval("Course.first").await.unwrap() else {
            panic!("expected record");
        };
        assert_eq!(first.get("id"), Some(&Value::Int(1)));

        let Evaluated::Records(last_two) = eval("Course.last(2)").await.unwrap() else {
            panic!("expected records");
        };
        let ids: Vec<&Value> = last_two.rows.iter().map(|r| &r[0]).collect();
        assert_eq!(ids, vec![&Value::Int(2), &Value::Int(3)]);
    }

    #[tokio::test]
    async fn test_record_navigation() {
        assert_eq!(
            scalar(eval("Course.find(1).category.name").await.unwrap()),
            Value::String("Databases".into())
        );
        assert_eq!(
            scalar(eval("Course.find(1).students.count").await.unwrap()),
            Value::Int(2)
        );
        assert_eq!(
            scalar(eval("Course.find(3).category").await.unwrap()),
            Value::Null
        );
    }

    #[tokio::test]
    async fn test_where_not_and_joins() {
        assert_eq!(
            scalar(eval("Course.where.not(level: \"beginner\").count").await.unwrap()),
            Value::Int(1)
        );
        assert_eq!(
            scalar(eval("Course.where(category: 1).count").await.unwrap()),
            Value::Int(2)
        );
        // NULL foreign keys match neither side.
        assert_eq!(
            scalar(eval("Course.where.not(category: 2).count").await.unwrap()),
            Value::Int(2)
        );
        assert_eq!(
            scalar(
                eval("Course.joins(:enrollments).distinct.count(:id)")
                    .await
                    .unwrap()
            ),
            Value::Int(2)
        );
    }

    #[tokio::test]
    async fn test_grouped_count() {
        assert_eq!(
            eval("Course.group(:level).order(:level).count").await.unwrap(),
            Evaluated::Grouped(vec![
                ("advanced".to_string(), Value::Int(1)),
                ("beginner".to_string(), Value::Int(2)),
            ])
        );
    }

    #[tokio::test]
    async fn test_exists_predicates() {
        assert_eq!(
            scalar(eval("Course.exists?(title: \"Intro to SQL\")").await.unwrap()),
            Value::Bool(true)
        );
        assert_eq!(
            scalar(eval("Course.none.empty?").await.unwrap()),
            Value::Bool(true)
        );
    }

    #[tokio::test]
    async fn test_undefined_method() {
        let err = eval("Course.frobnicate").await.unwrap_err();
        assert!(matches!(err, ExpressionError::UnknownName(_)));
        assert!(err.to_string().contains("undefined method 'frobnicate'"));
    }

    #[tokio::test]
    async fn test_invalid_sql_reports_execution_error() {
        let err = eval("Course.where(\"no_such_column = 1\").to_a").await.unwrap_err();
        assert!(err.to_string().starts_with("SQL execution —> "));
    }

    #[tokio::test]
    async fn test_type_signature() {
        let session = learn_hub_session().await;
        let evaluator = Evaluator::new(&session);
        let entity = session.registry().entity("Category").unwrap().clone();
        assert_eq!(
            evaluator.type_signature(&entity).await.unwrap(),
            "LearnHub::Category(id: integer, name: string)"
        );
    }
}
