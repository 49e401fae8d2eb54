//! Lazily built SELECT statements over one entity.

use super::{ExpressionError, Literal};
use crate::binding::{Association, AssociationKind, EntityBinding, SchemaBindingRegistry};
use crate::config::Adapter;

type Result<T> = std::result::Result<T, ExpressionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

impl JoinKind {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
        }
    }
}

/// An unexecuted query. Every builder returns a new relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    entity: EntityBinding,
    adapter: Adapter,
    select: Vec<String>,
    distinct: bool,
    joins: Vec<String>,
    wheres: Vec<String>,
    group: Vec<String>,
    having: Vec<String>,
    order: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Relation {
    pub fn new(entity: EntityBinding, adapter: Adapter) -> Self {
        Self {
            entity,
            adapter,
            select: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            wheres: Vec::new(),
            group: Vec::new(),
            having: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Records reachable from one owner row through `assoc`.
    ///
    /// `owner_value` reads a column of the owner row.
    pub fn for_association(
        registry: &SchemaBindingRegistry,
        adapter: Adapter,
        owner: &EntityBinding,
        assoc: &Association,
        owner_value: impl Fn(&str) -> Option<Literal>,
    ) -> Result<Self> {
        let target = lookup_entity(registry, &assoc.class_name)?;
        let mut relation = Self::new(target.clone(), adapter);
        let read = |column: &str| {
            owner_value(column).ok_or_else(|| {
                ExpressionError::argument(format!("missing attribute '{column}' for {}", owner.name))
            })
        };

        match (&assoc.through, assoc.kind) {
            (None, AssociationKind::BelongsTo) => {
                let value = read(&assoc.foreign_key)?;
                relation.push_condition(&assoc.primary_key, &value)?;
            }
            (None, AssociationKind::HasMany | AssociationKind::HasOne) => {
                let value = read(&assoc.primary_key)?;
                relation.push_condition(&assoc.foreign_key, &value)?;
            }
            (None, AssociationKind::HasAndBelongsToMany) => {
                let join_table = assoc.join_table.clone().unwrap_or_default();
                let target_key = assoc.association_foreign_key.clone().unwrap_or_default();
                let jt = relation.quote(&join_table);
                relation.joins.push(format!(
                    "INNER JOIN {jt} ON {} = {jt}.{}",
                    relation.qualify(&target.primary_key),
                    relation.quote(&target_key)
                ));
                let value = read(&assoc.primary_key)?;
                relation.push_condition(&format!("{join_table}.{}", assoc.foreign_key), &value)?;
            }
            (Some(through), _) => {
                let through_assoc = lookup_association(owner, through)?;
                let intermediate = lookup_entity(registry, &through_assoc.class_name)?;
                let source_name = assoc.source.clone().unwrap_or_else(|| assoc.name.clone());
                let source = lookup_association(intermediate, &source_name)?;
                let inter = relation.quote(&intermediate.table);

                let on = match source.kind {
                    AssociationKind::BelongsTo => format!(
                        "{inter}.{} = {}",
                        relation.quote(&source.foreign_key),
                        relation.qualify(&source.primary_key)
                    ),
                    AssociationKind::HasMany | AssociationKind::HasOne => format!(
                        "{inter}.{} = {}",
                        relation.quote(&source.primary_key),
                        relation.qualify(&source.foreign_key)
                    ),
                    AssociationKind::HasAndBelongsToMany => {
                        return Err(ExpressionError::argument(format!(
                            "through association '{}' cannot use a many-to-many source",
                            assoc.name
                        )))
                    }
                };
                relation.joins.push(format!("INNER JOIN {inter} ON {on}"));

                let (column, value) = match through_assoc.kind {
                    AssociationKind::BelongsTo => (
                        through_assoc.primary_key.clone(),
                        read(&through_assoc.foreign_key)?,
                    ),
                    _ => (
                        through_assoc.foreign_key.clone(),
                        read(&through_assoc.primary_key)?,
                    ),
                };
                relation.push_condition(&format!("{}.{column}", intermediate.table), &value)?;
            }
        }

        if let Some(order) = &assoc.order {
            relation.order.push(relation.order_fragment(order));
        }

        Ok(relation)
    }

    pub fn entity(&self) -> &EntityBinding {
        &self.entity
    }

    pub fn is_grouped(&self) -> bool {
        !self.group.is_empty()
    }

    pub fn where_hash(mut self, pairs: &[(String, Literal)], negate: bool) -> Result<Self> {
        // Resolved column and value of every condition, nested hashes flattened.
        let mut targets: Vec<(String, &Literal)> = Vec::new();
        for (key, value) in pairs {
            match value {
                Literal::Hash(nested) => {
                    for (column, inner) in nested {
                        targets.push((format!("{key}.{column}"), inner));
                    }
                }
                _ => {
                    let column = match self.entity.association(key) {
                        Some(assoc) if assoc.kind == AssociationKind::BelongsTo => {
                            assoc.foreign_key.clone()
                        }
                        _ => key.clone(),
                    };
                    targets.push((column, value));
                }
            }
        }

        if let ([(column, value)], true) = (targets.as_slice(), negate) {
            let negated = self.condition(column, value, true)?;
            self.wheres.push(negated);
            return Ok(self);
        }

        let conditions = targets
            .iter()
            .map(|(column, value)| self.condition(column, value, false))
            .collect::<Result<Vec<_>>>()?;
        match (negate, conditions.is_empty()) {
            (_, true) => {}
            (true, false) => self.wheres.push(format!("NOT ({})", conditions.join(" AND "))),
            (false, false) => self.wheres.extend(conditions),
        }
        Ok(self)
    }

    /// `where("price > ?", 10)`.
    pub fn where_sql(mut self, sql: &str, binds: &[Literal], negate: bool) -> Result<Self> {
        let clause = self.substitute(sql, binds)?;
        self.wheres.push(if negate {
            format!("NOT ({clause})")
        } else {
            format!("({clause})")
        });
        Ok(self)
    }

    pub fn having_sql(mut self, sql: &str, binds: &[Literal]) -> Result<Self> {
        let clause = self.substitute(sql, binds)?;
        self.having.push(format!("({clause})"));
        Ok(self)
    }

    pub fn none(mut self) -> Self {
        self.wheres.push("1=0".to_string());
        self
    }

    pub fn select(mut self, args: &[Literal]) -> Result<Self> {
        for arg in args {
            let fragment = self.column_fragment(arg, "select")?;
            self.select.push(fragment);
        }
        Ok(self)
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn group(mut self, args: &[Literal]) -> Result<Self> {
        for arg in args {
            let fragment = self.column_fragment(arg, "group")?;
            self.group.push(fragment);
        }
        Ok(self)
    }

    pub fn order(mut self, args: &[Literal]) -> Result<Self> {
        for arg in args {
            match arg {
                Literal::Symbol(column) => {
                    let fragment = format!("{} ASC", self.qualify(column));
                    self.order.push(fragment);
                }
                Literal::Str(raw) => self.order.push(raw.clone()),
                Literal::Hash(pairs) => {
                    for (column, direction) in pairs {
                        let direction = match direction.as_name().map(str::to_lowercase) {
                            Some(d) if d == "asc" => "ASC",
                            Some(d) if d == "desc" => "DESC",
                            _ => {
                                return Err(ExpressionError::argument(format!(
                                    "Direction {direction} is invalid. Valid directions are: [:asc, :desc]"
                                )))
                            }
                        };
                        let fragment = format!("{} {direction}", self.qualify(column));
                        self.order.push(fragment);
                    }
                }
                other => {
                    return Err(ExpressionError::argument(format!(
                        "unsupported argument for order: {other}"
                    )))
                }
            }
        }
        Ok(self)
    }

    pub fn reorder(mut self, args: &[Literal]) -> Result<Self> {
        self.order.clear();
        self.order(args)
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Adds joins for a named association, or a raw join clause.
    pub fn join(
        mut self,
        registry: &SchemaBindingRegistry,
        arg: &Literal,
        kind: JoinKind,
    ) -> Result<Self> {
        match arg {
            Literal::Symbol(name) => {
                let entity = self.entity.clone();
                let owner_ref = self.quote(&entity.table);
                let (clauses, _) =
                    self.association_joins(registry, &entity, &owner_ref, name, kind)?;
                self.joins.extend(clauses);
            }
            Literal::Str(raw) => self.joins.push(raw.clone()),
            Literal::Hash(pairs) => {
                // joins(enrollments: :user)
                for (name, nested) in pairs {
                    let entity = self.entity.clone();
                    let owner_ref = self.quote(&entity.table);
                    let (clauses, target_ref) =
                        self.association_joins(registry, &entity, &owner_ref, name, kind)?;
                    self.joins.extend(clauses);

                    let assoc = lookup_association(&entity, name)?;
                    let target = lookup_entity(registry, &assoc.class_name)?.clone();
                    let nested_names: Vec<&str> = match nested {
                        Literal::Array(items) => items.iter().filter_map(Literal::as_name).collect(),
                        other => other.as_name().into_iter().collect(),
                    };
                    for nested_name in nested_names {
                        let (clauses, _) = self.association_joins(
                            registry,
                            &target,
                            &target_ref,
                            nested_name,
                            kind,
                        )?;
                        self.joins.extend(clauses);
                    }
                }
            }
            other => {
                return Err(ExpressionError::argument(format!(
                    "unsupported argument for joins: {other}"
                )))
            }
        }
        Ok(self)
    }

    /// Checks that every named association exists; no SQL effect.
    pub fn check_associations(self, args: &[Literal]) -> Result<Self> {
        for arg in args {
            let names: Vec<&str> = match arg {
                Literal::Hash(pairs) => pairs.iter().map(|(k, _)| k.as_str()).collect(),
                other => other.as_name().into_iter().collect(),
            };
            for name in names {
                lookup_association(&self.entity, name)?;
            }
        }
        Ok(self)
    }

    /// Full SELECT statement.
    pub fn to_sql(&self) -> String {
        let projection = if self.select.is_empty() {
            format!("{}.*", self.quote(&self.entity.table))
        } else {
            self.select.join(", ")
        };
        self.statement(&projection, true, true)
    }

    /// `COUNT` over the relation, honoring limit and offset.
    pub fn count_sql(&self, column: Option<&Literal>) -> Result<String> {
        let counted = match column {
            Some(arg) => self.column_fragment(arg, "count")?,
            None if self.distinct && !self.select.is_empty() => self.select.join(", "),
            None => "*".to_string(),
        };
        let counted = if self.distinct && counted != "*" {
            format!("DISTINCT {counted}")
        } else {
            counted
        };

        if self.limit.is_some() || self.offset.is_some() {
            let inner = self.statement("1 AS one", true, true);
            return Ok(format!(
                "SELECT COUNT({counted}) FROM ({inner}) subquery_for_count"
            ));
        }
        Ok(self.statement(&format!("COUNT({counted})"), false, false))
    }

    /// `SUM`/`AVG`/`MIN`/`MAX` of one column.
    pub fn aggregate_sql(&self, function: &str, column: &Literal) -> Result<String> {
        let column = self.column_fragment(column, function)?;
        Ok(self.statement(&format!("{function}({column})"), false, false))
    }

    /// Group keys followed by one aggregate column.
    pub fn grouped_sql(&self, aggregate: &str) -> String {
        let projection = format!("{}, {aggregate}", self.group.join(", "));
        self.statement(&projection, true, true)
    }

    /// Aggregate expression for grouped calculations.
    pub fn aggregate_expression(&self, function: &str, column: Option<&Literal>) -> Result<String> {
        match column {
            Some(arg) => Ok(format!("{function}({})", self.column_fragment(arg, function)?)),
            None => Ok(format!("{function}(*)")),
        }
    }

    pub fn pluck_sql(&self, columns: &[Literal]) -> Result<String> {
        let fragments = columns
            .iter()
            .map(|c| self.column_fragment(c, "pluck"))
            .collect::<Result<Vec<_>>>()?;
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        Ok(self.statement(&format!("{distinct}{}", fragments.join(", ")), true, true))
    }

    pub fn exists_sql(&self) -> String {
        self.clone().limit(1).statement("1 AS one", true, true)
    }

    /// `first`/`take`/`last` with an optional count.
    ///
    /// `first` and `last` order by primary key unless an order is set;
    /// `last` reverses the order.
    pub fn ends_sql(&self, n: i64, which: End) -> String {
        let mut relation = self.clone();
        match which {
            End::Take => {}
            End::First if relation.order.is_empty() => {
                relation.order.push(format!("{} ASC", relation.qualify(&relation.entity.primary_key)));
            }
            End::First => {}
            End::Last if relation.order.is_empty() => {
                relation.order.push(format!("{} DESC", relation.qualify(&relation.entity.primary_key)));
            }
            End::Last => {
                relation.order = relation.order.iter().map(|o| reverse_direction(o)).collect();
            }
        }
        relation.limit(n).to_sql()
    }

    fn statement(&self, projection: &str, with_order: bool, with_limit: bool) -> String {
        let distinct = if self.distinct && !projection.starts_with("COUNT(") && !projection.starts_with("DISTINCT ") {
            "DISTINCT "
        } else {
            ""
        };
        let mut sql = format!(
            "SELECT {distinct}{projection} FROM {}",
            self.quote(&self.entity.table)
        );
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.join(" AND "));
        }
        if !self.group.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group.join(", "));
        }
        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.having.join(" AND "));
        }
        if with_order && !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }
        if with_limit {
            match (self.limit, self.offset) {
                (Some(limit), Some(offset)) => {
                    sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"))
                }
                (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
                (None, Some(offset)) => match self.adapter {
                    Adapter::Postgresql => sql.push_str(&format!(" OFFSET {offset}")),
                    Adapter::Mysql2 => {
                        sql.push_str(&format!(" LIMIT 18446744073709551615 OFFSET {offset}"))
                    }
                    Adapter::Sqlite3 => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
                },
                (None, None) => {}
            }
        }
        sql
    }

    fn quote(&self, ident: &str) -> String {
        self.adapter.quote_ident(ident)
    }

    /// `"table"."column"`; `other.column` qualifies with `other`.
    fn qualify(&self, column: &str) -> String {
        match column.split_once('.') {
            Some((table, column)) => format!("{}.{}", self.quote(table), self.quote(column)),
            None => format!("{}.{}", self.quote(&self.entity.table), self.quote(column)),
        }
    }

    fn order_fragment(&self, order: &str) -> String {
        if order.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            format!("{} ASC", self.qualify(order))
        } else {
            order.to_string()
        }
    }

    fn column_fragment(&self, arg: &Literal, method: &str) -> Result<String> {
        match arg {
            Literal::Symbol(column) => Ok(self.qualify(column)),
            Literal::Str(raw) => Ok(raw.clone()),
            other => Err(ExpressionError::argument(format!(
                "unsupported argument for {method}: {other}"
            ))),
        }
    }

    fn push_condition(&mut self, column: &str, value: &Literal) -> Result<()> {
        let condition = self.condition(column, value, false)?;
        self.wheres.push(condition);
        Ok(())
    }

    fn condition(&self, column: &str, value: &Literal, negate: bool) -> Result<String> {
        let column = self.qualify(column);
        match value {
            Literal::Nil => Ok(format!(
                "{column} IS {}NULL",
                if negate { "NOT " } else { "" }
            )),
            Literal::Array(items) => {
                let has_nil = items.iter().any(|i| matches!(i, Literal::Nil));
                let values = items
                    .iter()
                    .filter(|i| !matches!(i, Literal::Nil))
                    .map(|i| self.sql_literal(i))
                    .collect::<Result<Vec<_>>>()?;

                let membership = if values.is_empty() {
                    None
                } else {
                    Some(format!(
                        "{column} {}IN ({})",
                        if negate { "NOT " } else { "" },
                        values.join(", ")
                    ))
                };

                Ok(match (membership, has_nil, negate) {
                    (None, false, false) => "1=0".to_string(),
                    (None, false, true) => "1=1".to_string(),
                    (None, true, false) => format!("{column} IS NULL"),
                    (None, true, true) => format!("{column} IS NOT NULL"),
                    (Some(m), false, _) => m,
                    (Some(m), true, false) => format!("({m} OR {column} IS NULL)"),
                    (Some(m), true, true) => format!("{m} AND {column} IS NOT NULL"),
                })
            }
            Literal::Range {
                start,
                end,
                exclusive,
            } => {
                let start = self.sql_literal(start)?;
                let end = self.sql_literal(end)?;
                Ok(match (exclusive, negate) {
                    (false, false) => format!("{column} BETWEEN {start} AND {end}"),
                    (false, true) => format!("{column} NOT BETWEEN {start} AND {end}"),
                    (true, false) => format!("{column} >= {start} AND {column} < {end}"),
                    (true, true) => format!("NOT ({column} >= {start} AND {column} < {end})"),
                })
            }
            Literal::Hash(_) => Err(ExpressionError::argument(format!(
                "unsupported nested condition for {column}"
            ))),
            scalar => Ok(format!(
                "{column} {} {}",
                if negate { "!=" } else { "=" },
                self.sql_literal(scalar)?
            )),
        }
    }

    /// Replaces `?` placeholders (outside quotes) with literals.
    fn substitute(&self, sql: &str, binds: &[Literal]) -> Result<String> {
        let placeholders = count_placeholders(sql);
        if placeholders != binds.len() {
            return Err(ExpressionError::argument(format!(
                "wrong number of bind variables ({} for {placeholders}) in: {sql}",
                binds.len()
            )));
        }

        let mut out = String::with_capacity(sql.len());
        let mut binds = binds.iter();
        let mut quote: Option<char> = None;
        for c in sql.chars() {
            match (c, quote) {
                ('\'' | '"', None) => {
                    quote = Some(c);
                    out.push(c);
                }
                (c, Some(q)) if c == q => {
                    quote = None;
                    out.push(c);
                }
                ('?', None) => match binds.next() {
                    Some(Literal::Array(items)) => {
                        let values = items
                            .iter()
                            .map(|i| self.sql_literal(i))
                            .collect::<Result<Vec<_>>>()?;
                        out.push_str(&values.join(", "));
                    }
                    Some(bind) => out.push_str(&self.sql_literal(bind)?),
                    None => out.push('?'),
                },
                _ => out.push(c),
            }
        }
        Ok(out)
    }

    fn sql_literal(&self, literal: &Literal) -> Result<String> {
        match literal {
            Literal::Nil => Ok("NULL".to_string()),
            Literal::Bool(b) => Ok(match (self.adapter, b) {
                (Adapter::Sqlite3, true) => "1".to_string(),
                (Adapter::Sqlite3, false) => "0".to_string(),
                (_, true) => "TRUE".to_string(),
                (_, false) => "FALSE".to_string(),
            }),
            Literal::Int(n) => Ok(n.to_string()),
            Literal::Float(x) => Ok(format!("{x:?}")),
            Literal::Str(s) | Literal::Symbol(s) => Ok(self.quote_string(s)),
            other => Err(ExpressionError::argument(format!(
                "cannot use {other} as a SQL value"
            ))),
        }
    }

    fn quote_string(&self, s: &str) -> String {
        let escaped = s.replace('\'', "''");
        match self.adapter {
            Adapter::Mysql2 => format!("'{}'", escaped.replace('\\', "\\\\")),
            _ => format!("'{escaped}'"),
        }
    }

    /// Join clauses for one association from `owner` (referenced as
    /// `owner_ref`). Returns the clauses and how the target is referenced.
    fn association_joins(
        &self,
        registry: &SchemaBindingRegistry,
        owner: &EntityBinding,
        owner_ref: &str,
        name: &str,
        kind: JoinKind,
    ) -> Result<(Vec<String>, String)> {
        let assoc = lookup_association(owner, name)?;
        let target = lookup_entity(registry, &assoc.class_name)?;

        if let Some(through) = &assoc.through {
            let (mut clauses, inter_ref) =
                self.association_joins(registry, owner, owner_ref, through, kind)?;
            let through_assoc = lookup_association(owner, through)?;
            let intermediate = lookup_entity(registry, &through_assoc.class_name)?;
            let source = assoc.source.clone().unwrap_or_else(|| assoc.name.clone());
            let (more, target_ref) =
                self.association_joins(registry, intermediate, &inter_ref, &source, kind)?;
            clauses.extend(more);
            return Ok((clauses, target_ref));
        }

        let keyword = kind.keyword();
        let (target_ref, table_sql) = if target.table == owner.table {
            let alias = self.quote(&format!("{}_{}", assoc.name, target.table));
            (alias.clone(), format!("{} {alias}", self.quote(&target.table)))
        } else {
            let table = self.quote(&target.table);
            (table.clone(), table)
        };
        let q = |ident: &str| self.quote(ident);

        let clauses = match assoc.kind {
            AssociationKind::BelongsTo => vec![format!(
                "{keyword} {table_sql} ON {target_ref}.{} = {owner_ref}.{}",
                q(&assoc.primary_key),
                q(&assoc.foreign_key)
            )],
            AssociationKind::HasMany | AssociationKind::HasOne => vec![format!(
                "{keyword} {table_sql} ON {target_ref}.{} = {owner_ref}.{}",
                q(&assoc.foreign_key),
                q(&assoc.primary_key)
            )],
            AssociationKind::HasAndBelongsToMany => {
                let jt = q(assoc.join_table.as_deref().unwrap_or_default());
                let target_key = assoc.association_foreign_key.as_deref().unwrap_or_default();
                vec![
                    format!(
                        "{keyword} {jt} ON {jt}.{} = {owner_ref}.{}",
                        q(&assoc.foreign_key),
                        q(&assoc.primary_key)
                    ),
                    format!(
                        "{keyword} {table_sql} ON {target_ref}.{} = {jt}.{}",
                        q(&target.primary_key),
                        q(target_key)
                    ),
                ]
            }
        };
        Ok((clauses, target_ref))
    }
}

/// Which end of a relation `first`/`last`/`take` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    First,
    Last,
    Take,
}

fn lookup_entity<'r>(registry: &'r SchemaBindingRegistry, name: &str) -> Result<&'r EntityBinding> {
    registry
        .entity(name)
        .ok_or_else(|| ExpressionError::unknown_name(format!("uninitialized constant {name}")))
}

fn lookup_association<'e>(entity: &'e EntityBinding, name: &str) -> Result<&'e Association> {
    entity.association(name).ok_or_else(|| {
        ExpressionError::argument(format!(
            "Association named '{name}' was not found on {}; perhaps you misspelled it?",
            entity.name
        ))
    })
}

fn count_placeholders(sql: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut count = 0;
    for c in sql.chars() {
        match (c, quote) {
            ('\'' | '"', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            ('?', None) => count += 1,
            _ => {}
        }
    }
    count
}

fn reverse_direction(order: &str) -> String {
    let trimmed = order.trim_end();
    let upper = trimmed.to_uppercase();
    if let Some(stem) = upper.strip_suffix(" DESC") {
        format!("{} ASC", &trimmed[..stem.len()])
    } else if let Some(stem) = upper.strip_suffix(" ASC") {
        format!("{} DESC", &trimmed[..stem.len()])
    } else {
        format!("{trimmed} DESC")
    }
}
