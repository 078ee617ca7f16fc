//! SQL builder
//!
//! Clause fragments are collected per column in four ordered lists (insert,
//! select, update, where) and rendered into parameterized SQL by one pure
//! function per clause kind. Placeholders are Postgres positional `$n`; a
//! [`ParamCounter`] threads the numbering across clauses so the arguments of
//! a whole statement can be concatenated in text order.

use crate::record::{Record, RecordKind};
use std::fmt;
use type_mapping::SqlValue;

/// Comparison used by update and where fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    In,
    NotIn,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a fragment's arguments appear in the SQL text
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// One placeholder per argument, comma separated
    Param,
    /// A parenthesized placeholder list, `($1, $2)`. An empty list renders
    /// `(NULL)`, which matches nothing.
    List,
    /// Free SQL where each `{}` is replaced by the next placeholder
    Expr(String),
}

impl Template {
    pub fn expr(text: impl Into<String>) -> Self {
        Template::Expr(text.into())
    }

    fn render(&self, arg_count: usize, params: &mut ParamCounter) -> String {
        match self {
            Template::Param => params.take(arg_count).join(", "),
            Template::List if arg_count == 0 => "(NULL)".to_string(),
            Template::List => format!("({})", params.take(arg_count).join(", ")),
            Template::Expr(text) => {
                let mut rendered = String::with_capacity(text.len());
                let mut rest = text.as_str();
                while let Some(at) = rest.find("{}") {
                    rendered.push_str(&rest[..at]);
                    rendered.push_str(&params.next());
                    rest = &rest[at + 2..];
                }
                rendered.push_str(rest);
                rendered
            }
        }
    }
}

/// Sequential `$n` placeholder source
#[derive(Debug, Clone)]
pub struct ParamCounter(usize);

impl ParamCounter {
    pub fn new() -> Self {
        Self(1)
    }

    /// Continue numbering after `used` already-bound parameters
    pub fn starting_after(used: usize) -> Self {
        Self(used + 1)
    }

    pub fn next(&mut self) -> String {
        let param = format!("${}", self.0);
        self.0 += 1;
        param
    }

    fn take(&mut self, count: usize) -> Vec<String> {
        (0..count).map(|_| self.next()).collect()
    }

    /// Number of placeholders issued so far
    pub fn issued(&self) -> usize {
        self.0 - 1
    }
}

impl Default for ParamCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Template plus the arguments it binds
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub template: Template,
    pub args: Vec<SqlValue>,
}

impl Fragment {
    pub fn new(template: Template, args: Vec<SqlValue>) -> Self {
        Self { template, args }
    }
}

/// Argument filter applied before rendering insert, update and where
/// fragments: any explicit null drops the whole fragment.
pub fn convert_args(args: &[SqlValue]) -> Option<Vec<SqlValue>> {
    if args.iter().any(SqlValue::is_null) {
        None
    } else {
        Some(args.to_vec())
    }
}

/// Insertion-ordered map where re-inserting a key replaces its value in place
#[derive(Debug, Clone, PartialEq)]
struct Clause<K, V> {
    entries: Vec<(K, V)>,
}

impl<K: PartialEq, V> Clause<K, V> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn put(&mut self, key: K, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    fn get_mut_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key, V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    fn remove(&mut self, key: &K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct WhereColumn {
    operators: Vec<(Operator, Fragment)>,
}

/// Accumulates clause fragments for one statement
#[derive(Debug, Clone, PartialEq)]
pub struct SqlBuilder {
    insert: Clause<String, Fragment>,
    select: Clause<String, Option<Fragment>>,
    update: Clause<String, (Operator, Fragment)>,
    where_: Clause<String, WhereColumn>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self {
            insert: Clause::new(),
            select: Clause::new(),
            update: Clause::new(),
            where_: Clause::new(),
        }
    }

    /// Collect fragments for every attribute of `record`.
    ///
    /// Every declared attribute is projected; numeric attributes are cast
    /// to float8. Set attributes become where fragments (`IN` for list
    /// values) and, unless read-only, insert and update fragments.
    pub fn from_record<K: RecordKind>(record: &Record<K>) -> Self {
        let mut builder = Self::new();
        for ((name, value), attr) in record.iter(true, true).zip(K::schema().attributes()) {
            if attr.field_type().projects_as_float() {
                let cast = Template::expr(format!("{}::float8", name));
                builder.add_select(name, Some(Fragment::new(cast, vec![])));
            } else {
                builder.add_select(name, None);
            }

            let Some(value) = value else { continue };

            match value {
                SqlValue::Array(items) => {
                    builder.add_where(name, Operator::In, Template::List, items.clone());
                }
                scalar => {
                    builder.add_where(name, Operator::Eq, Template::Param, vec![scalar.clone()]);
                }
            }

            if attr.is_read_only() {
                continue;
            }
            builder.add_insert(name, Template::Param, vec![value.clone()]);
            builder.add_update(name, Operator::Eq, Template::Param, vec![value.clone()]);
        }
        builder
    }

    pub fn add_insert(&mut self, column: &str, template: Template, args: Vec<SqlValue>) {
        self.insert.put(column.to_string(), Fragment::new(template, args));
    }

    /// Project `column`, either directly or as `expression AS column`
    pub fn add_select(&mut self, column: &str, expression: Option<Fragment>) {
        self.select.put(column.to_string(), expression);
    }

    pub fn add_update(
        &mut self,
        column: &str,
        operator: Operator,
        template: Template,
        args: Vec<SqlValue>,
    ) {
        self.update
            .put(column.to_string(), (operator, Fragment::new(template, args)));
    }

    /// Add a filter on `column`. Each column keeps one fragment per
    /// operator; adding the same pair again replaces the earlier one.
    pub fn add_where(
        &mut self,
        column: &str,
        operator: Operator,
        template: Template,
        args: Vec<SqlValue>,
    ) {
        let entry = self.where_.get_mut_or_default(column.to_string());
        let fragment = Fragment::new(template, args);
        match entry.operators.iter_mut().find(|(op, _)| *op == operator) {
            Some(existing) => existing.1 = fragment,
            None => entry.operators.push((operator, fragment)),
        }
    }

    pub fn delete_insert(&mut self, column: &str) -> bool {
        self.insert.remove(&column.to_string())
    }

    pub fn delete_select(&mut self, column: &str) -> bool {
        self.select.remove(&column.to_string())
    }

    pub fn delete_update(&mut self, column: &str) -> bool {
        self.update.remove(&column.to_string())
    }

    pub fn delete_where(&mut self, column: &str) -> bool {
        self.where_.remove(&column.to_string())
    }

    /// `(columns, values, args)` for an INSERT
    pub fn render_insert(&self, params: &mut ParamCounter) -> (String, String, Vec<SqlValue>) {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        let mut args = Vec::new();
        for (column, fragment) in self.insert.iter() {
            let Some(converted) = convert_args(&fragment.args) else {
                continue;
            };
            columns.push(column.as_str());
            values.push(fragment.template.render(converted.len(), params));
            args.extend(converted);
        }
        (columns.join(", "), values.join(", "), args)
    }

    /// Projection list. Explicit nulls are kept here.
    pub fn render_select(&self, prefix: &str, params: &mut ParamCounter) -> (String, Vec<SqlValue>) {
        let mut items = Vec::new();
        let mut args = Vec::new();
        for (column, expression) in self.select.iter() {
            match expression {
                Some(fragment) => {
                    items.push(format!(
                        "{} AS {}",
                        fragment.template.render(fragment.args.len(), params),
                        column
                    ));
                    args.extend(fragment.args.iter().cloned());
                }
                None => items.push(format!("{}{}", prefix, column)),
            }
        }
        (items.join(", "), args)
    }

    pub fn render_update(&self, prefix: &str, params: &mut ParamCounter) -> (String, Vec<SqlValue>) {
        let mut items = Vec::new();
        let mut args = Vec::new();
        for (column, (operator, fragment)) in self.update.iter() {
            let Some(converted) = convert_args(&fragment.args) else {
                continue;
            };
            items.push(format!(
                "{}{} {} {}",
                prefix,
                column,
                operator,
                fragment.template.render(converted.len(), params)
            ));
            args.extend(converted);
        }
        (items.join(", "), args)
    }

    /// Filter conditions joined by `separator`. With nothing left to
    /// filter on this renders `TRUE`, matching every row.
    pub fn render_where(
        &self,
        separator: &str,
        prefix: &str,
        params: &mut ParamCounter,
    ) -> (String, Vec<SqlValue>) {
        let mut items = Vec::new();
        let mut args = Vec::new();
        for (column, entry) in self.where_.iter() {
            for (operator, fragment) in &entry.operators {
                let Some(converted) = convert_args(&fragment.args) else {
                    continue;
                };
                items.push(format!(
                    "{}{} {} {}",
                    prefix,
                    column,
                    operator,
                    fragment.template.render(converted.len(), params)
                ));
                args.extend(converted);
            }
        }
        if items.is_empty() {
            return ("TRUE".to_string(), args);
        }
        (items.join(separator), args)
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
