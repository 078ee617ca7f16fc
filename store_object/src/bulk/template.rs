//! Per-row templates
//!
//! A template such as `({}, {})` or `({id}, {name})` describes how one row
//! is spelled inside a multi-row statement. `{{` and `}}` stand for literal
//! braces.

use crate::errors::BulkError;
use type_mapping::SqlValue;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Positional(usize),
    Named(String),
}

/// Which placeholders a template uses
#[derive(Debug, Clone, PartialEq)]
pub enum Fields {
    /// Pure literal text
    None,
    /// `{}` or `{0}` markers; rows need at least `arity` values
    Positional { arity: usize },
    /// `{column}` markers, columns in order of first appearance
    Named { columns: Vec<String> },
}

/// One row of bulk data
#[derive(Debug, Clone, PartialEq)]
pub enum BulkRow {
    Positional(Vec<SqlValue>),
    Named(Vec<(String, SqlValue)>),
}

impl BulkRow {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        BulkRow::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, S, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<SqlValue>,
    {
        BulkRow::Named(
            values
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }

    pub fn is_named(&self) -> bool {
        matches!(self, BulkRow::Named(_))
    }

    pub fn len(&self) -> usize {
        match self {
            BulkRow::Positional(values) => values.len(),
            BulkRow::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of a named column
    pub fn column(&self, name: &str) -> Option<&SqlValue> {
        match self {
            BulkRow::Named(values) => values
                .iter()
                .find(|(column, _)| column == name)
                .map(|(_, value)| value),
            BulkRow::Positional(_) => None,
        }
    }

    fn position(&self, index: usize) -> Option<&SqlValue> {
        match self {
            BulkRow::Positional(values) => values.get(index),
            BulkRow::Named(_) => None,
        }
    }
}

impl From<Vec<SqlValue>> for BulkRow {
    fn from(values: Vec<SqlValue>) -> Self {
        BulkRow::Positional(values)
    }
}

impl From<type_mapping::RowMap> for BulkRow {
    fn from(row: type_mapping::RowMap) -> Self {
        let mut values: Vec<_> = row.into_iter().collect();
        values.sort_by(|a, b| a.0.cmp(&b.0));
        BulkRow::Named(values)
    }
}

/// A parsed per-row template
#[derive(Debug, Clone, PartialEq)]
pub struct RowTemplate {
    segments: Vec<Segment>,
    fields: Fields,
}

impl RowTemplate {
    pub fn parse(text: &str) -> Result<Self, BulkError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut auto_index = 0;
        let mut numbering: Option<bool> = None; // Some(true) once automatic
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(template_error(text, "unmatched '}'")),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(template_error(text, "unclosed '{'")),
                            Some(ch) => name.push(ch),
                        }
                    }
                    let name = name.trim();

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }

                    let segment = if name.is_empty() {
                        if numbering == Some(false) {
                            return Err(template_error(text, "mixes automatic and manual numbering"));
                        }
                        numbering = Some(true);
                        auto_index += 1;
                        Segment::Positional(auto_index - 1)
                    } else if let Ok(index) = name.parse::<usize>() {
                        if numbering == Some(true) {
                            return Err(template_error(text, "mixes automatic and manual numbering"));
                        }
                        numbering = Some(false);
                        Segment::Positional(index)
                    } else if is_column_name(name) {
                        Segment::Named(name.to_string())
                    } else {
                        return Err(template_error(text, &format!("invalid field '{}'", name)));
                    };
                    segments.push(segment);
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let fields = Self::fields_of(text, &segments)?;
        Ok(Self { segments, fields })
    }

    fn fields_of(text: &str, segments: &[Segment]) -> Result<Fields, BulkError> {
        let mut arity = None;
        let mut columns: Vec<String> = Vec::new();
        for segment in segments {
            match segment {
                Segment::Literal(_) => {}
                Segment::Positional(index) => {
                    arity = Some(arity.unwrap_or(0).max(index + 1));
                }
                Segment::Named(name) => {
                    if !columns.contains(name) {
                        columns.push(name.clone());
                    }
                }
            }
        }
        match (arity, columns.is_empty()) {
            (Some(_), false) => Err(template_error(text, "mixes positional and named fields")),
            (Some(arity), true) => Ok(Fields::Positional { arity }),
            (None, false) => Ok(Fields::Named { columns }),
            (None, true) => Ok(Fields::None),
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Named columns in order of first appearance
    pub fn columns(&self) -> &[String] {
        match &self.fields {
            Fields::Named { columns } => columns,
            _ => &[],
        }
    }

    /// Number of markers in one rendered row
    pub fn placeholder_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| !matches!(segment, Segment::Literal(_)))
            .count()
    }

    /// Check every row can fill this template. All rows must share one
    /// shape, and that shape must match the template's fields.
    pub fn check_rows(&self, rows: &[BulkRow]) -> Result<(), BulkError> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        if rows.iter().any(|row| row.is_named() != first.is_named()) {
            return Err(BulkError::MixedRows);
        }

        for (index, row) in rows.iter().enumerate() {
            match (&self.fields, row) {
                (Fields::None, _) => {}
                (Fields::Positional { arity }, BulkRow::Positional(values)) => {
                    if values.len() < *arity {
                        return Err(BulkError::TemplateMismatch {
                            row: index,
                            expected: *arity,
                            found: values.len(),
                        });
                    }
                }
                (Fields::Named { columns }, BulkRow::Named(_)) => {
                    if let Some(missing) = columns.iter().find(|column| row.column(column).is_none()) {
                        return Err(BulkError::MissingColumn {
                            row: index,
                            column: missing.clone(),
                        });
                    }
                }
                (Fields::Positional { .. }, BulkRow::Named(_)) => {
                    return Err(BulkError::Template(
                        "positional template cannot render named rows".to_string(),
                    ));
                }
                (Fields::Named { .. }, BulkRow::Positional(_)) => {
                    return Err(BulkError::Template(
                        "named template cannot render positional rows".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Render `row` with its values inlined as SQL literals
    pub fn render_literals(&self, row: &BulkRow) -> String {
        self.render_with(row, |value| value.to_sql_literal())
    }

    /// Render `row` with `$n` placeholders, appending its values to `args`
    pub fn render_params(
        &self,
        row: &BulkRow,
        params: &mut crate::sql_builder::ParamCounter,
        args: &mut Vec<SqlValue>,
    ) -> String {
        self.render_with(row, |value| {
            args.push(value.clone());
            params.next()
        })
    }

    fn render_with<F>(&self, row: &BulkRow, mut value_text: F) -> String
    where
        F: FnMut(&SqlValue) -> String,
    {
        let mut out = String::new();
        for segment in &self.segments {
            let value = match segment {
                Segment::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                Segment::Positional(index) => row.position(*index),
                Segment::Named(name) => row.column(name),
            };
            // Rows are checked before rendering; a gap renders as NULL
            out.push_str(&value_text(value.unwrap_or(&SqlValue::Null)));
        }
        out
    }
}

fn is_column_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn template_error(text: &str, reason: &str) -> BulkError {
    BulkError::Template(format!("'{}' {}", text, reason))
}
