use std::cmp::Ordering;
use std::fmt::Display;

use lazy_static::lazy_static;
use num_bigint::BigInt;
use quarry_common::spec::Literal;
use regex::Regex;

use crate::error::{TableError, TableResult};

fn create_regex(regex: Result<Regex, regex::Error>) -> Regex {
    #[allow(clippy::unwrap_used)]
    regex.unwrap()
}

lazy_static! {
    static ref CONDITION: Regex = create_regex(Regex::new(
        r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(==|!=|<=|>=|=|<|>)\s*(.+?)\s*$"
    ));
    static ref INTEGER: Regex = create_regex(Regex::new(r"^[+-]?[0-9]+$"));
    static ref DECIMAL: Regex = create_regex(Regex::new(
        r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$"
    ));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternMode {
    /// The pattern must match the entire value.
    Matches,
    /// The pattern must match some part of the value.
    Find,
}

/// A compiled regular expression for a pattern filter.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    anchored: Regex,
}

impl Pattern {
    fn try_new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            anchored: Regex::new(&format!("^(?:{pattern})$"))?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    fn test(&self, value: &str, mode: PatternMode) -> bool {
        match mode {
            PatternMode::Matches => self.anchored.is_match(value),
            PatternMode::Find => self.regex.is_match(value),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringOperator {
    StartsWith,
    EndsWith,
    Contains,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOperator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOperator {
    fn test(&self, ordering: Ordering) -> bool {
        match self {
            CompareOperator::Eq => ordering.is_eq(),
            CompareOperator::Neq => ordering.is_ne(),
            CompareOperator::Lt => ordering.is_lt(),
            CompareOperator::Lte => ordering.is_le(),
            CompareOperator::Gt => ordering.is_gt(),
            CompareOperator::Gte => ordering.is_ge(),
        }
    }
}

impl Display for CompareOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            CompareOperator::Eq => "==",
            CompareOperator::Neq => "!=",
            CompareOperator::Lt => "<",
            CompareOperator::Lte => "<=",
            CompareOperator::Gt => ">",
            CompareOperator::Gte => ">=",
        };
        write!(f, "{op}")
    }
}

/// A boolean predicate over table rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Or(Vec<Filter>),
    And(Vec<Filter>),
    Not(Box<Filter>),
    Pattern {
        column: String,
        pattern: Pattern,
        mode: PatternMode,
    },
    String {
        column: String,
        operator: StringOperator,
        value: String,
        case_insensitive: bool,
    },
    Compare {
        column: String,
        operator: CompareOperator,
        value: Literal,
    },
}

pub fn or_(filters: impl IntoIterator<Item = Filter>) -> Filter {
    Filter::Or(filters.into_iter().collect())
}

pub fn and_(filters: impl IntoIterator<Item = Filter>) -> Filter {
    Filter::And(filters.into_iter().collect())
}

pub fn not_(filter: Filter) -> Filter {
    Filter::Not(Box::new(filter))
}

pub fn pattern(
    column: impl Into<String>,
    regex: impl AsRef<str>,
    mode: PatternMode,
) -> TableResult<Filter> {
    let pattern = Pattern::try_new(regex.as_ref())
        .map_err(|e| TableError::construction("failed to create a pattern filter.", e))?;
    Ok(Filter::Pattern {
        column: column.into(),
        pattern,
        mode,
    })
}

fn string_filter(
    column: impl Into<String>,
    operator: StringOperator,
    value: impl Into<String>,
    case_insensitive: bool,
) -> Filter {
    Filter::String {
        column: column.into(),
        operator,
        value: value.into(),
        case_insensitive,
    }
}

macro_rules! define_string_filter {
    ($name:ident, $operator:ident) => {
        pub fn $name(
            column: impl Into<String>,
            value: impl Into<String>,
            case_insensitive: bool,
        ) -> Filter {
            string_filter(column, StringOperator::$operator, value, case_insensitive)
        }
    };
}

define_string_filter!(starts_with, StartsWith);
define_string_filter!(ends_with, EndsWith);
define_string_filter!(contains, Contains);
define_string_filter!(eq, Eq);
define_string_filter!(neq, Neq);
define_string_filter!(gt, Gt);
define_string_filter!(gte, Gte);
define_string_filter!(lt, Lt);
define_string_filter!(lte, Lte);

fn parse_literal(text: &str) -> TableResult<Literal> {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        let value: String = serde_json::from_str(text)
            .map_err(|e| TableError::invalid(format!("invalid string literal {text}: {e}")))?;
        return Ok(Literal::String(value));
    }
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return Ok(Literal::String(text[1..text.len() - 1].to_string()));
    }
    match text {
        "true" => return Ok(Literal::Boolean(true)),
        "false" => return Ok(Literal::Boolean(false)),
        "null" => return Ok(Literal::Null),
        _ => {}
    }
    if INTEGER.is_match(text) {
        if let Ok(x) = text.parse::<i64>() {
            return Ok(Literal::Long(x));
        }
        let x = text
            .trim_start_matches('+')
            .parse::<BigInt>()
            .map_err(|e| TableError::invalid(format!("invalid integer literal {text}: {e}")))?;
        return Ok(Literal::BigInteger(x));
    }
    if DECIMAL.is_match(text) {
        let x = text
            .parse::<f64>()
            .map_err(|e| TableError::invalid(format!("invalid decimal literal {text}: {e}")))?;
        return Ok(Literal::Double(x));
    }
    Err(TableError::invalid(format!("invalid literal: {text}")))
}

fn parse_condition(condition: &str) -> TableResult<Filter> {
    let captures = CONDITION
        .captures(condition)
        .ok_or_else(|| TableError::invalid(format!("invalid condition: {condition}")))?;
    let (column, operator, value) = match (captures.get(1), captures.get(2), captures.get(3)) {
        (Some(c), Some(o), Some(v)) => (c.as_str(), o.as_str(), v.as_str()),
        _ => return Err(TableError::invalid(format!("invalid condition: {condition}"))),
    };
    let operator = match operator {
        "=" | "==" => CompareOperator::Eq,
        "!=" => CompareOperator::Neq,
        "<" => CompareOperator::Lt,
        "<=" => CompareOperator::Lte,
        ">" => CompareOperator::Gt,
        ">=" => CompareOperator::Gte,
        other => return Err(TableError::invalid(format!("invalid operator: {other}"))),
    };
    if matches!(
        operator,
        CompareOperator::Lt | CompareOperator::Lte | CompareOperator::Gt | CompareOperator::Gte
    ) && value == "null"
    {
        return Err(TableError::invalid(format!(
            "null can only be compared for equality: {condition}"
        )));
    }
    Ok(Filter::Compare {
        column: column.to_string(),
        operator,
        value: parse_literal(value)?,
    })
}

impl Filter {
    /// Parses conditions of the form `<column> <operator> <literal>`, one filter per condition.
    pub fn from_<S: AsRef<str>>(
        conditions: impl IntoIterator<Item = S>,
    ) -> TableResult<Vec<Filter>> {
        conditions
            .into_iter()
            .map(|c| parse_condition(c.as_ref()))
            .collect::<TableResult<Vec<_>>>()
            .map_err(|e| TableError::construction("failed to create filters.", e))
    }

    /// Returns the names of all columns the filter refers to.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = vec![];
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Or(x) | Filter::And(x) => x.iter().for_each(|f| f.collect_columns(out)),
            Filter::Not(x) => x.collect_columns(out),
            Filter::Pattern { column, .. }
            | Filter::String { column, .. }
            | Filter::Compare { column, .. } => {
                if !out.contains(&column.as_str()) {
                    out.push(column)
                }
            }
        }
    }

    /// Evaluates the filter for one row.
    /// `cell` returns the value of the named column in that row.
    pub fn test<'a>(&self, cell: &impl Fn(&str) -> Option<&'a Literal>) -> bool {
        match self {
            Filter::Or(x) => x.iter().any(|f| f.test(cell)),
            Filter::And(x) => x.iter().all(|f| f.test(cell)),
            Filter::Not(x) => !x.test(cell),
            Filter::Pattern {
                column,
                pattern,
                mode,
            } => match cell(column) {
                Some(value) if !value.is_null() => pattern.test(&value.to_string(), *mode),
                _ => false,
            },
            Filter::String {
                column,
                operator,
                value,
                case_insensitive,
            } => match cell(column) {
                Some(cell) if !cell.is_null() => {
                    test_string(&cell.to_string(), *operator, value, *case_insensitive)
                }
                _ => false,
            },
            Filter::Compare {
                column,
                operator,
                value,
            } => {
                let cell = cell(column).unwrap_or(&Literal::Null);
                match (value, operator) {
                    (Literal::Null, CompareOperator::Eq) => cell.is_null(),
                    (Literal::Null, CompareOperator::Neq) => !cell.is_null(),
                    _ => cell.compare(value).is_some_and(|o| operator.test(o)),
                }
            }
        }
    }
}

fn test_string(cell: &str, operator: StringOperator, value: &str, case_insensitive: bool) -> bool {
    let (cell, value) = if case_insensitive {
        (cell.to_lowercase(), value.to_lowercase())
    } else {
        (cell.to_string(), value.to_string())
    };
    match operator {
        StringOperator::StartsWith => cell.starts_with(&value),
        StringOperator::EndsWith => cell.ends_with(&value),
        StringOperator::Contains => cell.contains(&value),
        StringOperator::Eq => cell == value,
        StringOperator::Neq => cell != value,
        StringOperator::Gt => cell > value,
        StringOperator::Gte => cell >= value,
        StringOperator::Lt => cell < value,
        StringOperator::Lte => cell <= value,
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut std::fmt::Formatter<'_>, filters: &[Filter], sep: &str) -> std::fmt::Result {
            write!(f, "(")?;
            for (i, filter) in filters.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{filter}")?;
            }
            write!(f, ")")
        }
        match self {
            Filter::Or(x) => join(f, x, "OR"),
            Filter::And(x) => join(f, x, "AND"),
            Filter::Not(x) => write!(f, "NOT {x}"),
            Filter::Pattern {
                column,
                pattern,
                mode,
            } => write!(f, "{column} {mode:?} /{}/", pattern.as_str()),
            Filter::String {
                column,
                operator,
                value,
                case_insensitive,
            } => {
                let ci = if *case_insensitive { " (ignore case)" } else { "" };
                write!(f, "{column} {operator:?} {value:?}{ci}")
            }
            Filter::Compare {
                column,
                operator,
                value: Literal::String(value),
            } => write!(f, "{column} {operator} {value:?}"),
            Filter::Compare {
                column,
                operator,
                value,
            } => write!(f, "{column} {operator} {value}"),
        }
    }
}
