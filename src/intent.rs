//! Query intent: raw client request -> normalized, validated representation.
//! Identifiers are allow-listed here so the SQL builder can interpolate them; filter values are kept
//! opaque and only ever bound.

use crate::case::to_snake_case;
use crate::error::ParseError;
use crate::sql::BindValue;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// Limit applied when the request does not specify one.
pub const DEFAULT_LIMIT: u64 = 100;
/// Ceiling applied to requested limits unless configured otherwise.
pub const MAX_LIMIT: u64 = 1000;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

/// A bare column or table name that passed identifier validation. The only kind of string the SQL
/// builder interpolates into statement text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SafeIdentifier(String);

impl SafeIdentifier {
    /// Validate a trusted, storage-cased name (e.g. a table from the allow-list).
    pub fn new(name: &str) -> Option<Self> {
        identifier_re().is_match(name).then(|| SafeIdentifier(name.to_string()))
    }

    /// Normalize a client-cased field name to storage casing and validate it.
    pub fn from_client(name: &str) -> Result<Self, ParseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::EmptyField);
        }
        if !identifier_re().is_match(name) {
            return Err(ParseError::InvalidField(name.to_string()));
        }
        Ok(SafeIdentifier(to_snake_case(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the select list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectField {
    /// `*`: every column.
    All,
    Column(SafeIdentifier),
}

impl fmt::Display for SelectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectField::All => f.write_str("*"),
            SelectField::Column(c) => c.fmt(f),
        }
    }
}

/// Comparison operators a filter may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
}

impl FilterOp {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "=" => FilterOp::Eq,
            "!=" | "<>" => FilterOp::NotEq,
            "<" => FilterOp::Lt,
            "<=" => FilterOp::LtEq,
            ">" => FilterOp::Gt,
            ">=" => FilterOp::GtEq,
            "LIKE" => FilterOp::Like,
            _ => return Err(ParseError::InvalidOperator(s.to_string())),
        })
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Lt => "<",
            FilterOp::LtEq => "<=",
            FilterOp::Gt => ">",
            FilterOp::GtEq => ">=",
            FilterOp::Like => "LIKE",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Case-insensitive; missing or blank means ASC.
    pub fn parse(s: Option<&str>) -> Result<Self, ParseError> {
        let Some(raw) = s.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Direction::Asc);
        };
        match raw.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(ParseError::InvalidDirection(raw.to_string())),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: SafeIdentifier,
    pub op: FilterOp,
    pub value: BindValue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SafeIdentifier,
    pub direction: Direction,
}

/// Raw request shape as deserialized from the transport: `{fields, filters, order, limit, offset}`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawQuery {
    pub fields: Vec<RawField>,
    pub filters: Vec<RawFilter>,
    pub order: Vec<RawOrder>,
    /// Number or numeric string; validated by the parser.
    pub limit: Option<Value>,
    pub offset: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawField {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFilter {
    pub name: String,
    pub operation: String,
    pub value: Value,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawOrder {
    pub name: String,
    pub direction: Option<String>,
}

/// Limit policy applied while parsing.
#[derive(Clone, Copy, Debug)]
pub struct QueryLimits {
    pub default_limit: u64,
    /// Larger requested limits are clamped to this value. `None` disables the ceiling.
    pub max_limit: Option<u64>,
}

impl Default for QueryLimits {
    fn default() -> Self {
        QueryLimits {
            default_limit: DEFAULT_LIMIT,
            max_limit: Some(MAX_LIMIT),
        }
    }
}

/// Normalized, validated request. Immutable once parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryIntent {
    /// Never empty; `[All]` when the client asked for no specific fields.
    pub fields: Vec<SelectField>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: u64,
    pub offset: Option<u64>,
}

impl QueryIntent {
    /// Parse and validate a raw request. Pure: no side effects.
    pub fn parse(raw: &RawQuery, limits: &QueryLimits) -> Result<Self, ParseError> {
        let mut fields = raw
            .fields
            .iter()
            .map(|f| {
                if f.name.trim() == "*" {
                    Ok(SelectField::All)
                } else {
                    SafeIdentifier::from_client(&f.name).map(SelectField::Column)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if fields.is_empty() {
            fields.push(SelectField::All);
        }

        let filters = raw
            .filters
            .iter()
            .map(|f| {
                let field = SafeIdentifier::from_client(&f.name)?;
                let op = FilterOp::parse(&f.operation)?;
                let value = BindValue::from_json(&f.value)
                    .ok_or_else(|| ParseError::InvalidValue(f.name.clone()))?;
                Ok(Filter { field, op, value })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        let order = raw
            .order
            .iter()
            .map(|o| {
                Ok(OrderBy {
                    field: SafeIdentifier::from_client(&o.name)?,
                    direction: Direction::parse(o.direction.as_deref())?,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        let limit = match parse_integer(raw.limit.as_ref()) {
            None => limits.default_limit,
            Some(Ok(n)) if n > 0 => n as u64,
            Some(_) => return Err(ParseError::InvalidLimit(describe(raw.limit.as_ref()))),
        };
        let limit = match limits.max_limit {
            Some(max) if limit > max => {
                tracing::debug!(requested = limit, max, "limit clamped");
                max
            }
            _ => limit,
        };

        let offset = match parse_integer(raw.offset.as_ref()) {
            None => None,
            Some(Ok(n)) if n >= 0 => Some(n as u64),
            Some(_) => return Err(ParseError::InvalidOffset(describe(raw.offset.as_ref()))),
        };

        Ok(QueryIntent {
            fields,
            filters,
            order,
            limit,
            offset,
        })
    }
}

/// `None` when absent (missing, null or blank string); `Some(Err)` when present but not an integer.
fn parse_integer(v: Option<&Value>) -> Option<Result<i64, ()>> {
    match v? {
        Value::Null => None,
        Value::Number(n) => Some(n.as_i64().ok_or(())),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse::<i64>().map_err(|_| ())),
        _ => Some(Err(())),
    }
}

fn describe(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
