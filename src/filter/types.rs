use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A comparison value inside a filter predicate. Typed rather than raw JSON
/// so the Postgres backend can bind each parameter with the right SQL type
/// and the in-memory backend can compare chronologically instead of
/// lexicographically.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Uuid(Uuid),
    UuidSet(Vec<Uuid>),
    Timestamp(DateTime<Utc>),
    Int(i64),
    Text(String),
}

impl FilterValue {
    /// JSON projection of the value, matching how serde serializes the
    /// corresponding entity fields.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Uuid(v) => Value::String(v.to_string()),
            FilterValue::UuidSet(v) => {
                Value::Array(v.iter().map(|u| Value::String(u.to_string())).collect())
            }
            FilterValue::Timestamp(v) => serde_json::to_value(v).unwrap_or(Value::Null),
            FilterValue::Int(v) => Value::from(*v),
            FilterValue::Text(v) => Value::String(v.clone()),
        }
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        FilterValue::Uuid(v)
    }
}

impl From<Vec<Uuid>> for FilterValue {
    fn from(v: Vec<Uuid>) -> Self {
        FilterValue::UuidSet(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        FilterValue::Timestamp(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

/// A single field predicate. The set matches what the query services need:
/// equality, id-set membership, inclusive range bounds, and null checks.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq(FilterValue),
    In(Vec<Uuid>),
    Gte(FilterValue),
    Lte(FilterValue),
    IsNull,
}

/// A conjunction of field predicates. An empty filter matches every record.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    clauses: Vec<(&'static str, Predicate)>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<FilterValue>) -> Self {
        self.clauses.push((field, Predicate::Eq(value.into())));
        self
    }

    /// Set-membership over ids. An empty set is a caller bug; the query
    /// services treat "no ids" as "no id clause" and never pass one down.
    pub fn id_in(mut self, field: &'static str, ids: Vec<Uuid>) -> Self {
        self.clauses.push((field, Predicate::In(ids)));
        self
    }

    pub fn gte(mut self, field: &'static str, value: impl Into<FilterValue>) -> Self {
        self.clauses.push((field, Predicate::Gte(value.into())));
        self
    }

    pub fn lte(mut self, field: &'static str, value: impl Into<FilterValue>) -> Self {
        self.clauses.push((field, Predicate::Lte(value.into())));
        self
    }

    pub fn is_null(mut self, field: &'static str) -> Self {
        self.clauses.push((field, Predicate::IsNull));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[(&'static str, Predicate)] {
        &self.clauses
    }

    /// Evaluates the filter against a JSON projection of a record. This is
    /// the in-memory counterpart of the SQL generated by `FilterWhere`.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(field, predicate)| Self::matches_predicate(doc.get(*field), predicate))
    }

    fn matches_predicate(field: Option<&Value>, predicate: &Predicate) -> bool {
        let field = field.unwrap_or(&Value::Null);
        match predicate {
            Predicate::IsNull => field.is_null(),
            Predicate::Eq(value) => {
                !field.is_null() && Self::compare(field, value) == Some(std::cmp::Ordering::Equal)
            }
            Predicate::In(ids) => field
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map_or(false, |id| ids.contains(&id)),
            Predicate::Gte(value) => {
                matches!(
                    Self::compare(field, value),
                    Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
                )
            }
            Predicate::Lte(value) => {
                matches!(
                    Self::compare(field, value),
                    Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
                )
            }
        }
    }

    /// Compares a JSON field against a typed value. Null fields compare as
    /// incomparable so range bounds never match unset timestamps.
    fn compare(field: &Value, value: &FilterValue) -> Option<std::cmp::Ordering> {
        match value {
            FilterValue::Uuid(v) => {
                let parsed = field.as_str().and_then(|s| Uuid::parse_str(s).ok())?;
                Some(parsed.cmp(v))
            }
            FilterValue::Timestamp(v) => {
                let parsed = field
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?
                    .with_timezone(&Utc);
                Some(parsed.cmp(v))
            }
            FilterValue::Int(v) => Some(field.as_i64()?.cmp(v)),
            FilterValue::Text(v) => Some(field.as_str()?.cmp(v.as_str())),
            FilterValue::UuidSet(_) => None,
        }
    }
}
