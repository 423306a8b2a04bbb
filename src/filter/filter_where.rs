use super::error::FilterError;
use super::types::{DocumentFilter, FilterValue, Predicate};

/// Compiles a `DocumentFilter` into a parameterized SQL WHERE clause for the
/// Postgres backend. Parameters are returned in bind order.
pub struct FilterWhere {
    params: Vec<FilterValue>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn generate(
        filter: &DocumentFilter,
        starting_param_index: usize,
    ) -> Result<(String, Vec<FilterValue>), FilterError> {
        let mut this = Self {
            params: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        };

        for (field, predicate) in filter.clauses() {
            this.push_condition(field, predicate)?;
        }

        let clause = if this.conditions.is_empty() {
            String::new()
        } else {
            this.conditions.join(" AND ")
        };
        Ok((clause, this.params))
    }

    fn push_condition(&mut self, field: &str, predicate: &Predicate) -> Result<(), FilterError> {
        Self::validate_column(field)?;
        let quoted = format!("\"{}\"", field);
        let sql = match predicate {
            Predicate::Eq(value) => format!("{} = {}", quoted, self.param(value.clone())),
            Predicate::In(ids) => format!(
                "{} = ANY({})",
                quoted,
                self.param(FilterValue::UuidSet(ids.clone()))
            ),
            Predicate::Gte(value) => format!("{} >= {}", quoted, self.param(value.clone())),
            Predicate::Lte(value) => format!("{} <= {}", quoted, self.param(value.clone())),
            Predicate::IsNull => format!("{} IS NULL", quoted),
        };
        self.conditions.push(sql);
        Ok(())
    }

    fn param(&mut self, value: FilterValue) -> String {
        self.params.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    pub(crate) fn validate_column(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if valid {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(name.to_string()))
        }
    }
}
