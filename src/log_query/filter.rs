//! Query grammar for filtering objective log entries.
//!
//! A filter value is one of:
//! - `>x`: keep values strictly above `x`;
//! - `<x`: keep values strictly below `x`;
//! - `a,b,c`: keep only values exactly equal to one of the listed numbers.
//!
//! Bounds accumulate; a later allow-list replaces an earlier one.
use std::collections::BTreeMap;

use crate::log_query::errors::{QueryError, QueryResult};

/// One-sided numeric bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueLimit {
    /// `true` for `<limit`, `false` for `>limit`.
    pub upper: bool,
    pub limit: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFilter {
    pub allowed_values: Option<Vec<f64>>,
    pub value_limits: Vec<ValueLimit>,
}

fn parse_number(text: &str) -> QueryResult<f64> {
    text.trim().parse::<f64>().map_err(|_| QueryError::InvalidNumber { value: text.to_string() })
}

impl DataFilter {
    /// Add one clause in the grammar above.
    ///
    /// Anything before the `>`/`<` symbol is ignored, so both `>3` and
    /// `objective>3` parse to the same bound.
    ///
    /// # Errors
    /// [`QueryError::InvalidNumber`] if a bound or list item is not a number.
    pub fn set_value(&mut self, value: &str) -> QueryResult<()> {
        if let Some((_, limit)) = value.split_once('>') {
            self.value_limits.push(ValueLimit { upper: false, limit: parse_number(limit)? });
        } else if let Some((_, limit)) = value.split_once('<') {
            self.value_limits.push(ValueLimit { upper: true, limit: parse_number(limit)? });
        } else {
            let allowed = value.split(',').map(parse_number).collect::<QueryResult<Vec<f64>>>()?;
            self.allowed_values = Some(allowed);
        }
        Ok(())
    }

    /// Whether `value` fails any clause.
    pub fn ignore(&self, value: f64) -> bool {
        if let Some(allowed) = &self.allowed_values {
            if !allowed.contains(&value) {
                return true;
            }
        }
        self.value_limits.iter().any(|bound| {
            if bound.upper {
                value >= bound.limit
            } else {
                value <= bound.limit
            }
        })
    }
}

/// Build per-field filters from query `(key, value)` pairs.
///
/// URL forms such as `?objective>3` arrive as the key `objective>3` with an
/// empty value; such keys are split so the field is the part before the
/// symbol and the whole key becomes the clause.
///
/// # Errors
/// [`QueryError::InvalidNumber`] from [`DataFilter::set_value`].
pub fn parse_query<I, K, V>(pairs: I) -> QueryResult<BTreeMap<String, DataFilter>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut filters: BTreeMap<String, DataFilter> = BTreeMap::new();
    for (key, value) in pairs {
        let key = key.as_ref();
        let (field, clause) = match key.find(['>', '<']) {
            Some(at) => (&key[..at], key),
            None => (key, value.as_ref()),
        };
        filters.entry(field.to_string()).or_default().set_value(clause)?;
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Bounds are strict and an allow-list keeps exact matches only.
    //
    // Given
    // -----
    // - `>1`, `<4` and the list `2,3.5`.
    //
    // Expect
    // ------
    // - 2 and 3.5 pass; 1, 4 and 3 are ignored.
    fn bounds_are_strict_and_lists_exact() {
        // Arrange
        let mut filter = DataFilter::default();

        // Act
        filter.set_value(">1").unwrap();
        filter.set_value("<4").unwrap();
        filter.set_value("2,3.5").unwrap();

        // Assert
        assert!(!filter.ignore(2.0));
        assert!(!filter.ignore(3.5));
        assert!(filter.ignore(1.0));
        assert!(filter.ignore(4.0));
        assert!(filter.ignore(3.0));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let mut filter = DataFilter::default();

        assert_eq!(
            filter.set_value(">abc"),
            Err(QueryError::InvalidNumber { value: "abc".to_string() })
        );
        assert!(filter.set_value("1,,2").is_err());
    }

    #[test]
    // Purpose
    // -------
    // Symbol-bearing keys are split into field and clause; plain keys keep
    // their value.
    fn query_keys_with_symbols_are_reordered() {
        let pairs = vec![("objective>-3", ""), ("partition_index", "0,2"), ("objective<0", "")];

        let filters = parse_query(pairs).unwrap();

        assert_eq!(filters.len(), 2);
        let objective = &filters["objective"];
        assert_eq!(
            objective.value_limits,
            vec![ValueLimit { upper: false, limit: -3.0 }, ValueLimit { upper: true, limit: 0.0 }]
        );
        assert_eq!(filters["partition_index"].allowed_values, Some(vec![0.0, 2.0]));
    }
}
