use crate::data::ResultSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Categorical,
    Numeric,
}

/// Partition of a result set's fields into categorical and numeric, each in
/// first-record key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldClassification {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
}

impl FieldClassification {
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        if self.categorical.iter().any(|f| f == field) {
            Some(FieldKind::Categorical)
        } else if self.numeric.iter().any(|f| f == field) {
            Some(FieldKind::Numeric)
        } else {
            None
        }
    }

    /// Nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.categorical.is_empty() && self.numeric.is_empty()
    }
}

/// A field is numeric iff every record holds a finite number for it. A record
/// missing the field makes it categorical.
pub fn is_numeric_field(data: &ResultSet, field: &str) -> bool {
    !data.is_empty()
        && data
            .iter()
            .all(|record| record.get(field).map_or(false, |v| v.is_finite_number()))
}

/// Classify every key of the first record.
pub fn classify(data: &ResultSet) -> FieldClassification {
    let mut classification = FieldClassification::default();
    for field in data.fields() {
        if is_numeric_field(data, &field) {
            classification.numeric.push(field);
        } else {
            classification.categorical.push(field);
        }
    }
    classification
}

/// First numeric field in key order, if any.
pub fn first_numeric_field(data: &ResultSet) -> Option<String> {
    data.fields()
        .into_iter()
        .find(|field| is_numeric_field(data, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> ResultSet {
        ResultSet::from_json(&value).unwrap()
    }

    #[test]
    fn test_classify_mixed() {
        let rs = data(json!([
            {"country": "UAE", "gdp": 100, "year": "2020", "note": ""},
            {"country": "KSA", "gdp": "200.5", "year": "2021", "note": "x"}
        ]));
        let c = classify(&rs);
        assert_eq!(c.categorical, vec!["country", "note"]);
        assert_eq!(c.numeric, vec!["gdp", "year"]);
        assert_eq!(c.kind_of("gdp"), Some(FieldKind::Numeric));
        assert_eq!(c.kind_of("missing"), None);
    }

    #[test]
    fn test_null_and_partial_numbers_are_categorical() {
        let rs = data(json!([
            {"a": 1, "b": "12px", "c": 3},
            {"a": null, "b": "4", "c": 5}
        ]));
        let c = classify(&rs);
        assert_eq!(c.categorical, vec!["a", "b"]);
        assert_eq!(c.numeric, vec!["c"]);
    }

    #[test]
    fn test_missing_field_is_categorical() {
        let rs = data(json!([{"a": 1, "b": 2}, {"a": 3}]));
        let c = classify(&rs);
        assert_eq!(c.numeric, vec!["a"]);
        assert_eq!(c.categorical, vec!["b"]);
    }

    #[test]
    fn test_empty_result_set() {
        let c = classify(&ResultSet::default());
        assert!(c.is_empty());
        assert_eq!(first_numeric_field(&ResultSet::default()), None);
    }

    #[test]
    fn test_classification_is_stable() {
        let rs = data(json!([{"x": "a", "y": 1}, {"x": "b", "y": 2}]));
        assert_eq!(classify(&rs), classify(&rs));
        assert_eq!(first_numeric_field(&rs).as_deref(), Some("y"));
    }
}
