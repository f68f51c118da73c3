use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::Read;

/// A single cell value as returned by the query backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Blank means "no usable label": null, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Truthiness as a loosely-typed frontend would judge it.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => *n != 0.0 && !n.is_nan(),
            Scalar::Text(s) => !s.is_empty(),
        }
    }

    /// Text shown in a table cell. Null renders as nothing.
    pub fn cell_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) if n.is_nan() => f.write_str("NaN"),
            Scalar::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // -0 prints as 0
            Scalar::Number(n) => write!(f, "{}", n + 0.0),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

/// One row of a query result. Field order is the order the backend sent.
pub type Record = IndexMap<String, Scalar>;

/// Ordered rows of a query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Create a ResultSet from a JSON Array of Objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let mut records = Vec::with_capacity(array.len());
        for (index, item) in array.iter().enumerate() {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Item {} in array is not an object", index))?;

            let mut record = Record::with_capacity(obj.len());
            for (field, val) in obj {
                let scalar = match val {
                    Value::String(s) => Scalar::Text(s.clone()),
                    Value::Number(n) => Scalar::Number(
                        n.as_f64()
                            .ok_or_else(|| anyhow!("Number in field '{}' is out of range", field))?,
                    ),
                    Value::Bool(b) => Scalar::Bool(*b),
                    Value::Null => Scalar::Null,
                    _ => {
                        return Err(anyhow!(
                            "Unsupported value type for field '{}' in item {}",
                            field,
                            index
                        ))
                    }
                };
                record.insert(field.clone(), scalar);
            }
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input).context("Input is not valid JSON")?;
        Self::from_json(&value)
    }

    /// Read CSV with a header row. Every cell arrives as text; an empty cell
    /// becomes an empty string, not null.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for (row_idx, row) in csv_reader.records().enumerate() {
            let row = row.with_context(|| format!("Failed to read CSV row {}", row_idx + 1))?;
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), Scalar::Text(v.to_string())))
                .collect();
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Field names in the first record's order.
    pub fn fields(&self) -> Vec<String> {
        self.records
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Keep the records matching `keep`, preserving order.
    pub fn filtered<F>(&self, mut keep: F) -> ResultSet
    where
        F: FnMut(&Record) -> bool,
    {
        ResultSet {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl FromIterator<Record> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_field_order() {
        let value = json!([
            {"zeta": 1, "alpha": "a", "mid": null},
            {"zeta": 2, "alpha": "b", "mid": true}
        ]);
        let data = ResultSet::from_json(&value).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.fields(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(data.records()[0]["mid"], Scalar::Null);
        assert_eq!(data.records()[1]["mid"], Scalar::Bool(true));
    }

    #[test]
    fn test_from_json_rejects_nested() {
        let value = json!([{"a": {"b": 1}}]);
        assert!(ResultSet::from_json(&value).is_err());

        let value = json!({"a": 1});
        assert!(ResultSet::from_json(&value).is_err());
    }

    #[test]
    fn test_from_json_empty_array() {
        let data = ResultSet::from_json_str("[]").unwrap();
        assert!(data.is_empty());
        assert!(data.fields().is_empty());
    }

    #[test]
    fn test_from_csv() {
        let csv = "country, gdp\nUAE,100\nKSA,\n";
        let data = ResultSet::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(data.fields(), vec!["country", "gdp"]);
        assert_eq!(data.records()[0]["gdp"], Scalar::from("100"));
        assert_eq!(data.records()[1]["gdp"], Scalar::from(""));
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Number(100.0).to_string(), "100");
        assert_eq!(Scalar::Number(2.5).to_string(), "2.5");
        assert_eq!(Scalar::Number(-0.0).to_string(), "0");
        assert_eq!(Scalar::Null.to_string(), "null");
        assert_eq!(Scalar::Null.cell_text(), "");
        assert!(Scalar::from("  ").is_blank());
        assert!(!Scalar::Number(0.0).is_truthy());
    }
}
