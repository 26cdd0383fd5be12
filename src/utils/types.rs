use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Column that always leads the tabular output
pub const ID_COLUMN: &str = "id";

/// Individual cell values of a flattened row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(String), // as delivered by the backend, usually ISO 8601
    Null,
}

impl Value {
    /// Convert a scalar JSON value. Arrays and objects are kept as their JSON text.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Text(n.to_string())
                }
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => Value::Text(json.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text used for CSV cells; null becomes an empty cell
    pub fn to_cell_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// Value slot of an attribute, one variant per attribute kind
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Date(Value),
    String(Value),
    Number(Value),
    /// `enumValue { value }`; the enum id is kept but never becomes a column
    Enum { value: Value, id: Option<String> },
    /// Target ids plus the targets that were expanded inline, if any
    Reference { ids: Vec<String>, targets: Vec<InformationObject> },
    /// Kind could not be determined, first non-null payload field
    Untyped(Value),
}

/// A named attribute of an information object or relationship
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub system_name: String,
    pub value: AttributeValue,
}

/// An information object (entity) or relationship as found in a response.
///
/// `fields` holds every scalar top-level field in response order, so `id`,
/// `clientSystemName`, `relationshipFromId` and `relationshipToId` all live there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InformationObject {
    pub fields: Vec<(String, Value)>,
    pub class_system_name: Option<String>,
    pub attributes: Vec<Attribute>,
    pub from: Option<Box<InformationObject>>,
    pub to: Option<Box<InformationObject>>,
}

impl InformationObject {
    /// Look up a scalar top-level field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn id(&self) -> Option<&Value> {
        self.field(ID_COLUMN)
    }
}

/// A flat row: column name to scalar value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing any earlier value for the same column
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.cells.insert(column.into(), value);
    }

    /// Merge another row into this one; its cells win on collision
    pub fn merge(&mut self, other: Row) {
        self.cells.extend(other.cells);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Flattened rows plus the column order used for display
#[derive(Debug, Clone)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub execution_time: Duration,
}

impl FlatTable {
    /// Build a table from rows, deriving the column order
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            columns: column_order(&rows),
            rows,
            execution_time: Duration::from_millis(0),
        }
    }

    pub fn with_execution_time(mut self, execution_time: Duration) -> Self {
        self.execution_time = execution_time;
        self
    }

    /// Get the number of rows in the table
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for FlatTable {
    fn default() -> Self {
        Self::from_rows(Vec::new())
    }
}

/// `id` first, then every other column seen in any row, sorted
pub fn column_order(rows: &[Row]) -> Vec<String> {
    let others: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.columns())
        .filter(|c| *c != ID_COLUMN)
        .collect();

    std::iter::once(ID_COLUMN)
        .chain(others)
        .map(str::to_string)
        .collect()
}
