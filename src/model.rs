// Request and response shapes exchanged with the Mockaroo service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One output column of an inline generate request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Choices for list-style types such as "Custom List".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            field_type: field_type.into(),
            values: None,
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Output serialization of generated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Csv,
    Txt,
    Xml,
    Sql,
}

impl Format {
    pub const ALL: [Format; 5] = [Format::Json, Format::Csv, Format::Txt, Format::Xml, Format::Sql];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Txt => "txt",
            Format::Xml => "xml",
            Format::Sql => "sql",
        }
    }

    /// Only JSON is parsed; every other format comes back as text.
    pub fn is_structured(&self) -> bool {
        matches!(self, Format::Json)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Format::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == lowered)
            .ok_or_else(|| format!("unknown format '{}' (expected json, csv, txt, xml or sql)", s))
    }
}

/// Parameters of a generate call. Exactly one of `schema` or `fields`
/// must be set.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub schema: Option<String>,
    pub fields: Option<Vec<FieldSpec>>,
    pub count: u32,
    pub format: Format,
    /// Header row for csv/txt output. Left to the service when `None`.
    pub header: Option<bool>,
    /// Ask for a JSON array even for a single record.
    pub array: bool,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        GenerateRequest {
            schema: None,
            fields: None,
            count: 1,
            format: Format::Json,
            header: None,
            array: false,
        }
    }
}

impl GenerateRequest {
    pub fn from_schema(schema: impl Into<String>) -> Self {
        GenerateRequest {
            schema: Some(schema.into()),
            ..Default::default()
        }
    }

    pub fn from_fields(fields: Vec<FieldSpec>) -> Self {
        GenerateRequest {
            fields: Some(fields),
            ..Default::default()
        }
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn header(mut self, header: bool) -> Self {
        self.header = Some(header);
        self
    }

    pub fn array(mut self, array: bool) -> Self {
        self.array = array;
        self
    }
}

/// A parameter accepted by a field type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Value,
}

/// Metadata for one field type published by the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    /// Category of the generated value (string, integer, ...).
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parameters: Vec<TypeParameter>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The types endpoint has been seen both as a bare array and wrapped in
/// `{"types": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum TypesPayload {
    List(Vec<TypeDescriptor>),
    Wrapped { types: Vec<TypeDescriptor> },
}

impl TypesPayload {
    pub(crate) fn into_types(self) -> Vec<TypeDescriptor> {
        match self {
            TypesPayload::List(types) | TypesPayload::Wrapped { types } => types,
        }
    }
}

pub type Record = Map<String, Value>;

/// Output of a generate call, keyed by the requested format.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedData {
    /// Parsed `json` output: an array of records, or a single record
    /// object when one row was requested.
    Json(Value),
    /// Raw `csv`, `txt`, `xml` or `sql` output.
    Text(String),
}

impl GeneratedData {
    /// Records of a JSON result, a single object counting as one record.
    /// Empty for text output.
    pub fn records(&self) -> Vec<&Record> {
        match self {
            GeneratedData::Json(Value::Array(items)) => {
                items.iter().filter_map(Value::as_object).collect()
            }
            GeneratedData::Json(Value::Object(record)) => vec![record],
            _ => Vec::new(),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            GeneratedData::Json(value) => Some(value),
            GeneratedData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeneratedData::Text(text) => Some(text),
            GeneratedData::Json(_) => None,
        }
    }
}

/// Service confirmation for dataset upload and delete.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DatasetConfirmation {
    #[serde(default)]
    pub success: bool,
    /// Everything else the service echoed back (name, row count, ...).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(DatasetConfirmation),
    /// The dataset did not exist and the client is configured to treat
    /// that as success.
    Missing,
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted(_))
    }
}
