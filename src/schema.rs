//! Output schema
//!
//! The caller describes its records with an Avro-style JSON schema:
//!
//! ```json
//! {
//!   "type": "record",
//!   "name": "searchAnalytics",
//!   "fields": [
//!     {"name": "date", "type": {"type": "int", "logicalType": "date"}},
//!     {"name": "query", "type": ["string", "null"]},
//!     {"name": "clicks", "type": "double"}
//!   ]
//! }
//! ```
//!
//! A `["T", "null"]` union marks the field nullable.

use crate::error::{ConnectorError, Result};
use serde_json::Value;
use std::fmt;

/// Physical type of an output field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Enum,
    Array,
    Map,
    Record,
}

impl FieldType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "bytes" | "fixed" => Self::Bytes,
            "string" => Self::String,
            "enum" => Self::Enum,
            "array" => Self::Array,
            "map" => Self::Map,
            "record" => Self::Record,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Map => "map",
            Self::Record => "record",
        }
    }
}

/// Semantic refinement of a physical type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalType {
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Decimal { precision: u32, scale: u32 },
    /// Declared by the schema but not convertible
    Other(String),
}

impl LogicalType {
    fn parse(field: &str, name: &str, def: &Value) -> Result<Self> {
        Ok(match name {
            "date" => Self::Date,
            "time-millis" => Self::TimeMillis,
            "time-micros" => Self::TimeMicros,
            "timestamp-millis" => Self::TimestampMillis,
            "timestamp-micros" => Self::TimestampMicros,
            "decimal" => Self::Decimal {
                precision: decimal_attr(field, def, "precision")?.ok_or_else(|| {
                    ConnectorError::InvalidSchema(format!(
                        "decimal field '{}' has no precision",
                        field
                    ))
                })?,
                // scale defaults to zero when absent
                scale: decimal_attr(field, def, "scale")?.unwrap_or(0),
            },
            other => Self::Other(other.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Date => "date",
            Self::TimeMillis => "time-millis",
            Self::TimeMicros => "time-micros",
            Self::TimestampMillis => "timestamp-millis",
            Self::TimestampMicros => "timestamp-micros",
            Self::Decimal { .. } => "decimal",
            Self::Other(name) => name,
        }
    }
}

/// One output field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub logical_type: Option<LogicalType>,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            logical_type: None,
            nullable: false,
        }
    }

    pub fn with_logical_type(mut self, logical_type: LogicalType) -> Self {
        self.logical_type = Some(logical_type);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Name of the logical type if any, else of the physical type
    pub fn display_name(&self) -> String {
        match &self.logical_type {
            Some(logical) => logical.name().to_string(),
            None => self.field_type.name().to_string(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.display_name())?;
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Ordered fields of the records handed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputSchema {
    fields: Vec<Field>,
}

impl OutputSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Parse an Avro-style record schema
    pub fn parse_json(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)
            .map_err(|e| ConnectorError::InvalidSchema(format!("not valid JSON: {}", e)))?;

        let fields = root
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| ConnectorError::InvalidSchema("missing 'fields' array".to_string()))?;

        let fields = fields
            .iter()
            .map(parse_field)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

fn parse_field(def: &Value) -> Result<Field> {
    let name = def
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ConnectorError::InvalidSchema(format!("field without name: {}", def)))?;
    let type_def = def
        .get("type")
        .ok_or_else(|| ConnectorError::InvalidSchema(format!("field '{}' has no type", name)))?;

    let (type_def, nullable) = unwrap_nullable(name, type_def)?;
    let (field_type, logical_type) = parse_type(name, type_def)?;

    Ok(Field {
        name: name.to_string(),
        field_type,
        logical_type,
        nullable,
    })
}

/// Strip `"null"` out of a union; at most one other branch may remain
fn unwrap_nullable<'a>(name: &str, def: &'a Value) -> Result<(&'a Value, bool)> {
    let Some(branches) = def.as_array() else {
        return Ok((def, false));
    };

    let non_null: Vec<&Value> = branches
        .iter()
        .filter(|b| b.as_str() != Some("null"))
        .collect();
    match non_null.as_slice() {
        [single] => Ok((*single, non_null.len() < branches.len())),
        _ => Err(ConnectorError::InvalidSchema(format!(
            "field '{}' must be a single type or a union with null",
            name
        ))),
    }
}

fn parse_type(name: &str, def: &Value) -> Result<(FieldType, Option<LogicalType>)> {
    let unknown = |t: &str| {
        ConnectorError::InvalidSchema(format!("field '{}' has unknown type '{}'", name, t))
    };

    match def {
        Value::String(t) => FieldType::from_name(t)
            .map(|ft| (ft, None))
            .ok_or_else(|| unknown(t.as_str())),
        Value::Object(obj) => {
            let t = obj.get("type").and_then(Value::as_str).ok_or_else(|| {
                ConnectorError::InvalidSchema(format!("field '{}' has no type name", name))
            })?;
            let field_type = FieldType::from_name(t).ok_or_else(|| unknown(t))?;
            let logical = obj
                .get("logicalType")
                .and_then(Value::as_str)
                .map(|l| LogicalType::parse(name, l, def))
                .transpose()?;
            Ok((field_type, logical))
        }
        other => Err(unknown(&other.to_string())),
    }
}

fn decimal_attr(field: &str, def: &Value, attr: &str) -> Result<Option<u32>> {
    let Some(value) = def.get(attr) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            ConnectorError::InvalidSchema(format!(
                "decimal field '{}' has invalid {}: {}",
                field, attr, value
            ))
        })
}
