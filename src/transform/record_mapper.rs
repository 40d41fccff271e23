//! Mapping enriched rows onto the output schema

use super::convert;
use crate::error::Result;
use crate::etl::Transformer;
use crate::model::{DynamicValue, EnrichedRow, Metric};
use crate::record::TypedRecord;
use crate::schema::{Field, OutputSchema};

/// Where a schema field's value comes from in a row
#[derive(Debug, Clone, PartialEq, Eq)]
enum Accessor {
    /// Position in the row's dimension values
    Dimension(usize),
    Metric(Metric),
    /// Injected provenance or any other field the API returned
    Extra(String),
}

/// Converts enriched rows into typed records.
///
/// Each schema field is resolved to an accessor once: a configured dimension name
/// wins over a metric of the same name, anything else is looked up among the
/// row's extra fields. Values that are absent leave the field unset.
#[derive(Debug, Clone)]
pub struct RecordMapper {
    bindings: Vec<(Field, Accessor)>,
}

impl RecordMapper {
    pub fn new(schema: &OutputSchema, dimensions: &[String]) -> Self {
        let bindings = schema
            .fields()
            .iter()
            .map(|field| {
                let accessor = match dimensions.iter().position(|d| *d == field.name) {
                    Some(index) => Accessor::Dimension(index),
                    None => match Metric::from_name(&field.name) {
                        Some(metric) => Accessor::Metric(metric),
                        None => Accessor::Extra(field.name.clone()),
                    },
                };
                log::trace!("Field {} reads {:?}", field, accessor);
                (field.clone(), accessor)
            })
            .collect();

        Self { bindings }
    }

    fn value(accessor: &Accessor, row: &EnrichedRow) -> Option<DynamicValue> {
        match accessor {
            Accessor::Dimension(index) => row
                .row
                .dimension(*index)
                .map(|v| DynamicValue::Text(v.to_string())),
            Accessor::Metric(metric) => Some(DynamicValue::Number(row.row.metric(*metric))),
            Accessor::Extra(name) => row.field(name).and_then(DynamicValue::from_json),
        }
    }

    /// Build the typed record for one row; the first failing field fails the record
    pub fn map(&self, row: &EnrichedRow) -> Result<TypedRecord> {
        let mut record = TypedRecord::new();
        for (field, accessor) in &self.bindings {
            let value = Self::value(accessor, row);
            if let Some(typed) = convert(value.as_ref(), field)? {
                record.set(field.name.clone(), typed);
            }
        }
        Ok(record)
    }
}

impl Transformer for RecordMapper {
    type Input = EnrichedRow;
    type Output = TypedRecord;

    fn transform(&self, input: Self::Input) -> eyre::Result<Self::Output> {
        Ok(self.map(&input)?)
    }
}
