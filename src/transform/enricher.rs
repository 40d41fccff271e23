//! Row provenance

use crate::etl::Transformer;
use crate::model::{ApiDataRow, EnrichedRow, SITE_FIELD, TYPE_FIELD};
use crate::sites::AddressType;

use eyre::Result;
use serde_json::Value;

/// Sets `site` and `type` on every row fetched for one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEnricher {
    site: String,
    address_type: AddressType,
}

impl RowEnricher {
    pub fn new(site: impl Into<String>, address_type: AddressType) -> Self {
        Self {
            site: site.into(),
            address_type,
        }
    }

    /// Annotate one row; nothing but the two injected fields changes
    pub fn annotate(&self, mut row: ApiDataRow) -> EnrichedRow {
        row.extra
            .insert(SITE_FIELD.to_string(), Value::String(self.site.clone()));
        row.extra.insert(
            TYPE_FIELD.to_string(),
            Value::String(self.address_type.label().to_string()),
        );
        EnrichedRow { row }
    }

    /// Annotate every row, preserving order and count
    pub fn enrich(&self, rows: Vec<ApiDataRow>) -> Vec<EnrichedRow> {
        rows.into_iter().map(|row| self.annotate(row)).collect()
    }
}

/// Tag `rows` fetched for `site` with the site and its address-type label
pub fn enrich(rows: Vec<ApiDataRow>, site: &str, address_type: AddressType) -> Vec<EnrichedRow> {
    RowEnricher::new(site, address_type).enrich(rows)
}

impl Transformer for RowEnricher {
    type Input = ApiDataRow;
    type Output = EnrichedRow;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(self.annotate(input))
    }
}
