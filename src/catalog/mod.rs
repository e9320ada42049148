//! Catalog records: model, file normalization, caching and the repository
//! the web layer reads from.

mod cache;
mod model;
mod normalize;
mod repository;

use std::collections::BTreeSet;

pub use cache::RecordCache;
pub use model::{fields, Record};
pub use normalize::{
    normalize_file_field, original_from_proxy_url, proxy_url, FileObject, FileReference,
};
pub use repository::{RecordRepository, RecordSource};

/// Records whose category equals `product_type`. An empty filter keeps all.
#[must_use]
pub fn filter_by_product_type(records: &[Record], product_type: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|r| product_type.is_empty() || r.product_type == product_type)
        .cloned()
        .collect()
}

/// Distinct non-empty categories, sorted.
#[must_use]
pub fn product_types(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.product_type.as_str())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, product_type: &str) -> Record {
        Record {
            record_id: id.to_string(),
            product_type: product_type.to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn test_filter_by_product_type() {
        let records = vec![
            record("a", "Lighting"),
            record("b", "Kitchen"),
            record("c", "Lighting"),
        ];

        let lighting = filter_by_product_type(&records, "Lighting");
        assert_eq!(
            lighting.iter().map(|r| r.record_id.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(filter_by_product_type(&records, "").len(), 3);
        assert!(filter_by_product_type(&records, "Garden").is_empty());
    }

    #[test]
    fn test_product_types_sorted_and_distinct() {
        let records = vec![
            record("a", "Lighting"),
            record("b", ""),
            record("c", "Kitchen"),
            record("d", "Lighting"),
        ];
        assert_eq!(product_types(&records), vec!["Kitchen", "Lighting"]);
    }
}
