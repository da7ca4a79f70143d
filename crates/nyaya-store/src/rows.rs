//! Conversion from corpus RecordBatches to [`Document`]s.

use arrow::array::{Array, Float32Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use nyaya_core::{corpus, Document};

use crate::StoreError;

const DISTANCE: &str = "_distance";

/// A document paired with its search distance, when the backend reports one.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Document,
    pub distance: Option<f32>,
}

/// Convert result batches into documents, preserving row order.
///
/// The `text` column becomes the document content; every other non-reserved
/// column with a non-null value is stringified into metadata. Rows with a
/// null `text` are skipped.
pub fn documents_from_batches(batches: &[RecordBatch]) -> Result<Vec<ScoredDocument>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        documents_from_batch(batch, &mut out)?;
    }
    Ok(out)
}

fn documents_from_batch(batch: &RecordBatch, out: &mut Vec<ScoredDocument>) -> Result<(), StoreError> {
    let text_col = batch
        .column_by_name(corpus::TEXT)
        .ok_or(StoreError::MissingColumn(corpus::TEXT))?;

    let distances = batch
        .column_by_name(DISTANCE)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let schema = batch.schema();
    let meta_cols: Vec<(&str, &dyn Array)> = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .filter(|(f, _)| !corpus::RESERVED.contains(&f.name().as_str()))
        .map(|(f, c)| (f.name().as_str(), c.as_ref()))
        .collect();

    for row in 0..batch.num_rows() {
        let Some(content) = get_string(text_col.as_ref(), row) else {
            continue;
        };

        let mut document = Document::new(content);
        for &(name, col) in &meta_cols {
            if col.is_null(row) {
                continue;
            }
            let value = array_value_to_string(col, row)?;
            document.metadata.insert(name.to_string(), value);
        }

        let distance = distances
            .filter(|d| !d.is_null(row))
            .map(|d| d.value(row));

        out.push(ScoredDocument { document, distance });
    }
    Ok(())
}

/// Read a string cell from a Utf8 or LargeUtf8 column.
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        Some(arr.value(row).to_string())
    } else {
        col.as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|arr| arr.value(row).to_string())
    }
}
