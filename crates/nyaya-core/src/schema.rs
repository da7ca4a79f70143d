/// Arrow schema of the persisted BNS corpus table.
pub mod corpus {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// Lance table holding one row per BNS section.
    pub const TABLE: &str = "bns_sections";

    pub const TEXT: &str = "text";
    pub const VECTOR: &str = "vector";

    /// Columns never surfaced as document metadata.
    pub const RESERVED: &[&str] = &[TEXT, VECTOR, "_distance", "_rowid"];

    /// Schema for corpus rows with `dim`-dimensional embeddings.
    pub fn schema(dim: i32) -> Schema {
        Schema::new(vec![
            Field::new(TEXT, DataType::Utf8, false),
            Field::new(crate::SECTION_KEY, DataType::Utf8, true),
            Field::new(crate::SECTION_NAME_KEY, DataType::Utf8, true),
            Field::new(
                VECTOR,
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
                false,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::corpus;

    #[test]
    fn corpus_schema_has_expected_fields() {
        let schema = corpus::schema(384);
        assert_eq!(schema.fields().len(), 4);
        assert!(schema.field_with_name("text").is_ok());
        assert!(schema.field_with_name("Section").is_ok());
        assert!(schema.field_with_name("Section_name").is_ok());
        assert!(schema.field_with_name("vector").is_ok());
    }

    #[test]
    fn metadata_columns_nullable() {
        let schema = corpus::schema(8);
        assert!(schema.field_with_name("Section").unwrap().is_nullable());
        assert!(!schema.field_with_name("text").unwrap().is_nullable());
    }
}
