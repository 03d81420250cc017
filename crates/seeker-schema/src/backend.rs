use std::error::Error as StdError;

use uuid::Uuid;

/// The document under construction as the schema engine walks an
/// input object (spec §4.F entry point: "`document` is the backend
/// Document being built"). Term/value accumulation only; the backend
/// decides how these become posting lists and value slots.
pub trait Document {
    /// Adds a term under `prefix`. `position` is `Some` for `TEXT`
    /// fields (1-indexed within the field's value list, spec §4.F.3
    /// "Ordering"), `None` for boolean/whole-value terms.
    fn add_term(&mut self, prefix: &str, term: &[u8], position: Option<u32>, weight: u32);

    /// Adds a boolean term (no position, no weight) under `prefix`
    /// (spec §4.F.3 "Terms... Under TERM, lowercase iff not bool_term,
    /// then add as a boolean term").
    fn add_boolean_term(&mut self, prefix: &str, term: &[u8]);

    /// Accumulates a value under `slot` (spec §4.F step 5: "serialize
    /// the set of values via a length-prefixed `StringList` and call
    /// `add_value(slot, blob)`"). For geo fields this is a *merge*
    /// (union of ranges, union of centroids) rather than a plain
    /// append (spec §4.F.3 "Values").
    fn add_value(&mut self, slot: u32, value: &[u8]);
}

/// The black-boxed inverted-index library the core assumes (spec §1
/// "Explicitly out of scope": "the underlying inverted-index library").
/// Only its contract is modeled here: term posting lists, value slots,
/// MSet retrieval, document add/replace/delete, commit, and
/// uuid/revision metadata.
pub trait IndexBackend {
    type DocumentId: Clone;
    type Document: Document;
    type Error: StdError + Send + Sync + 'static;

    fn new_document(&mut self) -> Self::Document;

    fn add_document(&mut self, doc: Self::Document) -> Result<Self::DocumentId, Self::Error>;
    fn replace_document(&mut self, id: &Self::DocumentId, doc: Self::Document) -> Result<(), Self::Error>;
    fn delete_document(&mut self, id: &Self::DocumentId) -> Result<(), Self::Error>;

    /// Undoes any not-yet-committed writes for the current transaction
    /// (spec §4.H "Cancellation": "any in-progress write is rolled
    /// back via the backend's `cancel()`").
    fn cancel(&mut self) -> Result<(), Self::Error>;

    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Reopens the index after a `DatabaseError` so the caller's
    /// single replace-retry (spec §4.F.3 "Failure") has a clean slate.
    fn recover_index(&mut self) -> Result<(), Self::Error>;

    fn get_metadata(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;
    fn set_metadata(&mut self, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    fn uuid(&self) -> Uuid;
    fn revision(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Default)]
    struct RecordingDocument {
        terms: Vec<(String, Vec<u8>, Option<u32>, u32)>,
        boolean_terms: Vec<(String, Vec<u8>)>,
        values: BTreeMap<u32, Vec<u8>>,
    }

    impl Document for RecordingDocument {
        fn add_term(&mut self, prefix: &str, term: &[u8], position: Option<u32>, weight: u32) {
            self.terms.push((prefix.to_string(), term.to_vec(), position, weight));
        }
        fn add_boolean_term(&mut self, prefix: &str, term: &[u8]) {
            self.boolean_terms.push((prefix.to_string(), term.to_vec()));
        }
        fn add_value(&mut self, slot: u32, value: &[u8]) {
            self.values.insert(slot, value.to_vec());
        }
    }

    #[test]
    fn recording_document_accumulates_calls() {
        let mut doc = RecordingDocument::default();
        doc.add_term("Xtitle", b"hello", Some(1), 1);
        doc.add_boolean_term("Xid", b"42");
        doc.add_value(3, b"blob");
        assert_eq!(doc.terms.len(), 1);
        assert_eq!(doc.boolean_terms.len(), 1);
        assert_eq!(doc.values.get(&3), Some(&b"blob".to_vec()));
    }
}
