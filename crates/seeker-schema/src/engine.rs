use std::collections::BTreeMap;
use std::collections::BTreeSet;

use seeker_codec::{guess_type, Typed};
use seeker_types::{CastKind, Error};
use serde_json::Value;

use crate::backend::Document;
use crate::sep_types::{ArrayType, ConcreteType};
use crate::specification::{assign_slot, Specification, BAD_SLOT, DB_SLOT_ROOT};
use crate::tree::{SchemaNode, SchemaRoot};

/// HTTP method a script hook reacts to (spec §4.F.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Put,
    Patch,
    Delete,
    Get,
    Post,
}

/// Opaque scripting engine contract (spec §1 "Explicitly out of
/// scope": "Scripting engines (treated as an opaque *ScriptHost* with
/// a compile→invoke contract)").
pub trait ScriptHost {
    fn compile(&self, hash: u64, body: &str) -> Result<Box<dyn CompiledScript>, Error>;
}

pub trait CompiledScript {
    fn invoke(&self, method: HttpMethod, object: &Value, pre_image: &Value) -> Result<Value, Error>;
}

/// Runs the script hook if the field declares one and a host is wired
/// in (spec §4.F.2). The returned object replaces `object`; a non-map
/// return is a *ClientError*.
pub fn run_script_hook(
    spec: &Specification,
    host: Option<&dyn ScriptHost>,
    object: Value,
    method: HttpMethod,
    pre_image: &Value,
) -> Result<Value, Error> {
    let (Some(body), Some(host)) = (&spec.script, host) else {
        return Ok(object);
    };
    let hash = fnv1a64(body.as_bytes());
    let compiled = host.compile(hash, body)?;
    let result = compiled.invoke(method, &object, pre_image)?;
    if result.is_object() {
        Ok(result)
    } else {
        Err(Error::ClientError("script hook must return an object".to_string()))
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Is `key` a reserved, `_`-prefixed schema directive rather than a
/// user field (spec §4.F step 2)? `_id` is handled separately: it is
/// `_`-prefixed but is a real, indexed field (spec §4.E step 5).
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_')
}

/// Is `key` a comment, skipped entirely (spec §4.F step 4)?
pub fn is_comment_key(key: &str) -> bool {
    key.starts_with('#')
}

/// `is_valid` (spec §4.F.1): non-empty, no reserved path separators or
/// cast-tag marker inside a single segment.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', '#']) && !segment.starts_with('_')
}

/// A single-key object whose key is a registered cast tag is a typed
/// scalar (spec §4.F step 4 "a Map with a single cast-tag key"), not a
/// nested object to recurse into.
fn is_cast_tag_object(map: &serde_json::Map<String, Value>) -> bool {
    map.len() == 1 && map.keys().next().is_some_and(|k| CastKind::from_tag(k).is_some())
}

/// Resolves the child [`Specification`] for one path segment (spec
/// §4.F.1 `index_subproperties`): feed from the persisted tree if a
/// child exists, otherwise detect whether the segment is a UUID
/// (falling back to a plain `add_field`).
pub fn index_subproperties(
    parent: &Specification,
    persisted_child: Option<&SchemaNode>,
    segment: &str,
    local_prefix: &str,
) -> Result<Specification, Error> {
    if !is_valid_segment(segment) {
        return Err(Error::ClientError(format!("invalid field segment `{segment}`")));
    }

    let mut spec = Specification { field_found: false, ..Specification::default() };
    spec.feed(persisted_child.and_then(SchemaNode::spec));
    spec.update_prefixes(&parent.prefix_field, local_prefix);
    spec.is_namespace = parent.is_namespace;
    spec.inside_namespace = parent.is_namespace;
    spec.uuid_path = parent.uuid_path || seeker_codec::parse_uuids(segment).map(|v| !v.is_empty()).unwrap_or(false);
    Ok(spec)
}

/// Tracks keys seen at the current object level so duplicate
/// insertion is caught (spec §4.F.1 "Duplicate-key detection").
#[derive(Debug, Default)]
pub struct SeenKeys(BTreeSet<String>);

impl SeenKeys {
    pub fn insert(&mut self, key: &str) -> Result<(), Error> {
        if !self.0.insert(key.to_string()) {
            return Err(Error::ClientError(format!("field `{key}` is duplicated")));
        }
        Ok(())
    }
}

/// Per-slot accumulation of every value a document contributed during
/// one indexing pass (spec §4.F step 5: "for each accumulated slot,
/// serialize the set of values via a length-prefixed `StringList` and
/// call `add_value(slot, blob)`"). Flushed once, after the whole
/// object tree has been walked, so multi-value arrays accumulate
/// rather than overwrite each other.
#[derive(Debug, Default)]
pub struct ValueAccumulator {
    slots: BTreeMap<u32, Vec<Vec<u8>>>,
}

impl ValueAccumulator {
    pub fn push(&mut self, slot: u32, value: Vec<u8>) {
        self.slots.entry(slot).or_default().push(value);
    }

    pub fn flush(self, document: &mut impl Document) {
        for (slot, values) in self.slots {
            let blob = seeker_codec::serialize_string_list(&values);
            document.add_value(slot, &blob);
        }
    }
}

/// Per-type indexing for one resolved leaf value (spec §4.F.3). Emits
/// terms and boolean terms into `document` for every `partial_index_spc`
/// the field's completed spec resolved to (duplicating under the UUID
/// prefix too when `UuidFieldStrategy::Both` applies), and accumulates
/// the serialized value into `values` rather than writing it straight
/// through.
pub fn index_item(
    spec: &mut Specification,
    typed: &Typed,
    document: &mut impl Document,
    values: &mut ValueAccumulator,
    partial_specs: &[String],
) -> Result<(), Error> {
    use crate::index_combination::IndexCombination;

    let wants_terms = spec.index.intersects(IndexCombination::FIELD_TERMS | IndexCombination::GLOBAL_TERMS);
    let wants_values = spec.index.intersects(IndexCombination::FIELD_VALUES | IndexCombination::GLOBAL_VALUES);

    let serialized = serialize_typed(typed)?;

    for prefix in partial_specs {
        if wants_terms {
            match spec.sep_types.concrete {
                ConcreteType::Text => {
                    for (position, word) in serialized_text(typed).split_whitespace().enumerate() {
                        document.add_term(prefix, word.as_bytes(), Some(position as u32 + 1), 1);
                    }
                }
                ConcreteType::String => {
                    document.add_term(prefix, &serialized, None, 1);
                }
                ConcreteType::Term => {
                    let term_bytes = seeker_codec::serialize_term(&serialized_text(typed), spec.bool_term);
                    document.add_boolean_term(prefix, &term_bytes);
                }
                _ => {
                    document.add_boolean_term(prefix, &serialized);
                }
            }
        }

        if wants_values {
            let slot = if prefix == &spec.prefix_field { spec.slot } else { assign_slot(prefix, spec.sep_types.concrete) };
            values.push(slot, serialized.clone());
        }
    }

    for (accuracy, prefix) in spec.accuracy.iter().zip(spec.acc_prefix.iter()) {
        if let Some(bucketed) = bucket_for_accuracy(typed, *accuracy) {
            document.add_boolean_term(prefix, &bucketed);
        }
    }

    Ok(())
}

fn serialized_text(typed: &Typed) -> String {
    match typed {
        Typed::Text(s) | Typed::String(s) | Typed::Term(s) => s.clone(),
        other => other.type_name().to_string(),
    }
}

fn serialize_typed(typed: &Typed) -> Result<Vec<u8>, Error> {
    Ok(match typed {
        Typed::Integer(v) => seeker_codec::serialize_integer(*v),
        Typed::Positive(v) => seeker_codec::serialize_positive(*v),
        Typed::Float(v) => seeker_codec::serialize_f64(*v).to_vec(),
        Typed::Boolean(b) => vec![seeker_codec::serialize_bool(*b)],
        Typed::Uuid(uuids) => seeker_codec::serialize_uuids(uuids),
        Typed::Date(v) | Typed::Time(v) | Typed::Timedelta(v) => {
            seeker_codec::serialize_datetime(v).map(|b| b.to_vec()).map_err(|e| Error::ClientError(e.to_string()))?
        }
        Typed::Geo(ewkt) => ewkt.clone().into_bytes(),
        Typed::Term(s) => s.clone().into_bytes(),
        Typed::Text(s) => seeker_codec::serialize_text(s),
        Typed::String(s) => seeker_codec::serialize_text(s),
    })
}

/// Accuracy bucketing (spec §4.F.3 "Accuracy terms"): for numeric
/// types, `floor(value/a)*a`; date/time truncate to the unit; geo
/// buckets are handled separately by the cover generator and are
/// skipped here (empty is a valid, non-error outcome per §4.A).
fn bucket_for_accuracy(typed: &Typed, accuracy: u64) -> Option<Vec<u8>> {
    match typed {
        Typed::Integer(v) if accuracy > 0 => {
            let bucketed = (*v as f64 / accuracy as f64).floor() as i64 * accuracy as i64;
            Some(seeker_codec::serialize_integer(bucketed))
        }
        Typed::Positive(v) if accuracy > 0 => {
            let bucketed = (v / accuracy) * accuracy;
            Some(seeker_codec::serialize_positive(bucketed))
        }
        Typed::Float(v) if accuracy > 0 => {
            let bucketed = (v / accuracy as f64).floor() * accuracy as f64;
            Some(seeker_codec::serialize_f64(bucketed).to_vec())
        }
        _ => None,
    }
}

fn concrete_type_of(typed: &Typed) -> ConcreteType {
    match typed {
        Typed::Integer(_) => ConcreteType::Integer,
        Typed::Positive(_) => ConcreteType::Positive,
        Typed::Float(_) => ConcreteType::Float,
        Typed::Boolean(_) => ConcreteType::Boolean,
        Typed::Uuid(_) => ConcreteType::Uuid,
        Typed::Date(_) => ConcreteType::Date,
        Typed::Time(_) => ConcreteType::Time,
        Typed::Timedelta(_) => ConcreteType::Timedelta,
        Typed::Geo(_) => ConcreteType::Geo,
        Typed::Term(_) => ConcreteType::Term,
        Typed::Text(_) => ConcreteType::Text,
        Typed::String(_) => ConcreteType::String,
    }
}

/// Resolves a field's concrete type and type-specific defaults (spec
/// §4.E steps 3-7) against one guessed value, then indexes it.
///
/// Step 3, consistency: once `field_spec` already carries a fixed
/// concrete type (either from a persisted schema via `feed`, or from
/// an earlier value in this same array), a conflicting guess is
/// rejected rather than silently overwriting the fixed type.
fn finalize_and_index(
    field_spec: &mut Specification,
    is_id_field: bool,
    typed: &Typed,
    document: &mut impl Document,
    values: &mut ValueAccumulator,
) -> Result<(), Error> {
    let guessed = concrete_type_of(typed);

    if field_spec.concrete {
        let mut user = field_spec.clone();
        user.sep_types.concrete = guessed;
        field_spec.check_consistency(&field_spec.prefix_field.clone(), &user)?;
    } else {
        field_spec.sep_types.concrete = guessed;
    }

    if !field_spec.complete {
        field_spec.validate_required();
        if is_id_field {
            field_spec.set_default_id_spc();
        }
        if field_spec.slot == BAD_SLOT {
            field_spec.slot = assign_slot(&field_spec.prefix_field, field_spec.sep_types.concrete);
        }
    }
    let partial_specs = field_spec.complete_index_specs();

    if field_spec.strict && !field_spec.concrete {
        return Err(Error::MissingType { field: field_spec.prefix_field.clone() });
    }

    index_item(field_spec, typed, document, values, &partial_specs)
}

/// Resolves and indexes one leaf value under `field_spec` (spec §4.F
/// step 4): a single-key cast-tag object and any plain scalar are
/// typed directly; any other object recurses via [`index_object`]; an
/// array walks each element through the same branching; `Null`/absent
/// emits a partial-path boolean term for namespace fields only.
#[allow(clippy::too_many_arguments)]
fn index_leaf(
    field_spec: &mut Specification,
    persisted_child: Option<&SchemaNode>,
    value: &Value,
    document: &mut impl Document,
    bool_term_default: bool,
    values: &mut ValueAccumulator,
    is_id_field: bool,
) -> Result<(), Error> {
    match value {
        Value::Null => {
            if field_spec.is_namespace {
                document.add_boolean_term(&field_spec.prefix_field, b"");
            }
            Ok(())
        }
        Value::Object(map) if is_cast_tag_object(map) => {
            let typed =
                guess_type(value, field_spec.bool_term || bool_term_default).map_err(|e| Error::ClientError(e.to_string()))?;
            finalize_and_index(field_spec, is_id_field, &typed, document, values)
        }
        Value::Object(map) => index_object(field_spec, persisted_child, map, document, bool_term_default, values, false),
        Value::Array(items) => {
            field_spec.sep_types.array = ArrayType::Array;
            for item in items {
                match item {
                    Value::Object(inner) if !is_cast_tag_object(inner) => {
                        index_object(field_spec, persisted_child, inner, document, bool_term_default, values, false)?;
                    }
                    _ => {
                        let typed = guess_type(item, field_spec.bool_term || bool_term_default)
                            .map_err(|e| Error::ClientError(e.to_string()))?;
                        finalize_and_index(field_spec, is_id_field, &typed, document, values)?;
                    }
                }
            }
            Ok(())
        }
        scalar => {
            let typed =
                guess_type(scalar, field_spec.bool_term || bool_term_default).map_err(|e| Error::ClientError(e.to_string()))?;
            finalize_and_index(field_spec, is_id_field, &typed, document, values)
        }
    }
}

/// Walks one object level (spec §4.F step 4), resolving and indexing
/// each non-reserved child key, then recursing into nested objects via
/// `index_subproperties` + `index_leaf`. `is_root` gates the `_id`
/// special case (spec §4.E step 5), which only applies to the
/// document's own top-level `_id`, not a nested field of the same name.
#[allow(clippy::too_many_arguments)]
fn index_object(
    parent: &Specification,
    parent_node: Option<&SchemaNode>,
    map: &serde_json::Map<String, Value>,
    document: &mut impl Document,
    bool_term_default: bool,
    values: &mut ValueAccumulator,
    is_root: bool,
) -> Result<(), Error> {
    let mut seen = SeenKeys::default();
    for (key, value) in map {
        if is_comment_key(key) {
            continue;
        }
        let is_id_field = is_root && key == "_id";
        if is_reserved_key(key) && !is_id_field {
            continue;
        }
        if !parent.recurse && !key.starts_with('_') {
            continue;
        }
        seen.insert(key)?;

        let persisted_child = parent_node.and_then(|n| n.child(key));
        let mut field_spec = index_subproperties(parent, persisted_child, key, key)?;
        index_leaf(&mut field_spec, persisted_child, value, document, bool_term_default, values, is_id_field)?;
    }
    Ok(())
}

/// Entry point (spec §4.F): resets the root spec, optionally runs the
/// root's script hook, then recursively walks `object`, resolving and
/// indexing every non-reserved field at every depth before flushing
/// the accumulated per-slot values.
pub fn index(
    object: &Value,
    schema: &SchemaRoot,
    document: &mut impl Document,
    bool_term_default: bool,
    script_host: Option<&dyn ScriptHost>,
    method: HttpMethod,
    pre_image: &Value,
) -> Result<(), Error> {
    let Value::Object(map) = object else {
        return Err(Error::ClientError("document root must be an object".to_string()));
    };

    let SchemaNode::Inline { spec: root_spec, .. } = &schema.root else {
        return Err(Error::ClientError("cannot index directly into a foreign schema root".to_string()));
    };

    if !map.contains_key("_id") {
        return Err(Error::MissingRequired { field: "_id".to_string() });
    }

    let mut root = root_spec.clone();
    root.slot = DB_SLOT_ROOT;

    let rewritten = run_script_hook(&root, script_host, Value::Object(map.clone()), method, pre_image)?;
    let Value::Object(map) = &rewritten else {
        return Err(Error::ClientError("script hook must return an object".to_string()));
    };

    let mut values = ValueAccumulator::default();
    index_object(&root, Some(&schema.root), map, document, bool_term_default, &mut values, true)?;
    values.flush(document);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as StdBTreeMap;

    #[derive(Debug, Default)]
    struct RecordingDocument {
        terms: Vec<(String, Vec<u8>)>,
        values: StdBTreeMap<u32, Vec<u8>>,
    }

    impl Document for RecordingDocument {
        fn add_term(&mut self, prefix: &str, term: &[u8], _position: Option<u32>, _weight: u32) {
            self.terms.push((prefix.to_string(), term.to_vec()));
        }
        fn add_boolean_term(&mut self, prefix: &str, term: &[u8]) {
            self.terms.push((prefix.to_string(), term.to_vec()));
        }
        fn add_value(&mut self, slot: u32, value: &[u8]) {
            self.values.insert(slot, value.to_vec());
        }
    }

    fn index_simple(doc: &Value) -> Result<RecordingDocument, Error> {
        let schema = SchemaRoot::new_inline(Specification::default());
        let mut document = RecordingDocument::default();
        index(doc, &schema, &mut document, false, None, HttpMethod::Put, &Value::Null)?;
        Ok(document)
    }

    #[test]
    fn duplicate_keys_at_the_same_level_are_rejected() {
        let mut seen = SeenKeys::default();
        seen.insert("title").unwrap();
        assert!(seen.insert("title").is_err());
    }

    #[test]
    fn invalid_segment_is_rejected() {
        let parent = Specification::default();
        assert!(index_subproperties(&parent, None, "", "").is_err());
        assert!(index_subproperties(&parent, None, "a/b", "a/b").is_err());
    }

    #[test]
    fn indexes_a_simple_document() {
        let doc = serde_json::json!({ "_id": "doc-1", "title": "hello", "age": 42 });
        let document = index_simple(&doc).unwrap();
        assert!(!document.values.is_empty());
    }

    #[test]
    fn missing_id_is_rejected() {
        let doc = serde_json::json!({ "title": "hello" });
        assert!(matches!(index_simple(&doc), Err(Error::MissingRequired { .. })));
    }

    #[test]
    fn id_field_gets_forced_defaults_during_indexing() {
        let doc = serde_json::json!({ "_id": "doc-1" });
        let document = index_simple(&doc).unwrap();
        assert!(document.terms.iter().any(|(prefix, _)| prefix == "_id"));
        assert!(!document.values.contains_key(&crate::specification::DB_SLOT_ID));
    }

    #[test]
    fn recurses_into_nested_objects() {
        let doc = serde_json::json!({ "_id": "doc-1", "addr": { "city": "Springfield" } });
        let document = index_simple(&doc).unwrap();
        assert!(!document.values.is_empty());
    }

    #[test]
    fn array_values_accumulate_into_one_string_list_per_slot() {
        let doc = serde_json::json!({ "_id": "doc-1", "tags": [10, 20, 30] });
        let document = index_simple(&doc).unwrap();
        let slot = assign_slot("tags", ConcreteType::Positive);
        let blob = document.values.get(&slot).expect("slot written once");
        let decoded = seeker_codec::unserialize_string_list(blob).unwrap();
        assert_eq!(decoded.len(), 3);
    }

    #[test]
    fn conflicting_type_on_a_fixed_field_is_rejected() {
        let parent = Specification::default();
        let mut persisted = index_subproperties(&parent, None, "age", "age").unwrap();
        persisted.sep_types.concrete = ConcreteType::Integer;
        persisted.concrete = true;
        let persisted_node = SchemaNode::new_inline(persisted);

        let schema = SchemaRoot::new_inline(Specification::default());
        let SchemaNode::Inline { children, .. } = &schema.root else { unreachable!() };
        let mut children = children.clone();
        children.insert("age".to_string(), persisted_node);
        let schema = SchemaRoot { version: schema.version, root: SchemaNode::Inline { spec: Specification::default(), children } };

        let doc = serde_json::json!({ "_id": "doc-1", "age": "not a number" });
        let mut document = RecordingDocument::default();
        let result = index(&doc, &schema, &mut document, false, None, HttpMethod::Put, &Value::Null);
        assert!(matches!(result, Err(Error::ClientError(_))));
    }

    #[test]
    fn rejects_duplicate_keys_via_index() {
        // serde_json::Map collapses literal duplicate keys before we ever see them,
        // so duplicate detection is exercised directly above; this just confirms
        // indexing a well-formed document doesn't spuriously trip it.
        let doc = serde_json::json!({ "_id": "doc-1", "a": 1, "b": 2 });
        assert!(index_simple(&doc).is_ok());
    }
}
