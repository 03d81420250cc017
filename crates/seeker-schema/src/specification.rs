use std::collections::BTreeMap;

use seeker_types::Error;
use serde::{Deserialize, Serialize};

use crate::index_combination::IndexCombination;
use crate::sep_types::{ConcreteType, SepTypes};

/// Sentinel slot meaning "not yet assigned" (spec §3 `BAD_SLOT`).
pub const BAD_SLOT: u32 = u32::MAX;
/// The root field's fixed slot (spec §4.F step 1: "set `slot = DB_SLOT_ROOT`").
pub const DB_SLOT_ROOT: u32 = 0;
/// The fixed slot `_id` is forced onto (spec §4.E step 5).
pub const DB_SLOT_ID: u32 = 1;
/// Current schema tree format version (spec §3 "Schema tree").
pub const DB_VERSION_SCHEMA: u32 = 1;
/// Metadata key the schema tree is persisted under.
pub const RESERVED_SCHEMA: &str = "$schema";

/// Geo accuracy is stored as HTM levels; each level's term prefix is
/// derived via `HTM_START_POS - 2*level` (spec §4.E "Accuracy"). 56 is
/// the bit width of a max-level (28) trixel id, matching
/// `seeker_trixel::MAX_LEVEL * 2`.
pub const HTM_START_POS: u32 = 56;

/// Date accuracy buckets (spec §4.E), ordered coarsest-last so
/// `acc_prefix` aligns with ascending truncation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DateUnit {
    Hour,
    Day,
    Month,
    Year,
    Decade,
    Century,
}

/// Time/Timedelta accuracy buckets (spec §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TimeUnit {
    Minute,
    Hour,
}

pub fn default_numeric_accuracy() -> Vec<u64> {
    vec![100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000]
}

pub fn default_date_accuracy() -> Vec<DateUnit> {
    vec![DateUnit::Hour, DateUnit::Day, DateUnit::Month, DateUnit::Year, DateUnit::Decade, DateUnit::Century]
}

pub fn default_time_accuracy() -> Vec<TimeUnit> {
    vec![TimeUnit::Minute, TimeUnit::Hour]
}

pub fn default_geo_accuracy() -> Vec<u32> {
    vec![20, 15, 10, 5, 0]
}

/// `get_prefix(a)`: derives a field's accuracy-bucket term prefix from
/// the field prefix and the bucket's own tag (spec §4.E "Each accuracy
/// value `a` has a derived term prefix"). Geo buckets use the level's
/// `HTM_START_POS - 2*level` encoding; everything else appends the
/// bucket's ordinal.
pub fn get_prefix(field_prefix: &str, accuracy_tag: u64) -> String {
    format!("{field_prefix}{accuracy_tag:x}")
}

pub fn geo_accuracy_tag(level: u32) -> u64 {
    (HTM_START_POS - 2 * level) as u64
}

/// How a field whose path crosses a UUID segment gets indexed (spec
/// §4.E step 7 "Complete").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UuidFieldStrategy {
    /// Index only at the canonical UUID prefix.
    Uuid,
    /// Index only at the string-name prefix.
    UuidField,
    /// Index at both, duplicating term and value operations.
    #[default]
    Both,
}

/// Per-field specification record (spec §3 "Field specification").
/// Both configuration (user-declared) and derived state (computed by
/// the merging rules in §4.E).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub sep_types: SepTypes,

    pub prefix_field: String,
    pub prefix_uuid: Option<String>,

    pub slot: u32,

    pub accuracy: Vec<u64>,
    pub acc_prefix: Vec<String>,

    pub index: IndexCombination,

    pub language: Option<String>,
    pub stop_strategy: Option<String>,
    pub stem_strategy: Option<String>,
    pub stem_language: Option<String>,

    pub partials: bool,
    pub error: f64,

    pub is_namespace: bool,
    pub dynamic: bool,
    pub strict: bool,
    pub bool_term: bool,
    pub store: bool,
    pub recurse: bool,
    pub partial_paths: bool,
    pub has_uuid_prefix: bool,
    pub static_endpoint: bool,
    pub concrete: bool,
    pub complete: bool,
    pub inside_namespace: bool,
    pub uuid_field: bool,
    pub uuid_path: bool,
    pub uuid_strategy: UuidFieldStrategy,

    pub endpoint: Option<String>,
    pub script: Option<String>,

    /// Set once §4.E step 1 ("Feed") has consulted a persisted schema.
    pub field_found: bool,
}

impl Default for Specification {
    fn default() -> Self {
        Specification {
            sep_types: SepTypes::default(),
            prefix_field: String::new(),
            prefix_uuid: None,
            slot: BAD_SLOT,
            accuracy: Vec::new(),
            acc_prefix: Vec::new(),
            index: IndexCombination::ALL,
            language: None,
            stop_strategy: None,
            stem_strategy: None,
            stem_language: None,
            partials: false,
            error: 0.3,
            is_namespace: false,
            dynamic: true,
            strict: false,
            bool_term: false,
            store: true,
            recurse: true,
            partial_paths: false,
            has_uuid_prefix: false,
            static_endpoint: false,
            concrete: false,
            complete: false,
            inside_namespace: false,
            uuid_field: false,
            uuid_path: false,
            uuid_strategy: UuidFieldStrategy::default(),
            endpoint: None,
            script: None,
            field_found: false,
        }
    }
}

impl Specification {
    /// Step 1, "Feed from persisted schema" (spec §4.E): copies a
    /// previously-persisted spec's attributes into `self` and marks
    /// `field_found`. No-op for a field seen for the first time.
    pub fn feed(&mut self, persisted: Option<&Specification>) {
        if let Some(p) = persisted {
            *self = p.clone();
            self.field_found = true;
        }
    }

    /// Step 3, "Consistency check" (spec §4.E): once an attribute is
    /// fixed, a user override must match it exactly.
    pub fn check_consistency(&self, field: &str, user: &Specification) -> Result<(), Error> {
        if self.concrete && self.sep_types.concrete != user.sep_types.concrete {
            return Err(Error::ClientError(format!(
                "field `{field}`: type is already fixed to {:?}, cannot change to {:?}",
                self.sep_types.concrete, user.sep_types.concrete
            )));
        }
        if self.concrete && self.bool_term != user.bool_term {
            return Err(Error::ClientError(format!("field `{field}`: bool_term is already fixed")));
        }
        if !self.accuracy.is_empty() && !user.accuracy.is_empty() && self.accuracy != user.accuracy {
            return Err(Error::ClientError(format!("field `{field}`: accuracy is already fixed")));
        }
        if self.is_namespace != user.is_namespace && user.is_namespace {
            return Err(Error::ClientError(format!("field `{field}`: namespace is already fixed")));
        }
        Ok(())
    }

    /// Step 4, "Validate required" (spec §4.E): fills type-specific
    /// defaults once the concrete type is known.
    pub fn validate_required(&mut self) {
        match self.sep_types.concrete {
            ConcreteType::Text | ConcreteType::String | ConcreteType::Term => {
                if self.accuracy.is_empty() {
                    // These types never store values by default; clear FieldValues/GlobalValues
                    // unless the user explicitly set `index`.
                    self.index &= !(IndexCombination::FIELD_VALUES | IndexCombination::GLOBAL_VALUES);
                }
                if matches!(self.sep_types.concrete, ConcreteType::Term) {
                    self.bool_term = self.prefix_field.chars().any(|c| c.is_uppercase());
                }
            }
            ConcreteType::Float | ConcreteType::Integer | ConcreteType::Positive => {
                if self.accuracy.is_empty() {
                    self.accuracy = default_numeric_accuracy();
                }
            }
            ConcreteType::Date => {
                if self.accuracy.is_empty() {
                    self.accuracy = default_date_accuracy().into_iter().map(|u| u as u64).collect();
                }
            }
            ConcreteType::Time | ConcreteType::Timedelta => {
                if self.accuracy.is_empty() {
                    self.accuracy = default_time_accuracy().into_iter().map(|u| u as u64).collect();
                }
            }
            ConcreteType::Geo => {
                if self.accuracy.is_empty() {
                    self.accuracy = default_geo_accuracy().iter().map(|&l| geo_accuracy_tag(l)).collect();
                }
            }
            _ => {}
        }
        self.acc_prefix =
            self.accuracy.iter().map(|&a| get_prefix(&self.prefix_field, a)).collect();
        self.concrete = self.sep_types.is_concrete();
    }

    /// Step 5, "Set default spc" (spec §4.E): the `_id` field's fixed
    /// defaults.
    pub fn set_default_id_spc(&mut self) {
        self.index = IndexCombination::TERMS;
        self.slot = DB_SLOT_ID;
        self.bool_term = true;
        if matches!(self.sep_types.concrete, ConcreteType::Text | ConcreteType::String) {
            self.sep_types.concrete = ConcreteType::Term;
        }
    }

    /// Step 6, "Update prefixes" (spec §4.E): composes this field's
    /// prefix from its parent and local segment, honoring the UUID
    /// prefix strategy.
    pub fn update_prefixes(&mut self, parent_prefix: &str, local_prefix: &str) {
        self.prefix_field = format!("{parent_prefix}{local_prefix}");
        if self.uuid_path {
            self.prefix_uuid = Some(format!("{parent_prefix}<uuid>"));
        }
    }

    /// Step 7, "Complete" (spec §4.E): resolves the set of physical
    /// index configurations (`partial_index_spcs`) this field emits
    /// into.
    pub fn complete_index_specs(&mut self) -> Vec<String> {
        self.complete = true;
        if !self.uuid_path {
            return vec![self.prefix_field.clone()];
        }
        match self.uuid_strategy {
            UuidFieldStrategy::Uuid => {
                vec![self.prefix_uuid.clone().unwrap_or_else(|| self.prefix_field.clone())]
            }
            UuidFieldStrategy::UuidField => vec![self.prefix_field.clone()],
            UuidFieldStrategy::Both => {
                let mut specs = vec![self.prefix_field.clone()];
                if let Some(uuid_prefix) = &self.prefix_uuid {
                    specs.push(uuid_prefix.clone());
                }
                specs
            }
        }
    }
}

/// Slot assignment (spec §3: "assigned by hashing `prefix +
/// concrete-type byte` the first time the field is materialized").
pub fn assign_slot(prefix: &str, concrete: ConcreteType) -> u32 {
    let mut hasher_input = prefix.as_bytes().to_vec();
    hasher_input.push(concrete as u8);
    fnv1a32(&hasher_input)
}

fn fnv1a32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c9dc5;
    const PRIME: u32 = 0x01000193;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    if hash == BAD_SLOT {
        hash ^ 1
    } else {
        hash
    }
}

/// A reusable pool of named, unresolved `specification_t` attributes a
/// user supplied for a field before merging (spec §4.E steps 1-2);
/// unknown keys become child fields rather than attributes of the
/// current one.
pub type UserObject = BTreeMap<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accuracy_buckets_match_spec() {
        assert_eq!(default_numeric_accuracy(), vec![100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000]);
        assert_eq!(default_time_accuracy().len(), 2);
        assert_eq!(default_geo_accuracy(), vec![20, 15, 10, 5, 0]);
    }

    #[test]
    fn id_field_gets_forced_defaults() {
        let mut spec = Specification::default();
        spec.sep_types.concrete = ConcreteType::String;
        spec.set_default_id_spc();
        assert_eq!(spec.slot, DB_SLOT_ID);
        assert!(spec.bool_term);
        assert_eq!(spec.sep_types.concrete, ConcreteType::Term);
        assert_eq!(spec.index, IndexCombination::TERMS);
    }

    #[test]
    fn slot_assignment_is_stable_and_avoids_sentinel() {
        let a = assign_slot("title.", ConcreteType::Text);
        let b = assign_slot("title.", ConcreteType::Text);
        assert_eq!(a, b);
        assert_ne!(a, BAD_SLOT);
    }

    #[test]
    fn consistency_check_rejects_type_change() {
        let mut fixed = Specification::default();
        fixed.concrete = true;
        fixed.sep_types.concrete = ConcreteType::Integer;

        let mut user = Specification::default();
        user.sep_types.concrete = ConcreteType::Text;

        assert!(fixed.check_consistency("age", &user).is_err());
    }

    #[test]
    fn uuid_both_strategy_duplicates_specs() {
        let mut spec = Specification::default();
        spec.uuid_path = true;
        spec.uuid_strategy = UuidFieldStrategy::Both;
        spec.update_prefixes("parent.", "<uuid>.");
        let specs = spec.complete_index_specs();
        assert_eq!(specs.len(), 2);
    }
}
