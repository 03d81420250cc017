use bitflags::bitflags;

bitflags! {
    /// Index-combination set (spec §3 "Index-combination set"): what a
    /// field emits when indexed. Stored as a bit set over four axes so
    /// the named combinations below are just well-known unions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IndexCombination: u8 {
        const FIELD_TERMS   = 0b0001;
        const FIELD_VALUES  = 0b0010;
        const GLOBAL_TERMS  = 0b0100;
        const GLOBAL_VALUES = 0b1000;
    }
}

impl IndexCombination {
    pub const NONE: Self = Self::empty();
    pub const FIELD_ALL: Self = Self::FIELD_TERMS.union(Self::FIELD_VALUES);
    pub const TERMS: Self = Self::FIELD_TERMS.union(Self::GLOBAL_TERMS);
    pub const GLOBAL_TERMS_FIELD_VALUES: Self = Self::GLOBAL_TERMS.union(Self::FIELD_VALUES);
    pub const GLOBAL_TERMS_FIELD_ALL: Self = Self::GLOBAL_TERMS.union(Self::FIELD_ALL);
    pub const GLOBAL_VALUES_FIELD_TERMS: Self = Self::GLOBAL_VALUES.union(Self::FIELD_TERMS);
    pub const VALUES: Self = Self::FIELD_VALUES.union(Self::GLOBAL_VALUES);
    pub const GLOBAL_VALUES_FIELD_ALL: Self = Self::GLOBAL_VALUES.union(Self::FIELD_ALL);
    pub const GLOBAL_ALL: Self = Self::GLOBAL_TERMS.union(Self::GLOBAL_VALUES);
    pub const GLOBAL_ALL_FIELD_TERMS: Self = Self::GLOBAL_ALL.union(Self::FIELD_TERMS);
    pub const GLOBAL_ALL_FIELD_VALUES: Self = Self::GLOBAL_ALL.union(Self::FIELD_VALUES);
    pub const ALL: Self = Self::GLOBAL_ALL.union(Self::FIELD_ALL);

    /// Parses a configuration name. Both the unidirectional spelling
    /// (`"global_terms,field_values"`) and its commuted form
    /// (`"field_values,global_terms"`) resolve to the same value,
    /// since the underlying representation is a plain bit set (spec
    /// §3: "Configuration names *both* the unidirectional and commuted
    /// spellings").
    pub fn parse(spelling: &str) -> Option<Self> {
        let mut combo = IndexCombination::NONE;
        for part in spelling.split(',') {
            combo |= match part.trim() {
                "none" => IndexCombination::NONE,
                "field_terms" => IndexCombination::FIELD_TERMS,
                "field_values" => IndexCombination::FIELD_VALUES,
                "field_all" => IndexCombination::FIELD_ALL,
                "global_terms" => IndexCombination::GLOBAL_TERMS,
                "terms" => IndexCombination::TERMS,
                "global_values" => IndexCombination::GLOBAL_VALUES,
                "values" => IndexCombination::VALUES,
                "global_all" => IndexCombination::GLOBAL_ALL,
                "all" => IndexCombination::ALL,
                _ => return None,
            };
        }
        Some(combo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commuted_spellings_are_equal() {
        let a = IndexCombination::parse("global_terms,field_values").unwrap();
        let b = IndexCombination::parse("field_values,global_terms").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, IndexCombination::GLOBAL_TERMS_FIELD_VALUES);
    }

    #[test]
    fn named_combinations_match_expected_bits() {
        assert_eq!(IndexCombination::ALL, IndexCombination::all());
        assert_eq!(IndexCombination::FIELD_ALL, IndexCombination::FIELD_TERMS | IndexCombination::FIELD_VALUES);
    }
}
