/// `Text`/`String` store the value verbatim (spec §4.B); both share
/// this function, the serializer never distinguishes them once the
/// bytes reach this layer (the schema engine analyzer that splits
/// `Text` into positional terms is a separate concern).
pub fn serialize_text(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// `Term` is indexed verbatim as a single boolean term, lowercased
/// unless `bool_term` is set (spec §4.B, §4.E default rule "For Term,
/// default `bool_term` to name contains uppercase").
pub fn serialize_term(value: &str, bool_term: bool) -> Vec<u8> {
    if bool_term {
        value.as_bytes().to_vec()
    } else {
        value.to_lowercase().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_verbatim() {
        assert_eq!(serialize_text("Hello World"), b"Hello World");
    }

    #[test]
    fn term_lowercases_unless_bool_term() {
        assert_eq!(serialize_term("Hello", false), b"hello");
        assert_eq!(serialize_term("Hello", true), b"Hello");
    }
}
