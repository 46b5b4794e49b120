//! Argument validation for store operations

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// XML 1.0 `NameStartChar` ranges, minus `:`
const NAME_START: &str = concat!(
    r"A-Z_a-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}",
    r"\x{37F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}",
    r"\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}\x{10000}-\x{EFFFF}",
);

/// Extra `NameChar` ranges allowed after the first character
const NAME_REST: &str = r"\-.0-9\x{B7}\x{300}-\x{36F}\x{203F}-\x{2040}";

/// XML element names without namespace prefixes
static ELEMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!("^[{NAME_START}][{NAME_START}{NAME_REST}]*$");
    Regex::new(&pattern).expect("element name pattern is valid")
});

/// Check whether `name` can be written as an XML element name
pub fn is_element_name(name: &str) -> bool {
    ELEMENT_NAME.is_match(name)
}

/// Characters allowed in XML 1.0 documents
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn not_empty(name: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_argument(name, "must not be empty"));
    }
    Ok(())
}

fn representable(name: &'static str, value: &str) -> Result<()> {
    match value.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(Error::invalid_argument(
            name,
            format!("contains character U+{:04X} which XML cannot store", c as u32),
        )),
        None => Ok(()),
    }
}

/// Section name used for a lookup or delete
pub(crate) fn section(section: &str) -> Result<()> {
    not_empty("section", section)
}

/// Key used for a lookup or delete
pub(crate) fn key(key: &str) -> Result<()> {
    not_empty("key", key)
}

/// Section name that may be written to the file
pub(crate) fn writable_section(section: &str) -> Result<()> {
    not_empty("section", section)?;
    if !is_element_name(section) {
        return Err(Error::invalid_argument(
            "section",
            format!("'{section}' is not a valid XML element name"),
        ));
    }
    Ok(())
}

/// Key/value pair that may be written to the file; empty values are allowed
pub(crate) fn writable_entry(key: &str, value: &str) -> Result<()> {
    not_empty("key", key)?;
    representable("key", key)?;
    representable("value", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_names() {
        for name in ["General", "_private", "app.window", "déjà-vu", "Section2", "a·b"] {
            assert!(is_element_name(name), "{name} should be valid");
        }
        for name in [
            "",
            "2fast",
            "with space",
            "ns:prefix",
            "-dash",
            "a<b",
            "tab\there",
            "µs",
            "x²",
            "ª",
            "ªb",
        ] {
            assert!(!is_element_name(name), "{name} should be invalid");
        }
    }

    #[test]
    fn test_empty_arguments_name_the_parameter() {
        assert_eq!(section("").unwrap_err().argument_name(), Some("section"));
        assert_eq!(key("").unwrap_err().argument_name(), Some("key"));
        assert_eq!(
            writable_section("").unwrap_err().argument_name(),
            Some("section")
        );
        assert_eq!(
            writable_entry("", "v").unwrap_err().argument_name(),
            Some("key")
        );
    }

    #[test]
    fn test_lookup_accepts_any_non_empty_section() {
        assert!(section("with space").is_ok());
        assert!(writable_section("with space").is_err());
    }

    #[test]
    fn test_writable_entry() {
        assert!(writable_entry("k", "").is_ok());
        assert!(writable_entry("k", "multi\nline\ttext").is_ok());

        let err = writable_entry("k", "bell\u{7}").unwrap_err();
        assert_eq!(err.argument_name(), Some("value"));
        assert!(err.to_string().contains("U+0007"));

        let err = writable_entry("nul\0", "v").unwrap_err();
        assert_eq!(err.argument_name(), Some("key"));
    }
}
