use thiserror::Error;

/// SEC-010: Upper bound on identifier length; the grammar alone is unbounded.
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Errors produced when checking a data source or group source name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier must not be empty")]
    Empty,
    #[error("Identifier \"{0}\" must start with a letter or underscore")]
    InvalidStart(String),
    #[error("Identifier \"{name}\" contains invalid character {ch:?}")]
    InvalidCharacter { name: String, ch: char },
    #[error("Identifier exceeds maximum length of {0} characters")]
    TooLong(usize),
}

/// Checks a data source or group source name against `^[A-Za-z_][A-Za-z0-9_]*$`.
///
/// These names end up in multipart fields and in the appliance's own
/// records, so only ASCII letters, digits and underscores are accepted.
///
/// # Examples
///
/// ```
/// use gsafeed::util::validate_identifier;
///
/// assert!(validate_identifier("docspot").is_ok());
/// assert!(validate_identifier("_web_01").is_ok());
/// assert!(validate_identifier("9badsource").is_err());
/// assert!(validate_identifier("bad#source").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(IdentifierError::Empty)?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong(MAX_IDENTIFIER_LENGTH));
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(IdentifierError::InvalidStart(name.to_owned()));
    }
    if let Some(ch) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(IdentifierError::InvalidCharacter {
            name: name.to_owned(),
            ch,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_identifiers() {
        for name in ["a", "_", "docspot", "test_DataSource_09AZaz", "Z9"] {
            assert!(validate_identifier(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        assert_eq!(validate_identifier(""), Err(IdentifierError::Empty));
        assert!(matches!(
            validate_identifier("9badsource"),
            Err(IdentifierError::InvalidStart(_))
        ));
        assert!(matches!(
            validate_identifier("bad#source"),
            Err(IdentifierError::InvalidCharacter { ch: '#', .. })
        ));
        assert!(validate_identifier("test-DataSource").is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier("naïve").is_err());
    }

    #[test]
    fn test_length_limit() {
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        assert_eq!(
            validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)),
            Err(IdentifierError::TooLong(MAX_IDENTIFIER_LENGTH))
        );
    }

    proptest! {
        #[test]
        fn accepts_every_name_in_the_grammar(name in "[A-Za-z_][A-Za-z0-9_]{0,40}") {
            prop_assert!(validate_identifier(&name).is_ok());
        }

        #[test]
        fn rejects_names_with_other_characters(
            prefix in "[A-Za-z_][A-Za-z0-9_]{0,10}",
            bad in "[^A-Za-z0-9_]",
            suffix in "[A-Za-z0-9_]{0,10}",
        ) {
            let name = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(validate_identifier(&name).is_err());
        }

        #[test]
        fn rejects_leading_digit(name in "[0-9][A-Za-z0-9_]{0,20}") {
            prop_assert!(validate_identifier(&name).is_err());
        }
    }
}
