/// Splits a free-text address on its first comma into street and complement.
///
/// Both parts are trimmed; a missing or empty complement is `None`.
///
/// ```
/// use edne_loader::unified::split_address;
///
/// assert_eq!(
///     split_address("Street X, Apt 5"),
///     ("Street X".to_string(), Some("Apt 5".to_string()))
/// );
/// assert_eq!(split_address("Street Y"), ("Street Y".to_string(), None));
/// ```
pub fn split_address(address: &str) -> (String, Option<String>) {
    match address.split_once(',') {
        Some((street, complement)) => {
            let complement = complement.trim();
            (
                street.trim().to_string(),
                (!complement.is_empty()).then(|| complement.to_string()),
            )
        }
        None => (address.trim().to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_first_comma_only() {
        assert_eq!(
            split_address("Rua A, 100, Bloco B"),
            ("Rua A".to_string(), Some("100, Bloco B".to_string()))
        );
    }

    #[test]
    fn test_empty_complement_is_none() {
        assert_eq!(split_address("Rua A,  "), ("Rua A".to_string(), None));
        assert_eq!(split_address("  Rua A "), ("Rua A".to_string(), None));
    }
}
