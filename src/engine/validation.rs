use regex::Regex;
use std::sync::OnceLock;
use crate::engine::query_composer::{EntityQuery, RelationshipQuery};
use crate::utils::error::ValidationError;

/// Rejects anything that could break out of a quoted GraphQL string
fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r#"["\\\p{Cc}]"#).expect("static regex"))
}

/// Check a single value that will be placed inside a quoted string
pub fn validate_value(field: &str, value: &str) -> Result<(), ValidationError> {
    if unsafe_chars().is_match(value) {
        return Err(ValidationError::UnsafeValue {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_names(field: &str, names: &[String]) -> Result<(), ValidationError> {
    names.iter().try_for_each(|name| validate_value(field, name))
}

/// Validate an entity query before composing it
pub fn validate_entity_query(query: &EntityQuery) -> Result<(), ValidationError> {
    if query.class_system_name.trim().is_empty() {
        return Err(ValidationError::Empty {
            field: "class".to_string(),
        });
    }
    validate_value("class", &query.class_system_name)?;
    validate_names("attribute", &query.attribute_names)?;
    validate_names("reference attribute", &query.reference_attribute_names)
}

/// Validate a relationship query before composing it
pub fn validate_relationship_query(query: &RelationshipQuery) -> Result<(), ValidationError> {
    for (field, value) in [
        ("from type", &query.from_type),
        ("from id", &query.from_id),
        ("to type", &query.to_type),
        ("to id", &query.to_id),
    ] {
        if let Some(value) = value {
            validate_value(field, value)?;
        }
    }
    validate_names("attribute", &query.attribute_names)?;
    validate_names("from attribute", &query.from_attribute_names)?;
    validate_names("to attribute", &query.to_attribute_names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values_pass() {
        assert!(validate_value("class", "Geschäftsprozess").is_ok());
        assert!(validate_value("attribute", "BCM_RTO_min").is_ok());
        assert!(validate_value("id", "").is_ok());
    }

    #[test]
    fn test_quote_backslash_and_newline_rejected() {
        for bad in ["a\"b", "a\\b", "a\nb", "tab\there"] {
            match validate_value("class", bad) {
                Err(ValidationError::UnsafeValue { field, value }) => {
                    assert_eq!(field, "class");
                    assert_eq!(value, bad);
                }
                other => panic!("Expected UnsafeValue for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_entity_query_requires_class() {
        let query = EntityQuery::new("  ");
        assert!(matches!(
            validate_entity_query(&query),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn test_entity_query_attribute_checked() {
        let query = EntityQuery::new("Process").with_attributes(["Name", "x\"}) { id"]);
        assert!(validate_entity_query(&query).is_err());
    }

    #[test]
    fn test_relationship_query_checks_filters() {
        let ok = RelationshipQuery::new().from_endpoint(Some("Process"), None);
        assert!(validate_relationship_query(&ok).is_ok());

        let bad = RelationshipQuery::new().to_endpoint(None, Some("1\" }"));
        assert!(matches!(
            validate_relationship_query(&bad),
            Err(ValidationError::UnsafeValue { .. })
        ));
    }
}
