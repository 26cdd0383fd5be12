use dyndb_explorer::engine::{EntityQuery, QueryComposer, RelationshipQuery};

/// Lines of a query with indentation removed
fn trimmed_lines(query: &str) -> Vec<&str> {
    query.lines().map(str::trim).collect()
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn test_entity_query_filters_on_class() {
    let composer = QueryComposer::new();
    let query = composer.compose_entity_query(&EntityQuery::new("Geschäftsprozess"));

    assert!(query.starts_with("query informationObjects {"));
    assert!(query.contains(
        "options: { filterBy: { classDefinitionSystemName: { value: \"Geschäftsprozess\" } } }"
    ));
    assert_eq!(count(&query, "{"), count(&query, "}"));
}

#[test]
fn test_entity_query_without_names_requests_all_attributes() {
    let composer = QueryComposer::new();
    let query = composer.compose_entity_query(&EntityQuery::new("Process").with_attributes(["", "  "]));

    assert!(!query.contains("systemNames"));
    assert!(trimmed_lines(&query).contains(&"attributes {"));
}

#[test]
fn test_entity_query_names_trimmed_distinct_in_order() {
    let composer = QueryComposer::new();
    let query = composer.compose_entity_query(
        &EntityQuery::new("Process").with_attributes([" Bezeichnung", "BCM_RTO_min ", "Bezeichnung", ""]),
    );

    assert!(query.contains("attributes(systemNames: [\"Bezeichnung\",\"BCM_RTO_min\"]) {"));
    assert_eq!(count(&query, "systemNames"), 1);
}

#[test]
fn test_entity_query_requests_every_value_field() {
    let composer = QueryComposer::new();
    let query = composer.compose_entity_query(&EntityQuery::new("Process"));
    let lines = trimmed_lines(&query);

    for field in [
        "__typename",
        "attributeDefinitionSystemName",
        "dateValue",
        "stringValue",
        "numberValue",
        "enumValue {",
        "value",
        "enumValueId",
        "informationObjectReferenceValueIds",
        "informationObjectReferenceValues {",
    ] {
        assert!(lines.contains(&field), "missing {} in\n{}", field, query);
    }
    for fragment in [
        "... on InformationDateAttribute {",
        "... on InformationStringAttribute {",
        "... on InformationNumberAttribute {",
        "... on InformationEnumAttribute {",
        "... on InformationReferenceAttribute {",
    ] {
        assert!(lines.contains(&fragment), "missing {} in\n{}", fragment, query);
    }
}

#[test]
fn test_reference_expansion_is_one_level_with_key_attribute() {
    let composer = QueryComposer::new().with_reference_key_attribute("Bezeichnung");
    let query = composer.compose_entity_query(
        &EntityQuery::new("Process")
            .with_attributes(["Owner"])
            .with_reference_attributes(["Email", "Bezeichnung"]),
    );

    // the target block asks for key first, duplicates dropped
    assert!(query.contains("attributes(systemNames: [\"Bezeichnung\",\"Email\"]) {"));
    assert_eq!(count(&query, "informationObjectReferenceValues {"), 1);
    assert_eq!(count(&query, "informationObjectReferenceValueIds"), 2);
}

#[test]
fn test_reference_expansion_without_key_requests_all_target_attributes() {
    let composer = QueryComposer::new();
    let query = composer.compose_entity_query(&EntityQuery::new("Process").with_attributes(["Owner"]));

    assert_eq!(count(&query, "systemNames"), 1);
    assert_eq!(count(&query, "attributes {"), 1);
}

#[test]
fn test_blank_class_omits_filter_clause() {
    let composer = QueryComposer::new();
    let query = composer.compose_entity_query(&EntityQuery::new(""));

    assert!(!query.contains("options"));
    assert!(trimmed_lines(&query).contains(&"informationObjects {"));
}

#[test]
fn test_values_are_interpolated_verbatim() {
    let composer = QueryComposer::new();
    let query = composer.compose_entity_query(&EntityQuery::new("A\"B"));

    assert!(query.contains("value: \"A\"B\""));
}

#[test]
fn test_surrounding_whitespace_is_trimmed_from_values() {
    let composer = QueryComposer::new();
    let entity = composer.compose_entity_query(&EntityQuery::new(" Process "));
    let relationship = composer.compose_relationship_query(
        &RelationshipQuery::new().from_endpoint(Some("  Process"), Some("7 ")),
    );

    assert!(entity.contains("classDefinitionSystemName: { value: \"Process\" }"));
    assert!(!entity.contains("\" Process"));
    assert!(relationship.contains(
        "relationshipFromClassDefinitionSystemName: { value: \"Process\" }, relationshipFromId: { value: \"7\" }"
    ));
}

#[test]
fn test_relationship_query_without_filters() {
    let composer = QueryComposer::new();
    let query = composer.compose_relationship_query(&RelationshipQuery::new());
    let lines = trimmed_lines(&query);

    assert!(query.starts_with("query relationships {"));
    assert!(!query.contains("options"));
    for field in ["id", "clientSystemName", "relationshipFromId", "relationshipToId", "attributes {"] {
        assert!(lines.contains(&field), "missing {} in\n{}", field, query);
    }
    assert!(!lines.contains(&"from {"));
    assert!(!lines.contains(&"to {"));
}

#[test]
fn test_relationship_filters_only_for_supplied_values() {
    let composer = QueryComposer::new();
    let query = composer.compose_relationship_query(
        &RelationshipQuery::new()
            .from_endpoint(Some("Process"), None)
            .to_endpoint(Some(""), Some("42")),
    );

    assert!(query.contains(
        "options: { filterBy: { relationshipFromClassDefinitionSystemName: { value: \"Process\" }, relationshipToId: { value: \"42\" } } }"
    ));
    assert!(!query.contains("relationshipToClassDefinitionSystemName"));
}

#[test]
fn test_endpoint_blocks_follow_flags_only() {
    let composer = QueryComposer::new();

    for include_from in [false, true] {
        for include_to in [false, true] {
            for with_filters in [false, true] {
                let mut params = RelationshipQuery::new().expand(include_from, include_to);
                if with_filters {
                    params = params
                        .from_endpoint(Some("Process"), Some("1"))
                        .to_endpoint(Some("Asset"), Some("2"));
                }
                let query = composer.compose_relationship_query(&params);
                let lines = trimmed_lines(&query);

                assert_eq!(lines.contains(&"from {"), include_from, "{}", query);
                assert_eq!(lines.contains(&"to {"), include_to, "{}", query);
                assert_eq!(count(&query, "{"), count(&query, "}"));
            }
        }
    }
}

#[test]
fn test_endpoint_attribute_filters() {
    let composer = QueryComposer::new();
    let mut params = RelationshipQuery::new().expand(true, true);
    params.attribute_names = vec!["Weight".to_string()];
    params.from_attribute_names = vec!["Bezeichnung".to_string()];
    params.to_attribute_names = vec![];

    let query = composer.compose_relationship_query(&params);

    assert!(query.contains("attributes(systemNames: [\"Weight\"]) {"));
    assert!(query.contains("attributes(systemNames: [\"Bezeichnung\"]) {"));
    assert_eq!(count(&query, "systemNames"), 2);
}
