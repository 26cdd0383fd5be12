use std::collections::HashSet;
use std::fmt::Write as _;
use crate::utils::config::ExplorerConfig;

/// GraphQL collection holding information objects
pub const INFORMATION_OBJECTS: &str = "informationObjects";
/// GraphQL collection holding relationships
pub const RELATIONSHIPS: &str = "relationships";

const INDENT: &str = "  ";
const NO_NAMES: &[String] = &[];

/// Parameters of an information object query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityQuery {
    pub class_system_name: String,
    /// Attribute system-names to fetch; empty means all attributes
    pub attribute_names: Vec<String>,
    /// Extra attributes requested on expanded reference targets
    pub reference_attribute_names: Vec<String>,
}

impl EntityQuery {
    pub fn new(class_system_name: &str) -> Self {
        Self {
            class_system_name: class_system_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reference_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference_attribute_names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Parameters of a relationship query.
///
/// Blank filters are left out of the query. `include_from`/`include_to` alone
/// decide whether the endpoint objects are expanded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipQuery {
    pub from_type: Option<String>,
    pub from_id: Option<String>,
    pub to_type: Option<String>,
    pub to_id: Option<String>,
    pub attribute_names: Vec<String>,
    pub from_attribute_names: Vec<String>,
    pub to_attribute_names: Vec<String>,
    pub include_from: bool,
    pub include_to: bool,
}

impl RelationshipQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_endpoint(mut self, class_system_name: Option<&str>, id: Option<&str>) -> Self {
        self.from_type = class_system_name.map(str::to_string);
        self.from_id = id.map(str::to_string);
        self
    }

    pub fn to_endpoint(mut self, class_system_name: Option<&str>, id: Option<&str>) -> Self {
        self.to_type = class_system_name.map(str::to_string);
        self.to_id = id.map(str::to_string);
        self
    }

    pub fn expand(mut self, include_from: bool, include_to: bool) -> Self {
        self.include_from = include_from;
        self.include_to = include_to;
        self
    }

    /// Non-blank endpoint filters as `(GraphQL field, value)` pairs
    pub fn filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("relationshipFromClassDefinitionSystemName", &self.from_type),
            ("relationshipFromId", &self.from_id),
            ("relationshipToClassDefinitionSystemName", &self.to_type),
            ("relationshipToId", &self.to_id),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (field, v))
        })
        .collect()
    }
}

/// Builds GraphQL query text for the dynamicdb backend.
///
/// Caller values are interpolated verbatim apart from surrounding whitespace,
/// which is trimmed. Run them through
/// [`crate::engine::validation`] first.
#[derive(Debug, Clone, Default)]
pub struct QueryComposer {
    reference_key_attribute: Option<String>,
}

impl QueryComposer {
    /// Composer without a reference key attribute
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self {
            reference_key_attribute: config.reference_key_attribute.clone(),
        }
    }

    pub fn with_reference_key_attribute(mut self, key: &str) -> Self {
        self.reference_key_attribute = Some(key.to_string());
        self
    }

    /// Query all information objects of one class
    pub fn compose_entity_query(&self, query: &EntityQuery) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "query {} {{", INFORMATION_OBJECTS);

        let class = query.class_system_name.trim();
        if class.is_empty() {
            line(&mut out, 1, &format!("{} {{", INFORMATION_OBJECTS));
        } else {
            line(&mut out, 1, &format!("{}(", INFORMATION_OBJECTS));
            line(
                &mut out,
                2,
                &format!(
                    "options: {{ filterBy: {{ classDefinitionSystemName: {{ value: \"{}\" }} }} }}",
                    class
                ),
            );
            line(&mut out, 1, ") {");
        }

        line(&mut out, 2, "data {");
        line(&mut out, 3, "id");
        line(&mut out, 3, "classDefinitionSystemName");
        self.attribute_selection(
            &mut out,
            3,
            &query.attribute_names,
            Some(query.reference_attribute_names.as_slice()),
        );
        line(&mut out, 2, "}");
        line(&mut out, 1, "}");
        out.push_str("}\n");
        out
    }

    /// Query relationships, optionally expanding their endpoints
    pub fn compose_relationship_query(&self, query: &RelationshipQuery) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "query {} {{", RELATIONSHIPS);

        let filters = query.filters();
        if filters.is_empty() {
            line(&mut out, 1, &format!("{} {{", RELATIONSHIPS));
        } else {
            let entries: Vec<String> = filters
                .iter()
                .map(|(field, value)| format!("{}: {{ value: \"{}\" }}", field, value))
                .collect();
            line(&mut out, 1, &format!("{}(", RELATIONSHIPS));
            line(
                &mut out,
                2,
                &format!("options: {{ filterBy: {{ {} }} }}", entries.join(", ")),
            );
            line(&mut out, 1, ") {");
        }

        line(&mut out, 2, "data {");
        line(&mut out, 3, "id");
        line(&mut out, 3, "clientSystemName");
        line(&mut out, 3, "relationshipFromId");
        line(&mut out, 3, "relationshipToId");
        self.attribute_selection(&mut out, 3, &query.attribute_names, Some(NO_NAMES));
        if query.include_from {
            self.endpoint_selection(&mut out, 3, "from", &query.from_attribute_names);
        }
        if query.include_to {
            self.endpoint_selection(&mut out, 3, "to", &query.to_attribute_names);
        }
        line(&mut out, 2, "}");
        line(&mut out, 1, "}");
        out.push_str("}\n");
        out
    }

    fn endpoint_selection(&self, out: &mut String, depth: usize, field: &str, names: &[String]) {
        line(out, depth, &format!("{} {{", field));
        line(out, depth + 1, "id");
        line(out, depth + 1, "classDefinitionSystemName");
        self.attribute_selection(out, depth + 1, names, Some(NO_NAMES));
        line(out, depth, "}");
    }

    /// `attributes` block. `expansion` carries the extra target attribute
    /// names when reference targets are expanded; `None` stops at the ids.
    fn attribute_selection(
        &self,
        out: &mut String,
        depth: usize,
        names: &[String],
        expansion: Option<&[String]>,
    ) {
        match system_names_clause(names) {
            Some(clause) => line(out, depth, &format!("attributes({}) {{", clause)),
            None => line(out, depth, "attributes {"),
        }

        let inner = depth + 1;
        line(out, inner, "__typename");
        line(out, inner, "attributeDefinitionSystemName");
        fragment(out, inner, "InformationDateAttribute", &["dateValue"]);
        fragment(out, inner, "InformationStringAttribute", &["stringValue"]);
        fragment(out, inner, "InformationNumberAttribute", &["numberValue"]);
        fragment(
            out,
            inner,
            "InformationEnumAttribute",
            &["enumValue {", "  value", "}", "enumValueId"],
        );

        line(out, inner, "... on InformationReferenceAttribute {");
        line(out, inner + 1, "informationObjectReferenceValueIds");
        if let Some(extra) = expansion {
            let target_names = self.reference_target_names(extra);
            line(out, inner + 1, "informationObjectReferenceValues {");
            line(out, inner + 2, "id");
            line(out, inner + 2, "classDefinitionSystemName");
            self.attribute_selection(out, inner + 2, &target_names, None);
            line(out, inner + 1, "}");
        }
        line(out, inner, "}");

        line(out, depth, "}");
    }

    /// Key attribute first, then the caller's extra names
    fn reference_target_names(&self, extra: &[String]) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(extra.len() + 1);
        if let Some(key) = &self.reference_key_attribute {
            names.push(key.clone());
        }
        names.extend(extra.iter().cloned());
        names
    }
}

/// `systemNames: ["a","b"]`, or `None` when no non-blank name remains.
///
/// Names are trimmed and de-duplicated, keeping first occurrence order.
pub fn system_names_clause(names: &[String]) -> Option<String> {
    let mut seen = HashSet::new();
    let tokens: Vec<String> = names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(|name| format!("\"{}\"", name))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(format!("systemNames: [{}]", tokens.join(",")))
    }
}

/// Split a comma separated list of system-names, dropping blanks
pub fn split_system_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn fragment(out: &mut String, depth: usize, type_name: &str, fields: &[&str]) {
    line(out, depth, &format!("... on {} {{", type_name));
    for field in fields {
        line(out, depth + 1, field);
    }
    line(out, depth, "}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_system_names_clause_empty() {
        assert_eq!(system_names_clause(&[]), None);
        assert_eq!(system_names_clause(&names(&["", "  "])), None);
    }

    #[test]
    fn test_system_names_clause_dedup_keeps_order() {
        let clause = system_names_clause(&names(&[" b", "a ", "b", ""]));
        assert_eq!(clause.as_deref(), Some("systemNames: [\"b\",\"a\"]"));
    }

    #[test]
    fn test_split_system_names() {
        assert_eq!(
            split_system_names("BCM_RTO_min, Bezeichnung, ,Beschreibung"),
            vec!["BCM_RTO_min", "Bezeichnung", "Beschreibung"]
        );
        assert!(split_system_names(" , ").is_empty());
    }

    #[test]
    fn test_reference_target_names_without_key() {
        let composer = QueryComposer::new();
        assert!(composer.reference_target_names(&[]).is_empty());
    }

    #[test]
    fn test_relationship_filters_skip_blank_values() {
        let query = RelationshipQuery::new()
            .from_endpoint(Some("Process"), Some(" "))
            .to_endpoint(None, Some("42"));

        assert_eq!(
            query.filters(),
            vec![
                ("relationshipFromClassDefinitionSystemName", "Process"),
                ("relationshipToId", "42"),
            ]
        );
    }
}
