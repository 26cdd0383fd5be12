use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};
use crate::utils::{
    error::FlattenError,
    types::{Attribute, AttributeValue, InformationObject, Row, Value},
};

/// Column prefix for the expanded `from` endpoint of a relationship
pub const FROM_PREFIX: &str = "relationshipFrom_";
/// Column prefix for the expanded `to` endpoint of a relationship
pub const TO_PREFIX: &str = "relationshipTo_";
/// Reference targets are expanded one level deep
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 1;

const SYSTEM_NAME: &str = "attributeDefinitionSystemName";
const TYPENAME: &str = "__typename";
const DATE_VALUE: &str = "dateValue";
const STRING_VALUE: &str = "stringValue";
const NUMBER_VALUE: &str = "numberValue";
const ENUM_VALUE: &str = "enumValue";
const ENUM_VALUE_ID: &str = "enumValueId";
const REFERENCE_IDS: &str = "informationObjectReferenceValueIds";
const REFERENCE_VALUES: &str = "informationObjectReferenceValues";

const KNOWN_ATTRIBUTE_FIELDS: [&str; 9] = [
    SYSTEM_NAME,
    TYPENAME,
    DATE_VALUE,
    STRING_VALUE,
    NUMBER_VALUE,
    ENUM_VALUE,
    ENUM_VALUE_ID,
    REFERENCE_IDS,
    REFERENCE_VALUES,
];

/// Rows of one response plus the shape problem that stopped flattening, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedResponse {
    pub rows: Vec<Row>,
    pub diagnostic: Option<FlattenError>,
}

/// Turns `{ data: { <collection>: { data: [..] } } }` into flat rows
#[derive(Debug, Clone)]
pub struct ResponseFlattener {
    max_reference_depth: usize,
}

impl Default for ResponseFlattener {
    fn default() -> Self {
        Self {
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }
}

impl ResponseFlattener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    /// Flatten a response body. A shape mismatch is reported in
    /// `diagnostic` and yields no rows; it is never returned as an error.
    pub fn flatten_response(&self, body: &JsonValue, collection: Option<&str>) -> FlattenedResponse {
        match self.try_flatten_response(body, collection) {
            Ok(rows) => FlattenedResponse { rows, diagnostic: None },
            Err(e) => {
                warn!(error = %e, "could not flatten response");
                FlattenedResponse {
                    rows: Vec::new(),
                    diagnostic: Some(e),
                }
            }
        }
    }

    /// Strict variant of [`flatten_response`](Self::flatten_response)
    pub fn try_flatten_response(
        &self,
        body: &JsonValue,
        collection: Option<&str>,
    ) -> Result<Vec<Row>, FlattenError> {
        let items = decode_response(body, collection)?;
        let rows: Vec<Row> = items.iter().map(|item| self.flatten_object(item)).collect();
        debug!(rows = rows.len(), "flattened response");
        Ok(rows)
    }

    /// One row for a top-level information object or relationship
    pub fn flatten_object(&self, object: &InformationObject) -> Row {
        self.flatten_prefixed(object, "")
    }

    fn flatten_prefixed(&self, object: &InformationObject, prefix: &str) -> Row {
        let mut row: Row = object
            .fields
            .iter()
            .map(|(name, value)| (format!("{}{}", prefix, name), value.clone()))
            .collect();

        row.merge(self.flatten_attributes(&object.attributes, prefix, 0));

        if let Some(from) = &object.from {
            row.merge(self.flatten_prefixed(from, &format!("{}{}", prefix, FROM_PREFIX)));
        }
        if let Some(to) = &object.to {
            row.merge(self.flatten_prefixed(to, &format!("{}{}", prefix, TO_PREFIX)));
        }
        row
    }

    /// Flatten an attribute list into a row fragment.
    ///
    /// Reference targets below `max_reference_depth` are flattened under
    /// `<prefix><targetClass>_`; colliding columns keep the last write.
    pub fn flatten_attributes(&self, attributes: &[Attribute], prefix: &str, depth: usize) -> Row {
        let mut row = Row::new();

        for attribute in attributes {
            let column = format!("{}{}", prefix, attribute.system_name);
            match &attribute.value {
                AttributeValue::Reference { ids, targets } => {
                    row.insert(column, Value::Text(ids.join(",")));
                    if depth >= self.max_reference_depth {
                        continue;
                    }
                    for target in targets {
                        let target_prefix = match target.class_system_name.as_deref() {
                            Some(class) if !class.is_empty() => format!("{}{}_", prefix, class),
                            _ => prefix.to_string(),
                        };
                        row.merge(self.flatten_attributes(&target.attributes, &target_prefix, depth + 1));
                    }
                }
                scalar => row.insert(column, scalar_value(scalar)),
            }
        }

        row
    }
}

/// Scalar carried by a non-reference attribute
fn scalar_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Date(v)
        | AttributeValue::String(v)
        | AttributeValue::Number(v)
        | AttributeValue::Untyped(v) => v.clone(),
        AttributeValue::Enum { value, .. } => value.clone(),
        AttributeValue::Reference { ids, .. } => Value::Text(ids.join(",")),
    }
}

/// Locate the item list and decode every item
pub fn decode_response(
    body: &JsonValue,
    collection: Option<&str>,
) -> Result<Vec<InformationObject>, FlattenError> {
    let data = match body.get("data") {
        Some(JsonValue::Object(data)) => data,
        _ => return Err(graphql_errors(body).unwrap_or(FlattenError::MissingData)),
    };

    let (name, container) = match collection {
        Some(name) => match data.get(name) {
            Some(value) if !value.is_null() => (name.to_string(), value),
            _ => {
                return Err(graphql_errors(body)
                    .unwrap_or_else(|| FlattenError::MissingCollection(name.to_string())))
            }
        },
        None => {
            if data.len() != 1 {
                return Err(FlattenError::AmbiguousCollection(data.len()));
            }
            match data.iter().next() {
                Some((name, value)) if !value.is_null() => (name.clone(), value),
                Some((name, _)) => {
                    return Err(graphql_errors(body)
                        .unwrap_or_else(|| FlattenError::MissingCollection(name.clone())))
                }
                None => return Err(FlattenError::AmbiguousCollection(0)),
            }
        }
    };

    let items = container
        .get("data")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| FlattenError::NotAList(format!("{}.data", name)))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            JsonValue::Object(map) => decode_object(map),
            _ => Err(FlattenError::NotAnObject { index }),
        })
        .collect()
}

fn graphql_errors(body: &JsonValue) -> Option<FlattenError> {
    let errors = body.get("errors")?.as_array()?;
    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
        .collect();
    Some(FlattenError::GraphqlErrors(messages.join("; ")))
}

/// Decode an information object, relationship or relationship endpoint
pub fn decode_object(map: &Map<String, JsonValue>) -> Result<InformationObject, FlattenError> {
    let mut object = InformationObject::default();

    for (key, value) in map {
        match (key.as_str(), value) {
            ("attributes", JsonValue::Array(list)) => {
                object.attributes = list.iter().map(decode_attribute).collect::<Result<_, _>>()?;
            }
            ("attributes", JsonValue::Null) => {}
            ("attributes", _) => {
                return Err(FlattenError::MalformedAttribute("`attributes` is not a list".to_string()))
            }
            ("from", JsonValue::Object(endpoint)) => {
                object.from = Some(Box::new(decode_object(endpoint)?));
            }
            ("to", JsonValue::Object(endpoint)) => {
                object.to = Some(Box::new(decode_object(endpoint)?));
            }
            ("from" | "to", JsonValue::Null) => {}
            (_, JsonValue::Array(_)) | (_, JsonValue::Object(_)) => {}
            (_, scalar) => {
                if key == "classDefinitionSystemName" {
                    object.class_system_name = scalar.as_str().map(str::to_string);
                }
                object.fields.push((key.clone(), Value::from_json(scalar)));
            }
        }
    }

    Ok(object)
}

/// Decode one attribute, dispatching on `__typename` when present
pub fn decode_attribute(json: &JsonValue) -> Result<Attribute, FlattenError> {
    let map = json
        .as_object()
        .ok_or_else(|| FlattenError::MalformedAttribute("attribute is not an object".to_string()))?;

    let system_name = map
        .get(SYSTEM_NAME)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| FlattenError::MalformedAttribute(format!("missing {}", SYSTEM_NAME)))?
        .to_string();

    let value = match map.get(TYPENAME).and_then(JsonValue::as_str) {
        Some("InformationDateAttribute") => AttributeValue::Date(date_value(map.get(DATE_VALUE))),
        Some("InformationStringAttribute") => AttributeValue::String(scalar(map.get(STRING_VALUE))),
        Some("InformationNumberAttribute") => AttributeValue::Number(scalar(map.get(NUMBER_VALUE))),
        Some("InformationEnumAttribute") => enum_value(map),
        Some("InformationReferenceAttribute") => reference_value(&system_name, map)?,
        _ => infer_value(&system_name, map)?,
    };

    Ok(Attribute { system_name, value })
}

/// Kind by field presence: date, string, number, enum, reference, then anything else
fn infer_value(system_name: &str, map: &Map<String, JsonValue>) -> Result<AttributeValue, FlattenError> {
    let present = |key: &str| map.get(key).map_or(false, |v| !v.is_null());

    let value = if present(DATE_VALUE) {
        AttributeValue::Date(date_value(map.get(DATE_VALUE)))
    } else if present(STRING_VALUE) {
        AttributeValue::String(scalar(map.get(STRING_VALUE)))
    } else if present(NUMBER_VALUE) {
        AttributeValue::Number(scalar(map.get(NUMBER_VALUE)))
    } else if present(ENUM_VALUE) {
        enum_value(map)
    } else if present(REFERENCE_IDS) || present(REFERENCE_VALUES) {
        reference_value(system_name, map)?
    } else {
        let fallback = map
            .iter()
            .filter(|(key, _)| !KNOWN_ATTRIBUTE_FIELDS.contains(&key.as_str()))
            .map(|(_, value)| unwrap_value(value))
            .find(|value| !value.is_null())
            .unwrap_or(Value::Null);
        AttributeValue::Untyped(fallback)
    };

    Ok(value)
}

fn scalar(json: Option<&JsonValue>) -> Value {
    json.map(Value::from_json).unwrap_or(Value::Null)
}

fn date_value(json: Option<&JsonValue>) -> Value {
    match json {
        Some(JsonValue::String(s)) => Value::Date(s.clone()),
        other => scalar(other),
    }
}

/// `{ value: x }` becomes `x`, anything else converts as is
fn unwrap_value(json: &JsonValue) -> Value {
    match json.get("value") {
        Some(inner) if json.is_object() => Value::from_json(inner),
        _ => Value::from_json(json),
    }
}

fn enum_value(map: &Map<String, JsonValue>) -> AttributeValue {
    AttributeValue::Enum {
        value: map.get(ENUM_VALUE).map(unwrap_value).unwrap_or(Value::Null),
        id: map.get(ENUM_VALUE_ID).and_then(id_string),
    }
}

fn reference_value(
    system_name: &str,
    map: &Map<String, JsonValue>,
) -> Result<AttributeValue, FlattenError> {
    let ids = match map.get(REFERENCE_IDS) {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(ids)) => ids.iter().filter_map(id_string).collect(),
        Some(_) => {
            return Err(FlattenError::MalformedAttribute(format!(
                "{}: {} is not a list",
                system_name, REFERENCE_IDS
            )))
        }
    };

    let targets = match map.get(REFERENCE_VALUES) {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(targets)) => targets
            .iter()
            .map(|target| match target {
                JsonValue::Object(target) => decode_object(target),
                _ => Err(FlattenError::MalformedAttribute(format!(
                    "{}: reference target is not an object",
                    system_name
                ))),
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(FlattenError::MalformedAttribute(format!(
                "{}: {} is not a list",
                system_name, REFERENCE_VALUES
            )))
        }
    };

    Ok(AttributeValue::Reference { ids, targets })
}

fn id_string(json: &JsonValue) -> Option<String> {
    match json {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
