//! Schema Compiler (§4.2) and Parameter Encoder (§4.1).

use crate::model::ParamDescriptor;

/// Compiles an operation's effective parameters into the two-level
/// `{in -> {name -> schema}}` JSON-Schema tree, or `None` if the operation
/// declares no parameters.
pub fn compile_schema(params: &[ParamDescriptor]) -> Option<serde_json::Value> {
    if params.is_empty() {
        return None;
    }

    let mut by_location: indexmap::IndexMap<&'static str, (Vec<&str>, serde_json::Map<String, serde_json::Value>)> =
        indexmap::IndexMap::new();
    for p in params {
        let entry = by_location
            .entry(p.location.as_str())
            .or_insert_with(|| (Vec::new(), serde_json::Map::new()));
        if p.required {
            entry.0.push(&p.name);
        }
        entry.1.insert(p.name.clone(), p.schema.clone());
    }

    let mut properties = serde_json::Map::new();
    let mut required_locations = Vec::new();
    for (location, (required, props)) in by_location {
        let mut inner = serde_json::Map::new();
        inner.insert("type".into(), serde_json::json!("object"));
        inner.insert("properties".into(), serde_json::Value::Object(props));
        if !required.is_empty() {
            inner.insert("required".into(), serde_json::json!(required));
            required_locations.push(location);
        }
        properties.insert(location.to_string(), serde_json::Value::Object(inner));
    }

    let mut root = serde_json::Map::new();
    root.insert("type".into(), serde_json::json!("object"));
    root.insert("properties".into(), serde_json::Value::Object(properties));
    if !required_locations.is_empty() {
        root.insert("required".into(), serde_json::json!(required_locations));
    }
    Some(serde_json::Value::Object(root))
}

/// Encodes the raw string values extracted for one parameter into the JSON
/// fragment that goes into the synthesised validation document.
pub fn encode(descriptor: &ParamDescriptor, raw_values: &[String]) -> serde_json::Value {
    let is_array = descriptor.schema.get("type").and_then(|t| t.as_str()) == Some("array");
    if is_array {
        let item_non_string = descriptor
            .schema
            .get("items")
            .and_then(|i| i.get("type"))
            .and_then(|t| t.as_str())
            .map(|t| t != "string")
            .unwrap_or(false);
        let values = raw_values
            .iter()
            .map(|v| encode_scalar(v, item_non_string))
            .collect();
        return serde_json::Value::Array(values);
    }

    match raw_values {
        [] => serde_json::Value::Null,
        [one] => encode_scalar(one, descriptor.non_string),
        many => serde_json::Value::String(many.join(" ")),
    }
}

fn encode_scalar(raw: &str, non_string: bool) -> serde_json::Value {
    if non_string {
        serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
    } else {
        serde_json::Value::String(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParamLocation;

    fn descriptor(location: ParamLocation, name: &str, required: bool, schema: serde_json::Value) -> ParamDescriptor {
        let non_string = schema.get("type").and_then(|t| t.as_str()).map(|t| t != "string").unwrap_or(false);
        ParamDescriptor {
            location,
            name: name.to_string(),
            required,
            schema,
            non_string,
        }
    }

    #[test]
    fn empty_params_compile_to_none() {
        assert!(compile_schema(&[]).is_none());
    }

    #[test]
    fn groups_by_location_and_marks_required() {
        let params = vec![
            descriptor(ParamLocation::Query, "limit", true, serde_json::json!({"type": "integer"})),
            descriptor(ParamLocation::Header, "x-trace", false, serde_json::json!({"type": "string"})),
        ];
        let schema = compile_schema(&params).unwrap();
        assert_eq!(schema["properties"]["query"]["required"], serde_json::json!(["limit"]));
        assert!(schema["properties"]["header"].get("required").is_none());
    }

    #[test]
    fn root_declares_required_locations_so_an_absent_section_fails_validation() {
        let params = vec![descriptor(
            ParamLocation::Query,
            "limit",
            true,
            serde_json::json!({"type": "integer"}),
        )];
        let schema = compile_schema(&params).unwrap();
        assert_eq!(schema["required"], serde_json::json!(["query"]));

        let compiled = jsonschema::JSONSchema::compile(&schema).unwrap();
        assert!(compiled.validate(&serde_json::json!({})).is_err(), "missing query section must fail");
        assert!(compiled
            .validate(&serde_json::json!({"query": {"limit": 10}}))
            .is_ok());
    }

    #[test]
    fn encodes_single_scalar_non_string_as_raw_json() {
        let d = descriptor(ParamLocation::Query, "limit", true, serde_json::json!({"type": "integer"}));
        assert_eq!(encode(&d, &["10".to_string()]), serde_json::json!(10));
    }

    #[test]
    fn encodes_single_scalar_string_quoted() {
        let d = descriptor(ParamLocation::Query, "name", true, serde_json::json!({"type": "string"}));
        assert_eq!(encode(&d, &["bob".to_string()]), serde_json::json!("bob"));
    }

    #[test]
    fn encodes_repeated_scalar_values_joined_as_string() {
        let d = descriptor(ParamLocation::Header, "accept", false, serde_json::json!({"type": "string"}));
        let out = encode(&d, &["a".to_string(), "b".to_string()]);
        assert_eq!(out, serde_json::json!("a b"));
    }

    #[test]
    fn encodes_array_of_non_strings_unquoted() {
        let d = descriptor(
            ParamLocation::Query,
            "ids",
            false,
            serde_json::json!({"type": "array", "items": {"type": "integer"}}),
        );
        let out = encode(&d, &["1".to_string(), "2".to_string()]);
        assert_eq!(out, serde_json::json!([1, 2]));
    }

    #[test]
    fn encodes_array_of_strings_quoted() {
        let d = descriptor(
            ParamLocation::Query,
            "tags",
            false,
            serde_json::json!({"type": "array", "items": {"type": "string"}}),
        );
        let out = encode(&d, &["a".to_string(), "b".to_string()]);
        assert_eq!(out, serde_json::json!(["a", "b"]));
    }
}
