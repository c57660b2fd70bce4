//! Per-entry checks over the raw entries of a context object.

use serde_json::{Map, Value};

use crate::context::ProcessingMode;
use crate::error::{ContextError, ErrorCode};
use crate::helper::{
    is_compact_iri, is_potential_keyword, is_valid_direction, is_valid_iri, is_valid_keyword,
    is_valid_language_tag, prefix_candidate,
};

/// What validation needs to know beyond the entries themselves.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidationScope {
    pub(crate) mode: ProcessingMode,

    /// A `@vocab` applies after merging with the parent.
    pub(crate) has_vocab: bool,

    /// A `@base` applies after merging with the parent and the options.
    pub(crate) has_base: bool,
}

fn invalid(code: ErrorCode, message: String) -> ContextError {
    ContextError::new(code, message)
}

pub(crate) fn validate_entries(
    entries: &Map<String, Value>,
    scope: &ValidationScope,
) -> Result<(), ContextError> {
    for (key, value) in entries {
        if is_potential_keyword(key) {
            validate_keyword_entry(key, value, scope)?;
            continue;
        }

        match value {
            Value::Null => {}
            Value::String(iri) => validate_simple_term(key, iri)?,
            Value::Object(def) => validate_expanded_term(key, def, scope)?,
            _ => {
                return Err(invalid(
                    ErrorCode::InvalidTermDefinition,
                    format!("Found an invalid term value: '{}': '{}'", key, value),
                ))
            }
        }
    }

    Ok(())
}

fn validate_keyword_entry(
    key: &str,
    value: &Value,
    scope: &ValidationScope,
) -> Result<(), ContextError> {
    let legacy = scope.mode == ProcessingMode::JsonLd10;

    match key {
        "@vocab" => {
            if !(value.is_null() || value.is_string()) {
                return Err(invalid(
                    ErrorCode::InvalidVocabMapping,
                    format!("Found an invalid @vocab IRI: {}", value),
                ));
            }
        }
        "@base" => {
            if !(value.is_null() || value.is_string()) {
                return Err(invalid(
                    ErrorCode::InvalidBaseIri,
                    format!("Found an invalid @base IRI: {}", value),
                ));
            }
        }
        "@language" => match value {
            Value::Null => {}
            Value::String(tag) if is_valid_language_tag(tag) => {}
            _ => {
                return Err(invalid(
                    ErrorCode::InvalidDefaultLanguage,
                    format!("The value of an '@language' must be a valid language tag, got {}", value),
                ))
            }
        },
        "@direction" => {
            if legacy {
                return Err(invalid(
                    ErrorCode::InvalidContextEntry,
                    "Found an illegal @direction in a JSON-LD 1.0 context".to_owned(),
                ));
            }
            match value {
                Value::Null => {}
                Value::String(direction) if is_valid_direction(direction) => {}
                _ => {
                    return Err(invalid(
                        ErrorCode::InvalidBaseDirection,
                        format!("The value of an '@direction' must be 'ltr' or 'rtl', got {}", value),
                    ))
                }
            }
        }
        "@version" => match value {
            Value::Null => {}
            Value::Number(version) if version.as_f64() == Some(1.1) => {}
            _ => {
                return Err(invalid(
                    ErrorCode::InvalidVersionValue,
                    format!("Found an invalid @version number: {}", value),
                ))
            }
        },
        "@propagate" => {
            if legacy {
                return Err(invalid(
                    ErrorCode::InvalidContextEntry,
                    "Found an illegal @propagate keyword in a JSON-LD 1.0 context".to_owned(),
                ));
            }
            if !(value.is_null() || value.is_boolean()) {
                return Err(invalid(
                    ErrorCode::InvalidPropagateValue,
                    format!("Found an invalid @propagate value: {}", value),
                ));
            }
        }
        "@protected" => {
            if !(value.is_null() || value.is_boolean()) {
                return Err(invalid(
                    ErrorCode::InvalidProtectedValue,
                    format!("Found an invalid @protected value: {}", value),
                ));
            }
        }
        _ => {
            let target = match value {
                Value::String(id) => Some(id.as_str()),
                Value::Object(def) => def.get("@id").and_then(Value::as_str),
                _ => None,
            };

            if is_valid_keyword(key) && target.map_or(false, is_valid_keyword) {
                return Err(invalid(
                    ErrorCode::KeywordRedefinition,
                    format!("Illegal keyword alias in term value, found: '{}': '{}'", key, value),
                ));
            }
        }
    }

    Ok(())
}

fn validate_simple_term(key: &str, value: &str) -> Result<(), ContextError> {
    if prefix_candidate(value) == Some(key) {
        return Err(invalid(
            ErrorCode::CyclicIriMapping,
            format!("Detected cyclical IRI mapping in context entry: '{}': '{}'", key, value),
        ));
    }

    if is_valid_iri(key) && value == "@type" {
        return Err(invalid(
            ErrorCode::KeywordRedefinition,
            format!("IRIs can not be mapped to @type, found '{}'", key),
        ));
    }

    Ok(())
}

fn validate_expanded_term(
    key: &str,
    def: &Map<String, Value>,
    scope: &ValidationScope,
) -> Result<(), ContextError> {
    let legacy = scope.mode == ProcessingMode::JsonLd10;

    if !is_compact_iri(key) && !def.contains_key("@id") && !def.contains_key("@reverse") {
        let resolvable = if def.get("@type").and_then(Value::as_str) == Some("@id") {
            scope.has_base
        } else {
            scope.has_vocab
        };

        if !resolvable {
            return Err(invalid(
                ErrorCode::InvalidIriMapping,
                format!("Missing @id in context entry: '{}': '{}'", key, Value::Object(def.clone())),
            ));
        }
    }

    for (entry, value) in def {
        if value.is_null() {
            continue;
        }

        match entry.as_str() {
            "@id" => check_id(key, value)?,
            "@type" => check_type(key, def, value, legacy)?,
            "@reverse" => check_reverse(key, def)?,
            "@container" => check_container(key, def, value, legacy)?,
            "@language" => match value {
                Value::String(tag) if is_valid_language_tag(tag) => {}
                _ => {
                    return Err(invalid(
                        ErrorCode::InvalidLanguageMapping,
                        format!("Found an invalid term @language: '{}': '{}'", key, value),
                    ))
                }
            },
            "@direction" => match value {
                Value::String(direction) if !legacy && is_valid_direction(direction) => {}
                _ => {
                    return Err(invalid(
                        ErrorCode::InvalidBaseDirection,
                        format!("Found an invalid term @direction: '{}': '{}'", key, value),
                    ))
                }
            },
            "@prefix" => {
                if legacy {
                    return Err(legacy_entry(key, entry));
                }
                if !value.is_boolean() {
                    return Err(invalid(
                        ErrorCode::InvalidPrefixValue,
                        format!("Found an invalid term @prefix boolean: '{}': '{}'", key, value),
                    ));
                }
                if !def.contains_key("@id") && !is_valid_iri(key) {
                    return Err(invalid(
                        ErrorCode::InvalidTermDefinition,
                        format!("Found an invalid term @prefix: '{}': '{}'", key, value),
                    ));
                }
            }
            "@index" => {
                if legacy {
                    return Err(legacy_entry(key, entry));
                }
                let in_index_container = def
                    .get("@container")
                    .map_or(false, |container| container_keywords(container).contains(&"@index"));
                let usable = value.as_str().map_or(false, |index| !is_potential_keyword(index));

                if !in_index_container || !usable {
                    return Err(invalid(
                        ErrorCode::InvalidTermDefinition,
                        format!("Found an invalid term @index: '{}': '{}'", key, value),
                    ));
                }
            }
            "@nest" => {
                if legacy {
                    return Err(legacy_entry(key, entry));
                }
                match value.as_str() {
                    Some(nest) if nest == "@nest" || !is_potential_keyword(nest) => {}
                    _ => {
                        return Err(invalid(
                            ErrorCode::InvalidNestValue,
                            format!("Found an invalid term @nest: '{}': '{}'", key, value),
                        ))
                    }
                }
            }
            "@protected" => {
                if legacy {
                    return Err(legacy_entry(key, entry));
                }
                if !value.is_boolean() {
                    return Err(invalid(
                        ErrorCode::InvalidProtectedValue,
                        format!("Found an invalid term @protected value: '{}': '{}'", key, value),
                    ));
                }
            }
            "@context" => {
                if legacy {
                    return Err(legacy_entry(key, entry));
                }
            }
            _ => {
                return Err(invalid(
                    ErrorCode::InvalidTermDefinition,
                    format!("Found an invalid term value entry '{}' in '{}'", entry, key),
                ))
            }
        }
    }

    Ok(())
}

fn legacy_entry(key: &str, entry: &str) -> ContextError {
    invalid(
        ErrorCode::InvalidTermDefinition,
        format!("Found an illegal {} in term '{}' of a JSON-LD 1.0 context", entry, key),
    )
}

fn check_id(key: &str, value: &Value) -> Result<(), ContextError> {
    let id = value.as_str().ok_or_else(|| {
        invalid(
            ErrorCode::InvalidIriMapping,
            format!("Found an invalid term @id: '{}': '{}'", key, value),
        )
    })?;

    if is_valid_keyword(id) && !["@type", "@id", "@graph", "@nest"].contains(&id) {
        return Err(invalid(
            ErrorCode::InvalidIriMapping,
            format!("Illegal keyword alias in term value, found: '{}': '{}'", key, id),
        ));
    }

    if is_valid_iri(key) && id == "@type" {
        return Err(invalid(
            ErrorCode::KeywordRedefinition,
            format!("IRIs can not be mapped to @type, found '{}'", key),
        ));
    }

    if prefix_candidate(id) == Some(key) {
        return Err(invalid(
            ErrorCode::CyclicIriMapping,
            format!("Detected cyclical IRI mapping in context entry: '{}': '{}'", key, id),
        ));
    }

    Ok(())
}

fn check_type(
    key: &str,
    def: &Map<String, Value>,
    value: &Value,
    legacy: bool,
) -> Result<(), ContextError> {
    let type_error = || {
        invalid(
            ErrorCode::InvalidTypeMapping,
            format!("Found an invalid term @type: '{}': '{}'", key, value),
        )
    };

    let typ = value.as_str().ok_or_else(type_error)?;

    let type_container = def
        .get("@container")
        .map_or(false, |container| container_keywords(container).contains(&"@type"));
    if type_container && typ != "@id" && typ != "@vocab" {
        return Err(type_error());
    }

    let allowed = match typ {
        "@id" | "@vocab" => true,
        "@json" | "@none" => !legacy,
        _ => is_valid_iri(typ) && !typ.starts_with("_:"),
    };

    if allowed {
        Ok(())
    } else {
        Err(type_error())
    }
}

fn check_reverse(key: &str, def: &Map<String, Value>) -> Result<(), ContextError> {
    let reverse = def.get("@reverse").and_then(Value::as_str);

    if let Some(id) = def.get("@id").and_then(Value::as_str) {
        if Some(id) != reverse {
            return Err(invalid(
                ErrorCode::InvalidReverseProperty,
                format!("Found non-matching @id and @reverse term values in '{}'", key),
            ));
        }
    }

    if def.contains_key("@nest") {
        return Err(invalid(
            ErrorCode::InvalidReverseProperty,
            format!("@nest is not allowed in the reverse property '{}'", key),
        ));
    }

    Ok(())
}

/// The string entries of a `@container` value.
fn container_keywords(value: &Value) -> Vec<&str> {
    match value {
        Value::String(keyword) => vec![keyword.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn check_container(
    key: &str,
    def: &Map<String, Value>,
    value: &Value,
    legacy: bool,
) -> Result<(), ContextError> {
    let container_error = || {
        invalid(
            ErrorCode::InvalidContainerMapping,
            format!("Invalid term @container for '{}': '{}'", key, value),
        )
    };

    let keywords = match value {
        Value::String(keyword) => vec![keyword.as_str()],
        Value::Array(items) if !legacy => items
            .iter()
            .map(|item| item.as_str().ok_or_else(container_error))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(container_error()),
    };

    let allowed: &[&str] = if legacy {
        &["@index", "@language", "@list", "@set"]
    } else {
        &["@graph", "@id", "@index", "@language", "@list", "@set", "@type"]
    };
    if keywords.iter().any(|keyword| !allowed.contains(keyword)) {
        return Err(container_error());
    }

    if keywords.contains(&"@list") && keywords.len() > 1 {
        return Err(container_error());
    }

    let others: Vec<&str> = keywords
        .iter()
        .cloned()
        .filter(|keyword| *keyword != "@set" && *keyword != "@graph")
        .collect();
    if others.len() > 1 {
        return Err(container_error());
    }
    if keywords.contains(&"@graph") && others.iter().any(|k| *k != "@id" && *k != "@index") {
        return Err(container_error());
    }

    if def.contains_key("@reverse") && keywords.iter().any(|k| *k != "@set" && *k != "@index") {
        return Err(invalid(
            ErrorCode::InvalidReverseProperty,
            format!("Reverse properties only support index-containers: '{}'", key),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MODERN: ValidationScope = ValidationScope {
        mode: ProcessingMode::JsonLd11,
        has_vocab: false,
        has_base: false,
    };

    const LEGACY: ValidationScope = ValidationScope {
        mode: ProcessingMode::JsonLd10,
        has_vocab: false,
        has_base: false,
    };

    fn check(scope: &ValidationScope, value: Value) -> Result<(), ErrorCode> {
        validate_entries(value.as_object().unwrap(), scope).map_err(|e| e.code())
    }

    #[test]
    fn accepts_common_contexts() {
        assert_eq!(
            check(
                &MODERN,
                json!({
                    "@vocab": "http://schema.org/",
                    "@language": "en-GB",
                    "@version": 1.1,
                    "foaf": "http://xmlns.com/foaf/0.1/",
                    "name": {"@id": "foaf:name", "@container": ["@set", "@language"]},
                    "knows": {"@id": "foaf:knows", "@type": "@id", "@protected": true},
                    "knownBy": {"@reverse": "foaf:knows", "@container": "@set"},
                    "graphs": {"@id": "http://ex.org/g", "@container": ["@graph", "@id"]},
                    "off": null
                })
            ),
            Ok(())
        );
    }

    #[test]
    fn context_level_values() {
        assert_eq!(check(&MODERN, json!({"@vocab": 5})), Err(ErrorCode::InvalidVocabMapping));
        assert_eq!(check(&MODERN, json!({"@base": true})), Err(ErrorCode::InvalidBaseIri));
        assert_eq!(check(&MODERN, json!({"@language": "en_US"})), Err(ErrorCode::InvalidDefaultLanguage));
        assert_eq!(check(&MODERN, json!({"@version": 1.0})), Err(ErrorCode::InvalidVersionValue));
        assert_eq!(check(&MODERN, json!({"@direction": "up"})), Err(ErrorCode::InvalidBaseDirection));
        assert_eq!(check(&LEGACY, json!({"@direction": "ltr"})), Err(ErrorCode::InvalidContextEntry));
        assert_eq!(check(&MODERN, json!({"@propagate": "yes"})), Err(ErrorCode::InvalidPropagateValue));
        assert_eq!(check(&MODERN, json!({"@protected": 1})), Err(ErrorCode::InvalidProtectedValue));
    }

    #[test]
    fn missing_id_depends_on_vocab_and_base() {
        let entry = json!({"name": {"@container": "@set"}});
        assert_eq!(check(&MODERN, entry.clone()), Err(ErrorCode::InvalidIriMapping));

        let with_vocab = ValidationScope { has_vocab: true, ..MODERN };
        assert_eq!(check(&with_vocab, entry), Ok(()));

        let entry = json!({"link": {"@type": "@id"}});
        assert_eq!(check(&with_vocab, entry.clone()), Err(ErrorCode::InvalidIriMapping));

        let with_base = ValidationScope { has_base: true, ..MODERN };
        assert_eq!(check(&with_base, entry), Ok(()));

        assert_eq!(check(&MODERN, json!({"ex:name": {"@type": "@id"}})), Ok(()));
    }

    #[test]
    fn term_entries() {
        assert_eq!(check(&MODERN, json!({"a": 5})), Err(ErrorCode::InvalidTermDefinition));
        assert_eq!(check(&MODERN, json!({"a": "a:b"})), Err(ErrorCode::CyclicIriMapping));
        assert_eq!(check(&MODERN, json!({"a": {"@id": "a:b"}})), Err(ErrorCode::CyclicIriMapping));
        assert_eq!(check(&MODERN, json!({"a": {"@id": 1}})), Err(ErrorCode::InvalidIriMapping));
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "@container"}})),
            Err(ErrorCode::InvalidIriMapping)
        );
        assert_eq!(check(&MODERN, json!({"http://ex.org/a": "@type"})), Err(ErrorCode::KeywordRedefinition));
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@foo": 1}})),
            Err(ErrorCode::InvalidTermDefinition)
        );
    }

    #[test]
    fn type_mappings() {
        let bad = |typ: Value| check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@type": typ}}));

        assert_eq!(bad(json!("@id")), Ok(()));
        assert_eq!(bad(json!("@json")), Ok(()));
        assert_eq!(bad(json!("http://ex.org/T")), Ok(()));
        assert_eq!(bad(json!("relative")), Err(ErrorCode::InvalidTypeMapping));
        assert_eq!(bad(json!("_:b0")), Err(ErrorCode::InvalidTypeMapping));
        assert_eq!(bad(json!(true)), Err(ErrorCode::InvalidTypeMapping));

        assert_eq!(
            check(&LEGACY, json!({"a": {"@id": "http://ex.org/a", "@type": "@json"}})),
            Err(ErrorCode::InvalidTypeMapping)
        );
        assert_eq!(
            check(
                &MODERN,
                json!({"a": {"@id": "http://ex.org/a", "@type": "http://ex.org/T", "@container": "@type"}})
            ),
            Err(ErrorCode::InvalidTypeMapping)
        );
    }

    #[test]
    fn reverse_properties() {
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/x", "@reverse": "http://ex.org/y"}})),
            Err(ErrorCode::InvalidReverseProperty)
        );
        assert_eq!(
            check(&MODERN, json!({"a": {"@reverse": "http://ex.org/y", "@container": "@list"}})),
            Err(ErrorCode::InvalidReverseProperty)
        );
        assert_eq!(
            check(&MODERN, json!({"a": {"@reverse": "http://ex.org/y", "@nest": "n"}})),
            Err(ErrorCode::InvalidReverseProperty)
        );
    }

    #[test]
    fn containers() {
        let container = |c: Value| check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@container": c}}));

        assert_eq!(container(json!("@list")), Ok(()));
        assert_eq!(container(json!(["@graph", "@index", "@set"])), Ok(()));
        assert_eq!(container(json!("@foo")), Err(ErrorCode::InvalidContainerMapping));
        assert_eq!(container(json!(["@list", "@set"])), Err(ErrorCode::InvalidContainerMapping));
        assert_eq!(container(json!(["@index", "@language"])), Err(ErrorCode::InvalidContainerMapping));
        assert_eq!(container(json!(["@graph", "@type"])), Err(ErrorCode::InvalidContainerMapping));
        assert_eq!(container(json!(5)), Err(ErrorCode::InvalidContainerMapping));

        assert_eq!(
            check(&LEGACY, json!({"a": {"@id": "http://ex.org/a", "@container": ["@set"]}})),
            Err(ErrorCode::InvalidContainerMapping)
        );
        assert_eq!(
            check(&LEGACY, json!({"a": {"@id": "http://ex.org/a", "@container": "@id"}})),
            Err(ErrorCode::InvalidContainerMapping)
        );
    }

    #[test]
    fn newer_term_entries() {
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@prefix": "yes"}})),
            Err(ErrorCode::InvalidPrefixValue)
        );
        assert_eq!(
            check(&LEGACY, json!({"a": {"@id": "http://ex.org/a", "@prefix": true}})),
            Err(ErrorCode::InvalidTermDefinition)
        );
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@index": "p"}})),
            Err(ErrorCode::InvalidTermDefinition)
        );
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@container": "@index", "@index": "p"}})),
            Ok(())
        );
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@nest": "@id"}})),
            Err(ErrorCode::InvalidNestValue)
        );
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@protected": "yes"}})),
            Err(ErrorCode::InvalidProtectedValue)
        );
        assert_eq!(
            check(&MODERN, json!({"a": {"@id": "http://ex.org/a", "@language": 3}})),
            Err(ErrorCode::InvalidLanguageMapping)
        );
        assert_eq!(
            check(&LEGACY, json!({"a": {"@id": "http://ex.org/a", "@context": {}}})),
            Err(ErrorCode::InvalidTermDefinition)
        );
    }
}
