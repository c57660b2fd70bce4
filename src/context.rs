use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt;

use crate::error::{ContextError, ErrorCode};

/// The JSON-LD version governing which keywords and rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessingMode {
    JsonLd10,
    JsonLd11,
}

impl Default for ProcessingMode {
    fn default() -> Self {
        ProcessingMode::JsonLd11
    }
}

impl TryFrom<f64> for ProcessingMode {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if (value - 1.0).abs() < f64::EPSILON {
            Ok(ProcessingMode::JsonLd10)
        } else if (value - 1.1).abs() < f64::EPSILON {
            Ok(ProcessingMode::JsonLd11)
        } else {
            Err(format!("unsupported processing mode {}", value))
        }
    }
}

impl From<ProcessingMode> for f64 {
    fn from(mode: ProcessingMode) -> f64 {
        match mode {
            ProcessingMode::JsonLd10 => 1.0,
            ProcessingMode::JsonLd11 => 1.1,
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessingMode::JsonLd10 => f.write_str("1.0"),
            ProcessingMode::JsonLd11 => f.write_str("1.1"),
        }
    }
}

/// Base direction of string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn from_str(value: &str) -> Option<Direction> {
        match value {
            "ltr" => Some(Direction::Ltr),
            "rtl" => Some(Direction::Rtl),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// One of the keywords allowed inside `@container`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    Graph,
    Id,
    Index,
    Language,
    List,
    Set,
    Type,
}

impl Container {
    pub fn from_keyword(value: &str) -> Option<Container> {
        match value {
            "@graph" => Some(Container::Graph),
            "@id" => Some(Container::Id),
            "@index" => Some(Container::Index),
            "@language" => Some(Container::Language),
            "@list" => Some(Container::List),
            "@set" => Some(Container::Set),
            "@type" => Some(Container::Type),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Container::Graph => "@graph",
            Container::Id => "@id",
            Container::Index => "@index",
            Container::Language => "@language",
            Container::List => "@list",
            Container::Set => "@set",
            Container::Type => "@type",
        }
    }
}

/// The set of container keywords a term was declared with.
pub type ContainerSpec = BTreeSet<Container>;

/// An expanded (object-form) term definition.
///
/// Entries that may be explicitly `null` are `Option<Option<T>>`: the outer
/// `None` means the entry was absent, `Some(None)` that it was `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedTerm {
    pub id: Option<Option<String>>,
    pub type_: Option<String>,
    pub container: Option<ContainerSpec>,
    pub language: Option<Option<String>>,
    pub direction: Option<Option<Direction>>,
    pub reverse: bool,
    pub protected: Option<bool>,
    pub prefix: Option<bool>,
    pub context: Option<Value>,
    pub index: Option<String>,
    pub nest: Option<String>,
}

impl ExpandedTerm {
    /// The `@id` of this definition, if set to a string.
    pub fn id(&self) -> Option<&str> {
        match self.id {
            Some(Some(ref id)) => Some(id),
            _ => None,
        }
    }

    pub fn is_protected(&self) -> bool {
        self.protected == Some(true)
    }

    pub fn has_container(&self, container: Container) -> bool {
        self.container
            .as_ref()
            .map_or(false, |set| set.contains(&container))
    }
}

/// A single entry of a normalized context.
#[derive(Debug, Clone, PartialEq)]
pub enum TermDefinition {
    /// The term was mapped to `null`, or to `{"@id": null}`.
    Null,

    /// Simple term definition: the term maps directly to a string.
    Direct(String),

    Expanded(ExpandedTerm),
}

impl TermDefinition {
    /// Builds a definition out of the raw JSON value of a context entry.
    ///
    /// Only structural problems are reported here; everything else is the
    /// job of validation, which may have been skipped.
    pub(crate) fn from_json(term: &str, value: &Value) -> Result<TermDefinition, ContextError> {
        match value {
            Value::Null => Ok(TermDefinition::Null),
            Value::String(iri) => Ok(TermDefinition::Direct(iri.clone())),
            Value::Object(map) => {
                if map.len() == 1 && map.get("@id") == Some(&Value::Null) {
                    return Ok(TermDefinition::Null);
                }

                let mut def = ExpandedTerm::default();

                def.id = match map.get("@id") {
                    None => None,
                    Some(Value::Null) => Some(None),
                    Some(Value::String(id)) => Some(Some(id.clone())),
                    Some(_) => None,
                };

                if let Some(reverse) = map.get("@reverse") {
                    match reverse {
                        Value::String(iri) => {
                            def.reverse = true;
                            if def.id.is_none() {
                                def.id = Some(Some(iri.clone()));
                            }
                        }
                        _ => {
                            return Err(ContextError::new(
                                ErrorCode::InvalidReverseValue,
                                format!("Invalid @reverse value, must be a string: '{}'", term),
                            ))
                        }
                    }
                }

                def.type_ = map
                    .get("@type")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                def.container = map.get("@container").and_then(parse_container);
                def.language = match map.get("@language") {
                    None => None,
                    Some(Value::String(lang)) => Some(Some(lang.clone())),
                    Some(_) => Some(None),
                };
                def.direction = match map.get("@direction") {
                    None => None,
                    Some(Value::String(dir)) => Some(Direction::from_str(dir)),
                    Some(_) => Some(None),
                };
                def.protected = map.get("@protected").and_then(Value::as_bool);
                def.prefix = map.get("@prefix").and_then(Value::as_bool);
                def.context = map.get("@context").cloned();
                def.index = map
                    .get("@index")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                def.nest = map.get("@nest").and_then(Value::as_str).map(str::to_owned);

                Ok(TermDefinition::Expanded(def))
            }
            _ => Err(ContextError::new(
                ErrorCode::InvalidTermDefinition,
                format!("Found an invalid term value: '{}': '{}'", term, value),
            )),
        }
    }

    /// The IRI (or keyword) this entry maps to, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            TermDefinition::Null => None,
            TermDefinition::Direct(iri) => Some(iri),
            TermDefinition::Expanded(def) => def.id(),
        }
    }

    /// Whether the term is explicitly disabled.
    pub fn is_null(&self) -> bool {
        match self {
            TermDefinition::Null => true,
            TermDefinition::Direct(_) => false,
            TermDefinition::Expanded(def) => def.id == Some(None),
        }
    }

    pub fn is_protected(&self) -> bool {
        match self {
            TermDefinition::Expanded(def) => def.is_protected(),
            _ => false,
        }
    }

    /// This definition in object form with `@protected` forced on, so two
    /// definitions can be compared modulo their protection flag.
    pub(crate) fn as_protected(&self) -> TermDefinition {
        let mut def = match self {
            TermDefinition::Null => ExpandedTerm {
                id: Some(None),
                ..ExpandedTerm::default()
            },
            TermDefinition::Direct(iri) => ExpandedTerm {
                id: Some(Some(iri.clone())),
                ..ExpandedTerm::default()
            },
            TermDefinition::Expanded(def) => def.clone(),
        };
        def.protected = Some(true);
        TermDefinition::Expanded(def)
    }
}

fn parse_container(value: &Value) -> Option<ContainerSpec> {
    match value {
        Value::String(keyword) => Container::from_keyword(keyword).map(|c| {
            let mut set = ContainerSpec::new();
            set.insert(c);
            set
        }),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(Container::from_keyword)
                .collect(),
        ),
        _ => None,
    }
}

struct ContainerRef<'a>(&'a ContainerSpec);

impl<'a> Serialize for ContainerRef<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.0.len() == 1 {
            if let Some(container) = self.0.iter().next() {
                return serializer.serialize_str(container.as_str());
            }
        }

        let mut state = serializer.serialize_seq(Some(self.0.len()))?;
        for container in self.0 {
            state.serialize_element(container.as_str())?;
        }
        state.end()
    }
}

impl Serialize for ExpandedTerm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_map(None)?;

        if let Some(ref id) = self.id {
            state.serialize_entry("@id", id)?;
            if self.reverse {
                state.serialize_entry("@reverse", id)?;
            }
        }

        if let Some(ref typ) = self.type_ {
            state.serialize_entry("@type", typ)?;
        }

        if let Some(ref container) = self.container {
            state.serialize_entry("@container", &ContainerRef(container))?;
        }

        if let Some(ref language) = self.language {
            state.serialize_entry("@language", language)?;
        }

        if let Some(ref direction) = self.direction {
            state.serialize_entry("@direction", &direction.map(Direction::as_str))?;
        }

        if let Some(ref index) = self.index {
            state.serialize_entry("@index", index)?;
        }

        if let Some(ref nest) = self.nest {
            state.serialize_entry("@nest", nest)?;
        }

        if let Some(prefix) = self.prefix {
            state.serialize_entry("@prefix", &prefix)?;
        }

        if let Some(protected) = self.protected {
            state.serialize_entry("@protected", &protected)?;
        }

        if let Some(ref context) = self.context {
            state.serialize_entry("@context", context)?;
        }

        state.end()
    }
}

impl Serialize for TermDefinition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TermDefinition::Null => serializer.serialize_none(),
            TermDefinition::Direct(iri) => serializer.serialize_str(iri),
            TermDefinition::Expanded(def) => def.serialize(serializer),
        }
    }
}

/// A fully resolved context: a flat map of term definitions plus the
/// context-level keyword values.
///
/// Instances are immutable once handed out by the parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedContext {
    pub(crate) base: Option<String>,
    pub(crate) vocab: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) direction: Option<Direction>,
    pub(crate) version: Option<f64>,
    pub(crate) propagate: Option<bool>,
    pub(crate) terms: IndexMap<String, TermDefinition>,
}

impl NormalizedContext {
    pub fn new() -> NormalizedContext {
        NormalizedContext::default()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn version(&self) -> Option<f64> {
        self.version
    }

    pub fn propagate(&self) -> Option<bool> {
        self.propagate
    }

    pub fn get(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// Term definitions in insertion order.
    pub fn terms(&self) -> impl Iterator<Item = (&String, &TermDefinition)> {
        self.terms.iter()
    }

    /// Whether the context holds neither terms nor context-level values.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
            && self.base.is_none()
            && self.vocab.is_none()
            && self.language.is_none()
            && self.direction.is_none()
            && self.version.is_none()
            && self.propagate.is_none()
    }

    pub fn is_term_protected(&self, term: &str) -> bool {
        self.terms.get(term).map_or(false, TermDefinition::is_protected)
    }

    pub fn has_protected_terms(&self) -> bool {
        self.terms.values().any(TermDefinition::is_protected)
    }

    /// The prefix of a compact IRI, if that prefix is a non-null term of
    /// this context.
    pub fn prefix_of<'a>(&self, term: &'a str) -> Option<&'a str> {
        crate::helper::prefix_candidate(term)
            .filter(|prefix| self.terms.get(*prefix).map_or(false, |def| !def.is_null()))
    }

    /// The context as JSON, reserved keys first.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

impl Serialize for NormalizedContext {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_map(None)?;

        if let Some(ref base) = self.base {
            state.serialize_entry("@base", base)?;
        }

        if let Some(ref vocab) = self.vocab {
            state.serialize_entry("@vocab", vocab)?;
        }

        if let Some(ref language) = self.language {
            state.serialize_entry("@language", language)?;
        }

        if let Some(direction) = self.direction {
            state.serialize_entry("@direction", direction.as_str())?;
        }

        if let Some(version) = self.version {
            state.serialize_entry("@version", &version)?;
        }

        if let Some(propagate) = self.propagate {
            state.serialize_entry("@propagate", &propagate)?;
        }

        for (term, def) in &self.terms {
            state.serialize_entry(term, def)?;
        }

        state.end()
    }
}

/// A borrowed view of a caller-supplied context value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawContext<'a> {
    Null,
    Iri(&'a str),
    Mapping(&'a Map<String, Value>),
    List(&'a [Value]),
}

impl<'a> RawContext<'a> {
    pub fn classify(value: &'a Value) -> Result<RawContext<'a>, ContextError> {
        match value {
            Value::Null => Ok(RawContext::Null),
            Value::String(iri) => Ok(RawContext::Iri(iri)),
            Value::Object(map) => Ok(RawContext::Mapping(map)),
            Value::Array(items) => Ok(RawContext::List(items)),
            _ => Err(ContextError::new(
                ErrorCode::InvalidLocalContext,
                format!(
                    "Tried parsing a context that is not a string, array or object, but got {}",
                    value
                ),
            )),
        }
    }
}
