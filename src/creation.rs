use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::api::{ContextParser, ExpandOptions, ParseOptions};
use crate::context::{
    Container, Direction, ExpandedTerm, NormalizedContext, ProcessingMode, RawContext,
    TermDefinition,
};
use crate::error::{ContextError, ErrorCode};
use crate::helper::{
    is_potential_keyword, is_valid_iri, resolve_iri, ALIAS_DOMAIN_BLACKLIST,
    ALIAS_RANGE_BLACKLIST, CONTEXT_KEYWORDS,
};
use crate::validate::{self, ValidationScope};

/// Per-step resolution state that callers never set themselves.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    /// The context value came out of a fetched document.
    pub(crate) external: bool,

    /// IRI of the document the context value came from, used to resolve
    /// nested references.
    pub(crate) document_iri: Option<String>,

    /// Remote contexts being resolved on the current path.
    pub(crate) remote_contexts: Vec<String>,

    pub(crate) ignore_protection: bool,

    /// Leave remote references unresolved (scoped context trial runs).
    pub(crate) skip_remote: bool,
}

impl Scope {
    pub(crate) fn root(options: &ParseOptions) -> Scope {
        Scope {
            external: options.external,
            ..Scope::default()
        }
    }
}

fn copy_without(map: &Map<String, Value>, skipped: &str) -> Map<String, Value> {
    map.iter()
        .filter(|(key, _)| key.as_str() != skipped)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn value_id(value: &Value) -> Option<&str> {
    match value {
        Value::String(iri) => Some(iri),
        Value::Object(map) => map.get("@id").and_then(Value::as_str),
        _ => None,
    }
}

impl ContextParser {
    pub(crate) fn resolve<'a>(
        &'a self,
        context: &'a Value,
        options: &'a ParseOptions,
        scope: &'a Scope,
    ) -> BoxFuture<'a, Result<Arc<NormalizedContext>, ContextError>> {
        async move {
            match RawContext::classify(context)? {
                RawContext::Null => self.resolve_null(options, scope),
                RawContext::Iri(iri) => self.resolve_remote(iri, options, scope).await,
                RawContext::List(items) => self.resolve_list(items, options, scope).await,
                RawContext::Mapping(map) => self.resolve_mapping(map, options, scope).await,
            }
        }
        .boxed()
    }

    fn resolve_null(
        &self,
        options: &ParseOptions,
        scope: &Scope,
    ) -> Result<Arc<NormalizedContext>, ContextError> {
        if let Some(ref parent) = options.parent_context {
            if !scope.ignore_protection
                && options.processing_mode >= ProcessingMode::JsonLd11
                && parent.has_protected_terms()
            {
                return Err(ContextError::new(
                    ErrorCode::InvalidContextNullification,
                    "Illegal context nullification when terms are protected",
                ));
            }
        }

        let mut context = NormalizedContext::new();
        context.base = options.base_iri.clone();
        Ok(Arc::new(context))
    }

    async fn resolve_remote(
        &self,
        iri: &str,
        options: &ParseOptions,
        scope: &Scope,
    ) -> Result<Arc<NormalizedContext>, ContextError> {
        if scope.skip_remote {
            return Ok(options.parent_context.clone().unwrap_or_default());
        }

        let url = self.context_iri(iri, options, scope)?;

        if scope.remote_contexts.iter().any(|seen| *seen == url) {
            return Err(ContextError::new(
                ErrorCode::RecursiveContextInclusion,
                format!("Detected a cyclic context inclusion of {}", url),
            ));
        }

        let document = self.load(&url).await?;
        let context = match document {
            Value::Object(mut map) => match map.remove("@context") {
                Some(context) => context,
                None => {
                    return Err(ContextError::new(
                        ErrorCode::InvalidRemoteContext,
                        format!("Missing @context in remote context at {}", url),
                    ))
                }
            },
            _ => {
                return Err(ContextError::new(
                    ErrorCode::InvalidRemoteContext,
                    format!("Remote context at {} is not a JSON object", url),
                ))
            }
        };

        let mut nested = scope.clone();
        nested.external = true;
        nested.document_iri = Some(url.clone());
        nested.remote_contexts.push(url);

        self.resolve(&context, options, &nested).await
    }

    /// Resolves a context reference against the current document or base.
    fn context_iri(
        &self,
        iri: &str,
        options: &ParseOptions,
        scope: &Scope,
    ) -> Result<String, ContextError> {
        if is_valid_iri(iri) {
            return Ok(iri.to_owned());
        }

        let base = scope
            .document_iri
            .as_deref()
            .or_else(|| options.base_iri.as_deref());
        let resolved = resolve_iri(iri, base);

        if is_valid_iri(&resolved) {
            Ok(resolved)
        } else {
            Err(ContextError::new(
                ErrorCode::InvalidLocalContext,
                format!("Found invalid relative context IRI: {}", iri),
            ))
        }
    }

    async fn resolve_list(
        &self,
        items: &[Value],
        options: &ParseOptions,
        scope: &Scope,
    ) -> Result<Arc<NormalizedContext>, ContextError> {
        let mut accumulated = options.parent_context.clone();

        for item in items {
            let step = ParseOptions {
                parent_context: accumulated.take(),
                ..options.clone()
            };
            accumulated = Some(self.resolve(item, &step, scope).await?);
        }

        Ok(accumulated.unwrap_or_default())
    }

    async fn resolve_mapping(
        &self,
        map: &Map<String, Value>,
        options: &ParseOptions,
        scope: &Scope,
    ) -> Result<Arc<NormalizedContext>, ContextError> {
        // A whole document: only its context matters.
        if let Some(inner) = map.get("@context") {
            return self.resolve(inner, options, scope).await;
        }

        let mode = options.processing_mode;
        let parent = options.parent_context.as_deref();

        // 1
        let mut own = if scope.external {
            copy_without(map, "@base")
        } else {
            map.clone()
        };

        // 2
        if let Some(import) = own.get("@import").cloned() {
            own = self.import_context(&import, &own, options, scope).await?;
        }

        // 3
        if let Some(version) = own.get("@version") {
            if !version.is_null() && mode == ProcessingMode::JsonLd10 {
                return Err(ContextError::new(
                    ErrorCode::ProcessingModeConflict,
                    format!(
                        "Unsupported JSON-LD version '{}' under active processing mode {}",
                        version, mode
                    ),
                ));
            }
        }

        // 4
        check_keyword_aliases(&own, mode)?;

        // 5
        if !options.skip_validation {
            let validation = ValidationScope {
                mode,
                has_vocab: match own.get("@vocab") {
                    Some(vocab) => !vocab.is_null(),
                    None => parent.map_or(false, |p| p.vocab.is_some()),
                },
                has_base: match own.get("@base") {
                    Some(base) => !base.is_null(),
                    None => {
                        parent.map_or(false, |p| p.base.is_some()) || options.base_iri.is_some()
                    }
                },
            };
            validate::validate_entries(&own, &validation)?;
        }

        // 6
        let protect_all = own.get("@protected").and_then(Value::as_bool) == Some(true);
        let check_protection = !scope.ignore_protection && mode >= ProcessingMode::JsonLd11;
        let mut definitions: Vec<(String, TermDefinition)> = Vec::new();

        for (key, value) in &own {
            if CONTEXT_KEYWORDS.contains(&key.as_str()) {
                continue;
            }

            let mut definition = TermDefinition::from_json(key, value)?;

            if protect_all {
                definition = match definition {
                    TermDefinition::Direct(iri) => TermDefinition::Expanded(ExpandedTerm {
                        id: Some(Some(iri)),
                        protected: Some(true),
                        ..ExpandedTerm::default()
                    }),
                    TermDefinition::Expanded(mut def) => {
                        if def.protected.is_none() {
                            def.protected = Some(true);
                        }
                        TermDefinition::Expanded(def)
                    }
                    TermDefinition::Null => TermDefinition::Null,
                };
            }

            if check_protection && parent.map_or(false, |p| p.is_term_protected(key)) {
                definition = definition.as_protected();
            }

            definitions.push((key.clone(), definition));
        }

        // 7
        let mut merged = match parent {
            Some(parent) => parent.clone(),
            None => NormalizedContext::new(),
        };

        if merged.base.is_none() {
            merged.base = options.base_iri.clone();
        }

        apply_context_entries(&mut merged, &own);

        for (key, definition) in &definitions {
            merged.terms.insert(key.clone(), definition.clone());
        }

        // 8
        expand_prefixed_terms(
            &mut merged,
            &options.expand_options(),
            self.inner.expand_content_type_to_base,
        )?;

        // 9
        if check_protection {
            if let Some(parent) = parent {
                for (key, _) in &definitions {
                    check_protected_redefinition(parent, &merged, key)?;
                }
            }
        }

        // 10
        if mode == ProcessingMode::JsonLd10 || options.normalize_language_tags {
            normalize_language_tags(&mut merged);
        }

        // 11
        if mode >= ProcessingMode::JsonLd11 {
            for (key, definition) in &definitions {
                if let TermDefinition::Expanded(ref def) = definition {
                    if let Some(ref scoped) = def.context {
                        self.check_scoped_context(key, scoped, &merged, options, scope)
                            .await?;
                    }
                }
            }
        }

        Ok(Arc::new(merged))
    }

    async fn import_context(
        &self,
        import: &Value,
        own: &Map<String, Value>,
        options: &ParseOptions,
        scope: &Scope,
    ) -> Result<Map<String, Value>, ContextError> {
        if options.processing_mode == ProcessingMode::JsonLd10 {
            return Err(ContextError::new(
                ErrorCode::InvalidContextEntry,
                "Context importing is not supported in JSON-LD 1.0",
            ));
        }

        let iri = import.as_str().ok_or_else(|| {
            ContextError::new(
                ErrorCode::InvalidImportValue,
                format!("An @import value must be a string, but got: {}", import),
            )
        })?;

        let url = self.context_iri(iri, options, scope)?;
        let document = self.load(&url).await?;

        let imported = match document.get("@context") {
            Some(Value::Object(imported)) => imported,
            _ => {
                return Err(ContextError::new(
                    ErrorCode::InvalidRemoteContext,
                    format!("An imported context must be a single object: {}", url),
                ))
            }
        };

        if imported.contains_key("@import") {
            return Err(ContextError::new(
                ErrorCode::InvalidContextEntry,
                format!("An imported context can not import another context: {}", url),
            ));
        }

        let mut result = imported.clone();
        for (key, value) in own {
            if key != "@import" {
                result.insert(key.clone(), value.clone());
            }
        }

        Ok(result)
    }

    /// Trial-parses an inline scoped context on top of the context that
    /// declares it.
    async fn check_scoped_context(
        &self,
        term: &str,
        scoped: &Value,
        merged: &NormalizedContext,
        options: &ParseOptions,
        scope: &Scope,
    ) -> Result<(), ContextError> {
        if scoped.is_null() {
            return Ok(());
        }

        let mut host = merged.clone();
        if let Some(TermDefinition::Expanded(def)) = host.terms.get_mut(term) {
            def.context = None;
        }

        let trial_options = ParseOptions {
            parent_context: Some(Arc::new(host)),
            external: false,
            ..options.clone()
        };
        let trial_scope = Scope {
            external: false,
            ignore_protection: true,
            skip_remote: true,
            ..scope.clone()
        };

        match self.resolve(scoped, &trial_options, &trial_scope).await {
            Ok(_) => Ok(()),
            Err(err) => Err(ContextError::new(
                ErrorCode::InvalidScopedContext,
                format!("Invalid scoped context for term '{}': {}", term, err),
            )),
        }
    }
}

/// Rejects keyword redefinitions and illegal keyword aliases.
///
/// These are structural and survive `skip_validation`.
fn check_keyword_aliases(entries: &Map<String, Value>, mode: ProcessingMode) -> Result<(), ContextError> {
    for (key, value) in entries {
        if CONTEXT_KEYWORDS.contains(&key.as_str()) {
            continue;
        }

        if is_potential_keyword(key) && ALIAS_DOMAIN_BLACKLIST.contains(&key.as_str()) {
            let allowed = key == "@type"
                && mode >= ProcessingMode::JsonLd11
                && value.as_object().map_or(false, |def| {
                    !def.is_empty()
                        && def.iter().all(|(entry, entry_value)| match entry.as_str() {
                            "@container" => entry_value == "@set",
                            "@protected" => entry_value.is_boolean(),
                            _ => false,
                        })
                });

            if !allowed {
                return Err(ContextError::new(
                    ErrorCode::KeywordRedefinition,
                    format!(
                        "Keywords can not be aliased to something else.\nTried mapping {} to {}",
                        key, value
                    ),
                ));
            }
        }

        if let Some(id) = value_id(value) {
            if ALIAS_RANGE_BLACKLIST.contains(&id) {
                return Err(ContextError::new(
                    ErrorCode::InvalidKeywordAlias,
                    format!(
                        "Aliasing to certain keywords is not allowed.\nTried mapping {} to {}",
                        key, value
                    ),
                ));
            }

            if is_potential_keyword(id) && value.get("@prefix") == Some(&Value::Bool(true)) {
                return Err(ContextError::new(
                    ErrorCode::InvalidTermDefinition,
                    format!("Tried to use keyword aliases as prefix: '{}': '{}'", key, value),
                ));
            }
        }
    }

    Ok(())
}

/// Copies `@base`, `@vocab`, `@language`, `@direction`, `@version` and
/// `@propagate` from the context object onto the merged context.
fn apply_context_entries(merged: &mut NormalizedContext, own: &Map<String, Value>) {
    match own.get("@base") {
        Some(Value::String(base)) => {
            let resolved = resolve_iri(base, merged.base.as_deref());
            merged.base = Some(resolved);
        }
        Some(Value::Null) => merged.base = None,
        _ => {}
    }

    match own.get("@vocab") {
        Some(Value::String(vocab)) => merged.vocab = Some(vocab.clone()),
        Some(Value::Null) => merged.vocab = None,
        _ => {}
    }

    match own.get("@language") {
        Some(Value::String(language)) => merged.language = Some(language.clone()),
        Some(Value::Null) => merged.language = None,
        _ => {}
    }

    match own.get("@direction") {
        Some(Value::String(direction)) => merged.direction = Direction::from_str(direction),
        Some(Value::Null) => merged.direction = None,
        _ => {}
    }

    match own.get("@version") {
        Some(Value::Number(version)) => merged.version = version.as_f64(),
        Some(Value::Null) => merged.version = None,
        _ => {}
    }

    match own.get("@propagate") {
        Some(Value::Bool(propagate)) => merged.propagate = Some(*propagate),
        Some(Value::Null) => merged.propagate = None,
        _ => {}
    }
}

/// Expands prefixed term values until no term changes anymore.
///
/// A term whose value keeps changing is a cyclic IRI mapping.
pub(crate) fn expand_prefixed_terms(
    context: &mut NormalizedContext,
    options: &ExpandOptions,
    content_type_to_base: bool,
) -> Result<(), ContextError> {
    for index in 0..context.terms.len() {
        let key = match context.terms.get_index(index) {
            Some((key, _)) => key.clone(),
            None => continue,
        };

        let mut history: Vec<TermDefinition> = Vec::new();

        loop {
            let current = context.terms[index].clone();
            let next = expand_definition(context, &key, &current, options, content_type_to_base)?;

            if next == current {
                break;
            }

            let self_referencing = next
                .id()
                .and_then(|id| context.prefix_of(id))
                .map_or(false, |prefix| prefix == key);

            if self_referencing || history.contains(&next) {
                return Err(ContextError::new(
                    ErrorCode::CyclicIriMapping,
                    format!("Detected cyclical IRI mapping in term '{}'", key),
                ));
            }

            history.push(current);
            context.terms[index] = next;
        }
    }

    Ok(())
}

fn expand_definition(
    context: &NormalizedContext,
    key: &str,
    definition: &TermDefinition,
    options: &ExpandOptions,
    content_type_to_base: bool,
) -> Result<TermDefinition, ContextError> {
    match definition {
        TermDefinition::Null => Ok(TermDefinition::Null),
        TermDefinition::Direct(value) => match context.expand_term(value, true, options)? {
            Some(iri) => Ok(TermDefinition::Direct(iri)),
            None => Ok(TermDefinition::Null),
        },
        TermDefinition::Expanded(def) => {
            let mut next = def.clone();
            let can_add_id = def.prefix.is_none() || is_valid_iri(key);

            match def.id {
                Some(Some(ref id)) => {
                    if let Some(expanded) = context.expand_term(id, true, options)? {
                        next.id = Some(Some(expanded));
                    }
                }
                Some(None) => {}
                None => {
                    if !is_potential_keyword(key) && can_add_id {
                        if let Some(expanded) = context.expand_term(key, true, options)? {
                            if expanded != key {
                                next.id = Some(Some(expanded));
                            }
                        }
                    }
                }
            }

            if let Some(ref typ) = def.type_ {
                if typ != "@vocab" && !def.has_container(Container::Type) && can_add_id {
                    let mut expanded = context.expand_term(typ, true, options)?;
                    if content_type_to_base && expanded.as_deref() == Some(typ.as_str()) {
                        expanded = context.expand_term(typ, false, options)?;
                    }

                    if let Some(expanded) = expanded {
                        next.type_ = Some(expanded);
                    }
                }
            }

            Ok(TermDefinition::Expanded(next))
        }
    }
}

fn check_protected_redefinition(
    parent: &NormalizedContext,
    merged: &NormalizedContext,
    key: &str,
) -> Result<(), ContextError> {
    let before = match parent.get(key) {
        Some(before) if before.is_protected() => before,
        _ => return Ok(()),
    };

    let after = match merged.get(key) {
        Some(after) => after,
        None => return Ok(()),
    };

    if before.as_protected() != after.as_protected() {
        return Err(ContextError::new(
            ErrorCode::ProtectedTermRedefinition,
            format!(
                "Attempted to override the protected keyword {} from {:?} to {:?}",
                key,
                before.id(),
                after.id()
            ),
        ));
    }

    Ok(())
}

fn normalize_language_tags(context: &mut NormalizedContext) {
    if let Some(ref mut language) = context.language {
        *language = language.to_lowercase();
    }

    for definition in context.terms.values_mut() {
        if let TermDefinition::Expanded(ref mut def) = definition {
            if let Some(Some(ref mut language)) = def.language {
                *language = language.to_lowercase();
            }
        }
    }
}
