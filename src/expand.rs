use crate::api::ExpandOptions;
use crate::context::{NormalizedContext, TermDefinition};
use crate::error::{ContextError, ErrorCode};
use crate::helper::{
    ends_with_gen_delim, is_compact_iri, is_potential_keyword, is_valid_iri, is_valid_keyword,
    resolve_iri,
};

impl NormalizedContext {
    /// Expands a term or compact IRI to an absolute IRI or keyword.
    ///
    /// `vocab` selects vocabulary-relative expansion (property and type
    /// positions); otherwise relative values resolve against `@base`.
    /// Returns `None` if the term was explicitly disabled.
    pub fn expand_term(
        &self,
        term: &str,
        vocab: bool,
        options: &ExpandOptions,
    ) -> Result<Option<String>, ContextError> {
        let definition = self.terms.get(term);

        // 1
        if vocab && definition.map_or(false, TermDefinition::is_null) {
            return Ok(None);
        }

        // 2
        let mut valid_mapping = true;
        if vocab {
            if let Some(value) = definition.and_then(TermDefinition::id) {
                if value != term {
                    if is_valid_iri(value) || is_valid_keyword(value) {
                        return Ok(Some(value.to_owned()));
                    }

                    if !is_potential_keyword(value) {
                        if !options.allow_reverse_relative_to_vocab {
                            valid_mapping = false;
                        } else if let Some(vocab) = self.vocab.as_deref() {
                            return Ok(Some(format!("{}{}", self.resolve_vocab(vocab), value)));
                        }
                    }
                }
            }
        }

        // 3
        if let Some(prefix) = self.prefix_of(term) {
            if let Some(prefix_definition) = self.terms.get(prefix) {
                if let Some(value) = prefix_definition.id() {
                    if !self.acts_as_prefix(term, prefix_definition, value, options) {
                        return Ok(Some(term.to_owned()));
                    }

                    return Ok(Some(format!("{}{}", value, &term[prefix.len() + 1..])));
                }
            }
        }

        let potential_keyword = is_potential_keyword(term);

        // 4
        if vocab && !potential_keyword && !is_compact_iri(term) {
            if let Some(vocab) = self.vocab.as_deref() {
                if vocab.contains(':') {
                    return Ok(Some(format!("{}{}", vocab, term)));
                }

                if !options.allow_vocab_relative_to_base {
                    return Err(ContextError::new(
                        ErrorCode::InvalidVocabMapping,
                        format!("Relative vocab expansion for term '{}' with vocab '{}' is not allowed", term, vocab),
                    ));
                }

                return Ok(Some(format!("{}{}", self.resolve_vocab(vocab), term)));
            }
        }

        // 5
        if !vocab && !potential_keyword && !is_compact_iri(term) {
            if let Some(base) = self.base.as_deref() {
                return Ok(Some(resolve_iri(term, Some(base))));
            }
        }

        // 6
        if valid_mapping {
            Ok(Some(term.to_owned()))
        } else {
            Err(ContextError::new(
                ErrorCode::InvalidIriMapping,
                format!(
                    "Invalid IRI mapping found for context entry '{}': '{}'",
                    term,
                    definition.and_then(TermDefinition::id).unwrap_or_default()
                ),
            ))
        }
    }

    /// Whether the definition of the prefix of `term` may be used to expand
    /// it as a compact IRI.
    pub(crate) fn acts_as_prefix(
        &self,
        term: &str,
        prefix_definition: &TermDefinition,
        value: &str,
        options: &ExpandOptions,
    ) -> bool {
        let simple = !is_potential_keyword(value)
            && (options.allow_prefix_non_gen_delims
                || value.starts_with('_')
                || ends_with_gen_delim(value));

        match prefix_definition {
            TermDefinition::Expanded(def) if options.allow_prefix_forcing => {
                value.starts_with('_')
                    || is_potential_keyword(term)
                    || def.prefix == Some(true)
                    || self.terms.contains_key(term)
            }
            _ => simple,
        }
    }

    /// A `@vocab` without a scheme is relative to `@base`.
    fn resolve_vocab(&self, vocab: &str) -> String {
        if is_valid_iri(vocab) {
            vocab.to_owned()
        } else {
            resolve_iri(vocab, self.base.as_deref())
        }
    }
}
