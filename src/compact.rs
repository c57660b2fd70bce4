use crate::api::ExpandOptions;
use crate::context::NormalizedContext;
use crate::helper::{is_compact_iri, is_potential_keyword, prefix_candidate, resolve_iri};

impl NormalizedContext {
    /// Shortens an absolute IRI using the terms, `@vocab` and `@base` of
    /// this context.
    ///
    /// The result expands back to `iri` with `expand_term` in the same
    /// mode under the default `ExpandOptions`. IRIs that can't be
    /// shortened are returned unchanged.
    pub fn compact_iri(&self, iri: &str, vocab: bool) -> String {
        self.compact_iri_with(iri, vocab, &ExpandOptions::default())
    }

    /// Like `compact_iri`, but only uses prefixes that act as prefixes
    /// under `options`.
    pub fn compact_iri_with(&self, iri: &str, vocab: bool, options: &ExpandOptions) -> String {
        if vocab {
            for (term, def) in &self.terms {
                if !is_potential_keyword(term) && def.id() == Some(iri) {
                    return term.clone();
                }
            }

            if let Some(suffix) = self.strip_to_term(iri, self.vocab.as_deref()) {
                return suffix.to_owned();
            }
        } else if let Some(suffix) = self.strip_to_term(iri, self.base.as_deref()) {
            if resolve_iri(suffix, self.base.as_deref()) == iri {
                return suffix.to_owned();
            }
        }

        let mut shortest: Option<(&str, &str)> = None;

        for (term, def) in &self.terms {
            if is_potential_keyword(term) || term.contains(':') {
                continue;
            }

            let value = match def.id() {
                Some(value) if !value.is_empty() => value,
                _ => continue,
            };

            let suffix = match iri.strip_prefix(value) {
                Some(suffix) if !suffix.is_empty() => suffix,
                _ => continue,
            };

            let candidate = format!("{}:{}", term, suffix);
            if prefix_candidate(&candidate) != Some(term.as_str())
                || !self.acts_as_prefix(&candidate, def, value, options)
            {
                continue;
            }

            if shortest.map_or(true, |(_, current)| suffix.len() < current.len()) {
                shortest = Some((term, suffix));
            }
        }

        match shortest {
            Some((term, suffix)) => format!("{}:{}", term, suffix),
            None => iri.to_owned(),
        }
    }

    /// Strips `prefix` from `iri` if what remains reads back as a plain
    /// relative reference.
    fn strip_to_term<'a>(&self, iri: &'a str, prefix: Option<&str>) -> Option<&'a str> {
        let prefix = prefix.filter(|prefix| !prefix.is_empty())?;
        let suffix = iri.strip_prefix(prefix)?;

        if suffix.is_empty()
            || is_compact_iri(suffix)
            || is_potential_keyword(suffix)
            || self.terms.contains_key(suffix)
        {
            None
        } else {
            Some(suffix)
        }
    }
}
