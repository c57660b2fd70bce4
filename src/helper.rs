//! Stateless predicates over keywords, IRIs and language tags.

use regex::Regex;
use std::collections::HashSet;
use url::Url;

lazy_static! {
    static ref KEYWORDS: HashSet<&'static str> = vec![
        "@base",
        "@container",
        "@context",
        "@direction",
        "@graph",
        "@id",
        "@import",
        "@included",
        "@index",
        "@json",
        "@language",
        "@list",
        "@nest",
        "@none",
        "@prefix",
        "@preserve",
        "@propagate",
        "@protected",
        "@reverse",
        "@set",
        "@type",
        "@value",
        "@version",
        "@vocab",
    ]
    .into_iter()
    .collect();

    static ref POTENTIAL_KEYWORD: Regex = Regex::new(r"^@[a-zA-Z]+$").unwrap();

    static ref IRI: Regex =
        Regex::new(r##"^([A-Za-z][A-Za-z0-9+\-.]*|_):[^ "<>{}|\\\[\]`#]*(#[^#]*)?$"##).unwrap();

    static ref LANGUAGE_TAG: Regex = Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap();
}

/// Keywords that may not be redefined as terms.
pub const ALIAS_DOMAIN_BLACKLIST: &[&str] = &[
    "@container",
    "@graph",
    "@id",
    "@index",
    "@list",
    "@nest",
    "@none",
    "@prefix",
    "@reverse",
    "@set",
    "@type",
    "@value",
    "@version",
];

/// Keywords no term may alias.
pub const ALIAS_RANGE_BLACKLIST: &[&str] = &["@context", "@preserve"];

/// Context-level entries that are never term definitions.
pub const CONTEXT_KEYWORDS: &[&str] = &[
    "@base",
    "@direction",
    "@import",
    "@language",
    "@propagate",
    "@protected",
    "@version",
    "@vocab",
];

const GEN_DELIMS: &[char] = &[':', '/', '?', '#', '[', ']', '@'];

/// Whether `value` has the shape of a keyword (`@` followed by letters).
pub fn is_potential_keyword(value: &str) -> bool {
    POTENTIAL_KEYWORD.is_match(value)
}

/// Whether `value` is one of the registered keywords.
pub fn is_valid_keyword(value: &str) -> bool {
    KEYWORDS.contains(value)
}

/// Whether `term` looks like `prefix:suffix`.
pub fn is_compact_iri(term: &str) -> bool {
    !term.starts_with('#') && term.find(':').map_or(false, |pos| pos > 0)
}

/// The part before the first colon, when `term` may be a compact IRI.
///
/// Blank node identifiers, hash-relative references and `scheme://`
/// forms never have a prefix.
pub fn prefix_candidate(term: &str) -> Option<&str> {
    if term.starts_with('#') {
        return None;
    }

    let pos = term.find(':')?;
    if term[pos + 1..].starts_with("//") {
        return None;
    }

    let prefix = &term[..pos];
    if prefix == "_" {
        None
    } else {
        Some(prefix)
    }
}

/// Whether `iri` is a syntactically valid absolute IRI (or blank node).
pub fn is_valid_iri(iri: &str) -> bool {
    !iri.is_empty() && IRI.is_match(iri)
}

pub fn ends_with_gen_delim(iri: &str) -> bool {
    iri.chars().last().map_or(false, |c| GEN_DELIMS.contains(&c))
}

pub fn is_valid_language_tag(tag: &str) -> bool {
    LANGUAGE_TAG.is_match(tag)
}

pub fn is_valid_direction(direction: &str) -> bool {
    direction == "ltr" || direction == "rtl"
}

/// Resolves a (possibly relative) IRI reference against `base`.
///
/// Absolute IRIs are returned untouched; if there is no usable base the
/// reference is returned as-is.
pub fn resolve_iri(iri: &str, base: Option<&str>) -> String {
    if is_valid_iri(iri) && !iri.starts_with("_:") {
        return iri.to_owned();
    }

    match base.and_then(|base| Url::parse(base).ok()) {
        Some(base) => match base.join(iri) {
            Ok(joined) => joined.to_string(),
            Err(_) => iri.to_owned(),
        },
        None => iri.to_owned(),
    }
}
