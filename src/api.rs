use futures::future::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::cache::{resolution_key, MemoCache};
use crate::context::{NormalizedContext, ProcessingMode};
use crate::creation::Scope;
use crate::error::ContextError;
use crate::DocumentLoader;

/// Options that tune how compact IRIs and vocabulary terms expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpandOptions {
    /// Expanded term definitions only act as prefixes when they say
    /// `@prefix: true`.
    pub allow_prefix_forcing: bool,

    /// Simple term definitions act as prefixes even if their IRI does not
    /// end in a gen-delim character.
    pub allow_prefix_non_gen_delims: bool,

    /// A relative `@vocab` is resolved against `@base`.
    pub allow_vocab_relative_to_base: bool,

    /// Relative term values are resolved against `@vocab` instead of
    /// being reported as invalid IRI mappings.
    pub allow_reverse_relative_to_vocab: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions {
            allow_prefix_forcing: true,
            allow_prefix_non_gen_delims: false,
            allow_vocab_relative_to_base: true,
            allow_reverse_relative_to_vocab: false,
        }
    }
}

/// Options that may be passed to `ContextParser::parse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// The base IRI of the document. Used to resolve relative references,
    /// and as `@base` when the context does not set one.
    #[serde(rename = "baseIRI")]
    pub base_iri: Option<String>,

    /// The context the parsed context is merged on top of.
    #[serde(skip)]
    pub parent_context: Option<Arc<NormalizedContext>>,

    /// Whether the context was loaded from a remote document.
    pub external: bool,

    #[serde(with = "processing_mode_number")]
    pub processing_mode: ProcessingMode,

    pub allow_prefix_forcing: bool,
    pub allow_prefix_non_gen_delims: bool,
    pub allow_vocab_relative_to_base: bool,
    pub allow_reverse_relative_to_vocab: bool,

    /// Lower-case `@language` values even in JSON-LD 1.1.
    pub normalize_language_tags: bool,

    /// Skip the per-entry validation checks; structural errors are still
    /// reported.
    pub skip_validation: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        let expand = ExpandOptions::default();
        ParseOptions {
            base_iri: None,
            parent_context: None,
            external: false,
            processing_mode: ProcessingMode::default(),
            allow_prefix_forcing: expand.allow_prefix_forcing,
            allow_prefix_non_gen_delims: expand.allow_prefix_non_gen_delims,
            allow_vocab_relative_to_base: expand.allow_vocab_relative_to_base,
            allow_reverse_relative_to_vocab: expand.allow_reverse_relative_to_vocab,
            normalize_language_tags: false,
            skip_validation: false,
        }
    }
}

impl ParseOptions {
    pub fn expand_options(&self) -> ExpandOptions {
        ExpandOptions {
            allow_prefix_forcing: self.allow_prefix_forcing,
            allow_prefix_non_gen_delims: self.allow_prefix_non_gen_delims,
            allow_vocab_relative_to_base: self.allow_vocab_relative_to_base,
            allow_reverse_relative_to_vocab: self.allow_reverse_relative_to_vocab,
        }
    }
}

mod processing_mode_number {
    use super::ProcessingMode;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::convert::TryFrom;

    pub fn serialize<S: Serializer>(mode: &ProcessingMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(f64::from(*mode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProcessingMode, D::Error> {
        let number = f64::deserialize(deserializer)?;
        ProcessingMode::try_from(number).map_err(D::Error::custom)
    }
}

pub(crate) struct ParserInner {
    pub(crate) loader: Arc<dyn DocumentLoader>,
    pub(crate) documents: MemoCache<Value>,
    pub(crate) resolutions: Option<MemoCache<Arc<NormalizedContext>>>,
    pub(crate) expand_content_type_to_base: bool,
}

/// Resolves raw contexts into normalized ones.
///
/// Cloning is cheap; clones share the loader and both caches.
#[derive(Clone)]
pub struct ContextParser {
    pub(crate) inner: Arc<ParserInner>,
}

/// Number of normalized contexts kept by default.
pub const DEFAULT_RESOLUTION_CACHE_CAPACITY: usize = 100;

/// Number of fetched documents kept by default.
pub const DEFAULT_DOCUMENT_CACHE_CAPACITY: usize = 100;

/// Configures a `ContextParser`.
pub struct ContextParserBuilder {
    loader: Arc<dyn DocumentLoader>,
    resolution_cache: bool,
    resolution_cache_capacity: usize,
    document_cache_capacity: usize,
    expand_content_type_to_base: bool,
}

impl ContextParserBuilder {
    /// Whether identical `parse` calls share one resolution. Defaults to on.
    pub fn resolution_cache(mut self, enabled: bool) -> Self {
        self.resolution_cache = enabled;
        self
    }

    /// How many normalized contexts the resolution cache keeps before it
    /// drops the least recently used one.
    pub fn resolution_cache_capacity(mut self, capacity: usize) -> Self {
        self.resolution_cache_capacity = capacity;
        self
    }

    /// How many fetched documents are kept before the least recently used
    /// one is dropped.
    pub fn document_cache_capacity(mut self, capacity: usize) -> Self {
        self.document_cache_capacity = capacity;
        self
    }

    /// When a term's `@type` does not expand against the vocabulary, retry
    /// expanding it against the base IRI.
    pub fn expand_content_type_to_base(mut self, enabled: bool) -> Self {
        self.expand_content_type_to_base = enabled;
        self
    }

    pub fn build(self) -> ContextParser {
        ContextParser {
            inner: Arc::new(ParserInner {
                loader: self.loader,
                documents: MemoCache::with_capacity(self.document_cache_capacity),
                resolutions: if self.resolution_cache {
                    Some(MemoCache::with_capacity(self.resolution_cache_capacity))
                } else {
                    None
                },
                expand_content_type_to_base: self.expand_content_type_to_base,
            }),
        }
    }
}

impl ContextParser {
    pub fn new<L: DocumentLoader + 'static>(loader: L) -> ContextParser {
        ContextParser::builder(Arc::new(loader)).build()
    }

    pub fn builder(loader: Arc<dyn DocumentLoader>) -> ContextParserBuilder {
        ContextParserBuilder {
            loader,
            resolution_cache: true,
            resolution_cache_capacity: DEFAULT_RESOLUTION_CACHE_CAPACITY,
            document_cache_capacity: DEFAULT_DOCUMENT_CACHE_CAPACITY,
            expand_content_type_to_base: false,
        }
    }

    /// Resolves `context` into a normalized context.
    ///
    /// Identical concurrent calls attach to the same in-flight resolution.
    pub async fn parse(
        &self,
        context: &Value,
        options: &ParseOptions,
    ) -> Result<Arc<NormalizedContext>, ContextError> {
        let resolutions = match self.inner.resolutions {
            Some(ref resolutions) => resolutions,
            None => return self.resolve(context, options, &Scope::root(options)).await,
        };

        let key = resolution_key(context, options);
        let parser = self.clone();
        let context = context.clone();
        let options = options.clone();

        resolutions
            .get_or_start(&key, move || {
                async move {
                    let scope = Scope::root(&options);
                    parser.resolve(&context, &options, &scope).await
                }
                .boxed()
            })
            .await
    }

    /// Number of normalized contexts currently held by the resolution cache.
    pub fn cached_resolutions(&self) -> usize {
        self.inner.resolutions.as_ref().map_or(0, MemoCache::len)
    }

    /// Loads the document behind `url` through the document cache.
    ///
    /// Every call returns its own copy of the cached document.
    pub async fn load(&self, url: &str) -> Result<Value, ContextError> {
        let loader = self.inner.loader.clone();
        let owned = url.to_owned();

        self.inner
            .documents
            .get_or_start(url, move || {
                async move {
                    log::debug!("loading remote document {}", owned);
                    loader.load(&owned).await
                }
                .boxed()
            })
            .await
    }
}
