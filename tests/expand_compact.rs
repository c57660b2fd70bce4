use jsonld_context::loader::StaticLoader;
use jsonld_context::{ContextParser, ErrorCode, ExpandOptions, NormalizedContext, ParseOptions};
use serde_json::{json, Value};
use std::sync::Arc;

async fn parse(context: Value) -> Arc<NormalizedContext> {
    ContextParser::new(StaticLoader::new())
        .parse(&context, &ParseOptions::default())
        .await
        .unwrap()
}

fn expand(ctx: &NormalizedContext, term: &str, vocab: bool) -> Option<String> {
    ctx.expand_term(term, vocab, &ExpandOptions::default()).unwrap()
}

#[async_std::test]
async fn compact_iris_with_gen_delims() {
    let ctx = parse(json!({"abc": "http://ex.org/compact/"})).await;
    assert_eq!(
        expand(&ctx, "abc:def", true).as_deref(),
        Some("http://ex.org/compact/def")
    );

    let ctx = parse(json!({"abc": "http://ex.org/compact-"})).await;
    assert_eq!(expand(&ctx, "abc:def", true).as_deref(), Some("abc:def"));
}

#[async_std::test]
async fn forced_prefixes() {
    let ctx = parse(json!({
        "abc": {"@id": "http://ex.org/compact-", "@prefix": true}
    }))
    .await;

    assert_eq!(
        expand(&ctx, "abc:def", true).as_deref(),
        Some("http://ex.org/compact-def")
    );
}

#[async_std::test]
async fn vocab_and_base() {
    let options = ParseOptions {
        base_iri: Some("http://base.org/doc/".to_owned()),
        ..ParseOptions::default()
    };
    let ctx = ContextParser::new(StaticLoader::new())
        .parse(
            &json!({"@vocab": "http://vocab.org/", "off": null, "type": "@type"}),
            &options,
        )
        .await
        .unwrap();

    assert_eq!(expand(&ctx, "p", true).as_deref(), Some("http://vocab.org/p"));
    assert_eq!(expand(&ctx, "p", false).as_deref(), Some("http://base.org/doc/p"));
    assert_eq!(expand(&ctx, "off", true), None);
    assert_eq!(expand(&ctx, "type", true).as_deref(), Some("@type"));
    assert_eq!(expand(&ctx, "_:b0", false).as_deref(), Some("_:b0"));
}

#[async_std::test]
async fn relative_vocab_without_permission() {
    let options = ParseOptions {
        base_iri: Some("http://base.org/".to_owned()),
        ..ParseOptions::default()
    };
    let ctx = ContextParser::new(StaticLoader::new())
        .parse(&json!({"@vocab": "terms/"}), &options)
        .await
        .unwrap();

    assert_eq!(expand(&ctx, "p", true).as_deref(), Some("http://base.org/terms/p"));

    let strict = ExpandOptions {
        allow_vocab_relative_to_base: false,
        ..ExpandOptions::default()
    };
    assert_eq!(
        ctx.expand_term("p", true, &strict).unwrap_err().code(),
        ErrorCode::InvalidVocabMapping
    );
}

#[async_std::test]
async fn compaction_prefers_the_shortest_suffix() {
    let ctx = parse(json!({
        "a": "http://ex.org/a/",
        "b": "http://ex.org/a/b/",
        "c": "http://ex.org/a/b/c/"
    }))
    .await;

    assert_eq!(ctx.compact_iri("http://ex.org/a/b/c/suffix", true), "c:suffix");
    assert_eq!(
        expand(&ctx, "c:suffix", true).as_deref(),
        Some("http://ex.org/a/b/c/suffix")
    );
}

#[async_std::test]
async fn compaction_round_trips() {
    let ctx = parse(json!({
        "@vocab": "http://schema.org/",
        "foaf": "http://xmlns.com/foaf/0.1/",
        "name": "foaf:name",
        "knows": {"@id": "foaf:knows", "@type": "@id"}
    }))
    .await;

    for iri in &[
        "http://xmlns.com/foaf/0.1/name",
        "http://xmlns.com/foaf/0.1/knows",
        "http://xmlns.com/foaf/0.1/mbox",
        "http://schema.org/Person",
        "http://unrelated.org/x",
    ] {
        let compacted = ctx.compact_iri(iri, true);
        assert_eq!(
            expand(&ctx, &compacted, true).as_deref(),
            Some(*iri),
            "{} compacted to {}",
            iri,
            compacted
        );
    }

    assert_eq!(ctx.compact_iri("http://xmlns.com/foaf/0.1/name", true), "name");
    assert_eq!(ctx.compact_iri("http://xmlns.com/foaf/0.1/mbox", true), "foaf:mbox");
    assert_eq!(ctx.compact_iri("http://schema.org/Person", true), "Person");
}
