use jsonld_context::loader::StaticLoader;
use jsonld_context::{
    ContextParser, ErrorCode, NormalizedContext, ParseOptions, ProcessingMode, TermDefinition,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn parser() -> ContextParser {
    ContextParser::new(StaticLoader::new())
}

async fn parse(context: Value) -> Arc<NormalizedContext> {
    parser()
        .parse(&context, &ParseOptions::default())
        .await
        .unwrap()
}

async fn parse_err(context: Value, options: &ParseOptions) -> ErrorCode {
    parser().parse(&context, options).await.unwrap_err().code()
}

#[async_std::test]
async fn later_contexts_override_earlier_ones() {
    let ctx = parse(json!([
        {"@vocab": "http://one.org/", "a": "http://one.org/a", "b": "http://one.org/b"},
        {"@vocab": "http://two.org/", "a": "http://two.org/a"}
    ]))
    .await;

    assert_eq!(ctx.vocab(), Some("http://two.org/"));
    assert_eq!(ctx.get("a"), Some(&TermDefinition::Direct("http://two.org/a".to_owned())));
    assert_eq!(ctx.get("b"), Some(&TermDefinition::Direct("http://one.org/b".to_owned())));

    let order: Vec<&str> = ctx.terms().map(|(term, _)| term.as_str()).collect();
    assert_eq!(order, vec!["a", "b"]);
}

#[async_std::test]
async fn prefixes_are_expanded_in_place() {
    let ctx = parse(json!({
        "foaf": "http://xmlns.com/foaf/0.1/",
        "name": "foaf:name",
        "knows": {"@id": "foaf:knows", "@type": "@id"}
    }))
    .await;

    assert_eq!(
        ctx.get("name").and_then(TermDefinition::id),
        Some("http://xmlns.com/foaf/0.1/name")
    );
    assert_eq!(
        ctx.get("knows").and_then(TermDefinition::id),
        Some("http://xmlns.com/foaf/0.1/knows")
    );
}

#[async_std::test]
async fn input_context_is_not_modified() {
    let context = json!({"ex": "http://ex.org/", "a": "ex:a"});
    let before = context.clone();

    parser().parse(&context, &ParseOptions::default()).await.unwrap();

    assert_eq!(context, before);
}

#[async_std::test]
async fn protected_terms_can_not_be_redefined() {
    let protected = parse(json!({
        "name": {"@id": "http://xmlns.com/foaf/0.1/name", "@protected": true}
    }))
    .await;

    let options = ParseOptions {
        parent_context: Some(protected.clone()),
        ..ParseOptions::default()
    };

    assert_eq!(
        parse_err(json!({"name": "http://schema.org/name"}), &options).await,
        ErrorCode::ProtectedTermRedefinition
    );

    let same = parser()
        .parse(&json!({"name": "http://xmlns.com/foaf/0.1/name"}), &options)
        .await
        .unwrap();
    assert!(same.is_term_protected("name"));
}

#[async_std::test]
async fn context_level_protection() {
    let ctx = parse(json!({
        "@protected": true,
        "a": "http://ex.org/a",
        "b": {"@id": "http://ex.org/b", "@protected": false}
    }))
    .await;

    assert!(ctx.is_term_protected("a"));
    assert!(!ctx.is_term_protected("b"));
}

#[async_std::test]
async fn protected_terms_block_nullification() {
    let protected = parse(json!({"@protected": true, "a": "http://ex.org/a"})).await;
    let options = ParseOptions {
        parent_context: Some(protected),
        ..ParseOptions::default()
    };

    assert_eq!(
        parse_err(Value::Null, &options).await,
        ErrorCode::InvalidContextNullification
    );
}

#[async_std::test]
async fn null_resets_to_the_base() {
    let parent = parse(json!({"a": "http://ex.org/a"})).await;
    let options = ParseOptions {
        base_iri: Some("http://base.org/".to_owned()),
        parent_context: Some(parent),
        ..ParseOptions::default()
    };

    let ctx = parser().parse(&Value::Null, &options).await.unwrap();

    assert_eq!(ctx.base(), Some("http://base.org/"));
    assert!(ctx.get("a").is_none());
}

#[async_std::test]
async fn context_base_beats_option_base() {
    let options = ParseOptions {
        base_iri: Some("http://outer/".to_owned()),
        ..ParseOptions::default()
    };

    let ctx = parser()
        .parse(&json!({"@base": "http://inner/"}), &options)
        .await
        .unwrap();
    assert_eq!(ctx.base(), Some("http://inner/"));

    let ctx = parser().parse(&json!({}), &options).await.unwrap();
    assert_eq!(ctx.base(), Some("http://outer/"));

    let ctx = parser()
        .parse(&json!({"@base": "sub/"}), &options)
        .await
        .unwrap();
    assert_eq!(ctx.base(), Some("http://outer/sub/"));
}

#[async_std::test]
async fn empty_list_returns_the_parent() {
    let parent = parse(json!({"a": "http://ex.org/a"})).await;
    let options = ParseOptions {
        parent_context: Some(parent.clone()),
        ..ParseOptions::default()
    };

    let ctx = parser().parse(&json!([]), &options).await.unwrap();
    assert!(Arc::ptr_eq(&ctx, &parent));
}

#[async_std::test]
async fn documents_are_unwrapped() {
    let ctx = parse(json!({"@context": {"a": "http://ex.org/a"}})).await;
    assert_eq!(ctx.get("a").and_then(TermDefinition::id), Some("http://ex.org/a"));
}

#[async_std::test]
async fn scalars_are_not_contexts() {
    assert_eq!(
        parse_err(json!(true), &ParseOptions::default()).await,
        ErrorCode::InvalidLocalContext
    );
}

#[async_std::test]
async fn keyword_rules() {
    let options = ParseOptions::default();

    assert_eq!(
        parse_err(json!({"@id": "http://ex.org/id"}), &options).await,
        ErrorCode::KeywordRedefinition
    );
    assert_eq!(
        parse_err(json!({"c": "@context"}), &options).await,
        ErrorCode::InvalidKeywordAlias
    );
    assert_eq!(
        parse_err(json!({"id": {"@id": "@id", "@prefix": true}}), &options).await,
        ErrorCode::InvalidTermDefinition
    );

    let ctx = parser()
        .parse(&json!({"@type": {"@container": "@set"}, "id": "@id"}), &options)
        .await
        .unwrap();
    assert_eq!(ctx.get("id").and_then(TermDefinition::id), Some("@id"));
}

#[async_std::test]
async fn skipping_validation_keeps_structural_errors() {
    let options = ParseOptions {
        skip_validation: true,
        ..ParseOptions::default()
    };

    parser()
        .parse(&json!({"a": {"@id": "http://ex.org/a", "@type": "relative"}}), &options)
        .await
        .unwrap();

    assert_eq!(
        parse_err(json!({"a": {"@reverse": 5}}), &options).await,
        ErrorCode::InvalidReverseValue
    );
    assert_eq!(
        parse_err(json!({"@type": "http://ex.org/t"}), &options).await,
        ErrorCode::KeywordRedefinition
    );
}

#[async_std::test]
async fn version_and_processing_mode() {
    let legacy = ParseOptions {
        processing_mode: ProcessingMode::JsonLd10,
        ..ParseOptions::default()
    };

    assert_eq!(
        parse_err(json!({"@version": 1.1}), &legacy).await,
        ErrorCode::ProcessingModeConflict
    );
    assert_eq!(
        parse_err(json!({"@version": 1.0}), &ParseOptions::default()).await,
        ErrorCode::InvalidVersionValue
    );

    let ctx = parse(json!({"@version": 1.1})).await;
    assert_eq!(ctx.version(), Some(1.1));
}

#[async_std::test]
async fn language_tags_are_lowercased_in_legacy_mode() {
    let context = json!({"@language": "en-GB", "a": {"@id": "http://ex.org/a", "@language": "NL"}});

    let modern = parse(context.clone()).await;
    assert_eq!(modern.language(), Some("en-GB"));

    let legacy = ParseOptions {
        processing_mode: ProcessingMode::JsonLd10,
        ..ParseOptions::default()
    };
    let ctx = parser().parse(&context, &legacy).await.unwrap();
    assert_eq!(ctx.language(), Some("en-gb"));
    assert_eq!(
        serde_json::to_value(ctx.get("a").unwrap()).unwrap(),
        json!({"@id": "http://ex.org/a", "@language": "nl"})
    );
}

#[async_std::test]
async fn invalid_scoped_contexts_are_reported() {
    let err = parser()
        .parse(
            &json!({"a": {"@id": "http://ex.org/a", "@context": {"b": {"@id": 5}}}}),
            &ParseOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidScopedContext);

    let ctx = parse(json!({
        "@vocab": "http://ex.org/",
        "a": {"@context": {"b": "http://ex.org/b"}}
    }))
    .await;
    match ctx.get("a") {
        Some(TermDefinition::Expanded(def)) => {
            assert_eq!(def.context, Some(json!({"b": "http://ex.org/b"})))
        }
        other => panic!("unexpected definition {:?}", other),
    }
}

#[async_std::test]
async fn normalized_contexts_serialize() {
    let ctx = parse(json!({
        "@vocab": "http://vocab.org/",
        "ex": "http://ex.org/",
        "p": {"@id": "ex:p", "@container": "@list"}
    }))
    .await;

    assert_eq!(
        ctx.to_json(),
        json!({
            "@vocab": "http://vocab.org/",
            "ex": "http://ex.org/",
            "p": {"@id": "http://ex.org/p", "@container": "@list"}
        })
    );
}
