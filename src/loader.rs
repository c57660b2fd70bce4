//! Document loaders for remote contexts.

use futures::future::{self, BoxFuture, FutureExt};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use url::Url;

use crate::error::{ContextError, ErrorCode};
use crate::helper::resolve_iri;
use crate::DocumentLoader;

/// Link relation that points from a plain JSON document to its context.
pub const CONTEXT_LINK_REL: &str = "http://www.w3.org/ns/json-ld#context";

const ACCEPT: &str = "application/ld+json, application/json;q=0.9, */*;q=0.1";
const MAX_ALTERNATES: usize = 8;

lazy_static! {
    static ref LINK: Regex = Regex::new(r"<([^>]*)>([^,<]*)").unwrap();
    static ref LINK_PARAM: Regex =
        Regex::new(r#";\s*([A-Za-z\-]+)\s*=\s*(?:"([^"]*)"|([^;\s]*))"#).unwrap();
}

fn loading_failed(url: &str, reason: impl Display) -> ContextError {
    ContextError::new(
        ErrorCode::LoadingDocumentFailed,
        format!("Failed to load document {}: {}", url, reason),
    )
}

/// Serves documents from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: HashMap<String, Value>,
}

impl StaticLoader {
    pub fn new() -> StaticLoader {
        StaticLoader::default()
    }

    pub fn insert<S: Into<String>>(&mut self, url: S, document: Value) {
        self.documents.insert(url.into(), document);
    }

    pub fn with<S: Into<String>>(mut self, url: S, document: Value) -> StaticLoader {
        self.insert(url, document);
        self
    }
}

impl DocumentLoader for StaticLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, ContextError>> {
        let result = self
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| loading_failed(url, "no such document"));

        future::ready(result).boxed()
    }
}

/// Loads `file:` IRIs from disk and `http(s):` IRIs over the network.
#[derive(Debug, Clone, Default)]
pub struct DefaultLoader;

impl DefaultLoader {
    pub fn new() -> DefaultLoader {
        DefaultLoader
    }
}

impl DocumentLoader for DefaultLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, ContextError>> {
        async move {
            let parsed = Url::parse(url).map_err(|e| loading_failed(url, e))?;

            match parsed.scheme() {
                "file" => {
                    let path = parsed
                        .to_file_path()
                        .map_err(|_| loading_failed(url, "not a local path"))?;
                    let text = async_std::fs::read_to_string(&path)
                        .await
                        .map_err(|e| loading_failed(url, e))?;
                    serde_json::from_str(&text).map_err(|e| loading_failed(url, e))
                }
                "http" | "https" => {
                    let owned = url.to_owned();
                    async_std::task::spawn_blocking(move || fetch(&owned, MAX_ALTERNATES)).await
                }
                scheme => Err(loading_failed(url, format!("unsupported scheme {}", scheme))),
            }
        }
        .boxed()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Link {
    href: String,
    rel: Vec<String>,
    media_type: Option<String>,
}

impl Link {
    fn has_rel(&self, rel: &str) -> bool {
        self.rel.iter().any(|r| r == rel)
    }
}

fn parse_link_header(header: &str) -> Vec<Link> {
    LINK.captures_iter(header)
        .map(|link| {
            let mut parsed = Link {
                href: link[1].trim().to_owned(),
                rel: Vec::new(),
                media_type: None,
            };

            for param in LINK_PARAM.captures_iter(&link[2]) {
                let value = param
                    .get(2)
                    .or_else(|| param.get(3))
                    .map_or("", |m| m.as_str());

                match param[1].to_ascii_lowercase().as_str() {
                    "rel" => parsed.rel = value.split_whitespace().map(str::to_owned).collect(),
                    "type" => parsed.media_type = Some(value.to_owned()),
                    _ => {}
                }
            }

            parsed
        })
        .collect()
}

fn is_json_media_type(media_type: &str) -> bool {
    media_type == "application/json"
        || media_type == "application/ld+json"
        || media_type.ends_with("+json")
}

fn fetch(url: &str, alternates_left: usize) -> Result<Value, ContextError> {
    let mut response = ureq::get(url)
        .header("Accept", ACCEPT)
        .call()
        .map_err(|e| loading_failed(url, e))?;

    let media_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let links: Vec<Link> = response
        .headers()
        .get_all("link")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(parse_link_header)
        .collect();

    if !is_json_media_type(&media_type) {
        let alternate = links.iter().find(|link| {
            link.has_rel("alternate") && link.media_type.as_deref() == Some("application/ld+json")
        });

        return match alternate {
            Some(link) if alternates_left > 0 => {
                let target = resolve_iri(&link.href, Some(url));
                log::debug!("following alternate link from {} to {}", url, target);
                fetch(&target, alternates_left - 1)
            }
            _ => Err(loading_failed(
                url,
                format!("unsupported media type '{}'", media_type),
            )),
        };
    }

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| loading_failed(url, e))?;
    let mut document: Value = serde_json::from_str(&body).map_err(|e| loading_failed(url, e))?;

    if media_type != "application/ld+json" {
        let contexts: Vec<&Link> = links
            .iter()
            .filter(|link| link.has_rel(CONTEXT_LINK_REL))
            .collect();

        if contexts.len() > 1 {
            return Err(ContextError::new(
                ErrorCode::MultipleContextLinkHeaders,
                format!("Multiple JSON-LD context link headers were found on {}", url),
            ));
        }

        if let (Some(link), Value::Object(map)) = (contexts.first(), &mut document) {
            if !map.contains_key("@context") {
                map.insert(
                    "@context".to_owned(),
                    Value::String(resolve_iri(&link.href, Some(url))),
                );
            }
        }
    }

    Ok(document)
}
