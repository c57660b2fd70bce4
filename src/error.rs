use std::error::Error;
use std::fmt;

/// The closed set of conditions raised while resolving a context or
/// expanding a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    LoadingDocumentFailed,
    LoadingRemoteContextFailed,
    InvalidRemoteContext,
    RecursiveContextInclusion,
    MultipleContextLinkHeaders,
    InvalidLocalContext,
    InvalidBaseIri,
    InvalidVocabMapping,
    InvalidDefaultLanguage,
    InvalidVersionValue,
    ProcessingModeConflict,
    InvalidContextEntry,
    InvalidContextNullification,
    InvalidBaseDirection,
    InvalidPropagateValue,
    InvalidImportValue,
    KeywordRedefinition,
    InvalidTermDefinition,
    InvalidReverseProperty,
    InvalidReverseValue,
    InvalidIriMapping,
    CyclicIriMapping,
    InvalidKeywordAlias,
    InvalidTypeMapping,
    InvalidLanguageMapping,
    InvalidContainerMapping,
    InvalidPrefixValue,
    InvalidProtectedValue,
    InvalidNestValue,
    InvalidScopedContext,
    ProtectedTermRedefinition,
}

impl ErrorCode {
    /// The stable string form of this code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::LoadingDocumentFailed => "loading document failed",
            ErrorCode::LoadingRemoteContextFailed => "loading remote context failed",
            ErrorCode::InvalidRemoteContext => "invalid remote context",
            ErrorCode::RecursiveContextInclusion => "recursive context inclusion",
            ErrorCode::MultipleContextLinkHeaders => "multiple context link headers",
            ErrorCode::InvalidLocalContext => "invalid local context",
            ErrorCode::InvalidBaseIri => "invalid base IRI",
            ErrorCode::InvalidVocabMapping => "invalid vocab mapping",
            ErrorCode::InvalidDefaultLanguage => "invalid default language",
            ErrorCode::InvalidVersionValue => "invalid @version value",
            ErrorCode::ProcessingModeConflict => "processing mode conflict",
            ErrorCode::InvalidContextEntry => "invalid context entry",
            ErrorCode::InvalidContextNullification => "invalid context nullification",
            ErrorCode::InvalidBaseDirection => "invalid base direction",
            ErrorCode::InvalidPropagateValue => "invalid @propagate value",
            ErrorCode::InvalidImportValue => "invalid @import value",
            ErrorCode::KeywordRedefinition => "keyword redefinition",
            ErrorCode::InvalidTermDefinition => "invalid term definition",
            ErrorCode::InvalidReverseProperty => "invalid reverse property",
            ErrorCode::InvalidReverseValue => "invalid @reverse value",
            ErrorCode::InvalidIriMapping => "invalid IRI mapping",
            ErrorCode::CyclicIriMapping => "cyclic IRI mapping",
            ErrorCode::InvalidKeywordAlias => "invalid keyword alias",
            ErrorCode::InvalidTypeMapping => "invalid type mapping",
            ErrorCode::InvalidLanguageMapping => "invalid language mapping",
            ErrorCode::InvalidContainerMapping => "invalid container mapping",
            ErrorCode::InvalidPrefixValue => "invalid @prefix value",
            ErrorCode::InvalidProtectedValue => "invalid @protected value",
            ErrorCode::InvalidNestValue => "invalid @nest value",
            ErrorCode::InvalidScopedContext => "invalid scoped context",
            ErrorCode::ProtectedTermRedefinition => "protected term redefinition",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while processing a context, tagged with its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextError {
    code: ErrorCode,
    message: String,
}

impl ContextError {
    pub fn new<M: Into<String>>(code: ErrorCode, message: M) -> ContextError {
        ContextError {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl Error for ContextError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_message_and_code() {
        let err = ContextError::new(ErrorCode::InvalidVocabMapping, "Relative vocabs are not allowed");
        assert_eq!(
            err.to_string(),
            "Relative vocabs are not allowed (invalid vocab mapping)"
        );
        assert_eq!(err.code(), ErrorCode::InvalidVocabMapping);
        assert_eq!(err.message(), "Relative vocabs are not allowed");
    }

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(ErrorCode::InvalidIriMapping.as_str(), "invalid IRI mapping");
        assert_eq!(
            ErrorCode::ProtectedTermRedefinition.to_string(),
            "protected term redefinition"
        );
    }
}
