use thiserror::Error;

/// Failures of template generation.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The lookup handle was not supplied. Fatal for this pass, retried
    /// on the next trigger.
    #[error("lookup context not available for template generation")]
    ContextUnavailable,

    /// Embedded serialized text (e.g. an inline policy document) failed
    /// to parse. Retrying will not fix bad input; surfaced to the owner
    /// as a status condition.
    #[error("malformed embedded document in field {field}: {source}")]
    MalformedEmbeddedDocument {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// Internal serialization failure. Always retryable.
    #[error("template serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A rule named a source field whose shape does not match its
    /// translation (e.g. an element-wise rule over a non-array).
    #[error("field {field} has unexpected shape for {rule} rule")]
    UnexpectedShape { field: String, rule: &'static str },
}
