//! Error types for the weft crates.

/// Errors surfaced while driving a chunk pipeline.
///
/// None of these are retried here. Retrying is a transport concern; a
/// pipeline that yields an error terminates.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The upstream chunk source failed instead of ending normally.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// A part kind with no chunk encoding reached the serializer.
    #[error("no chunk encoding for part type `{0}`")]
    UnserializableType(String),
}

/// Errors from decoding the JSON wire format.
///
/// An unrecognized type tag is deliberately *not* an error: the decoder
/// produces [`Chunk::Unknown`](crate::Chunk::Unknown) so foreign chunks pass
/// through intact.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A required field was missing from a chunk or part object.
    #[error("missing field `{field}` in `{kind}`")]
    MissingField {
        /// The wire type tag of the offending object.
        kind: String,
        /// The missing field name.
        field: &'static str,
    },
    /// The value was not a JSON object, or had no `type` tag.
    #[error("malformed wire value: {0}")]
    Malformed(String),
}
