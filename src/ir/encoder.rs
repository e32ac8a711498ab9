use serde::Serialize;
use serde::ser::Error as _;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter, Serializer};
use tracing::{debug, trace};

use super::guard::{self, DEFAULT_MAX_DEPTH};
use crate::error::EncodingError;

/// Layout of the produced text. Both layouts carry the same structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Single line, no insignificant whitespace.
    Compact,
    /// One field or element per line, nested levels indented by `indent` spaces.
    Pretty { indent: usize },
}

/// Configuration of the structural encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub style: TextStyle,
    /// Maximum number of guarded child links between the root and any node.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            style: TextStyle::Compact,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EncodeOptions {
    pub fn compact() -> Self {
        Self::default()
    }

    pub fn pretty(indent: usize) -> Self {
        EncodeOptions {
            style: TextStyle::Pretty { indent },
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Encodes any serializable value into structured JSON text.
///
/// Struct fields are written in declaration order, sequences in their own
/// order. The traversal runs under the guard, so a cyclic or overly deep
/// value fails with a typed error instead of exhausting the stack.
///
/// # Arguments
/// * `value` - The value to encode.
/// * `options` - Layout and depth limit.
///
/// # Returns
/// The complete text, or the error that stopped the encoding. Partial text
/// is never returned.
pub fn encode<T: Serialize + ?Sized>(value: &T, options: &EncodeOptions) -> Result<String, EncodingError> {
    let mut buf = Vec::with_capacity(128);
    let (result, trip) = guard::scoped(options.max_depth, || match options.style {
        TextStyle::Compact => write_with(&mut buf, CompactFormatter, value),
        TextStyle::Pretty { indent } => {
            let indent = " ".repeat(indent);
            write_with(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()), value)
        }
    });

    if let Err(err) = result {
        return Err(match trip {
            Some(trip) => trip.into(),
            None => {
                debug!("Structural encoding failed: {}", err);
                EncodingError::Unsupported(err)
            }
        });
    }

    let text = String::from_utf8(buf).map_err(|e| EncodingError::Unsupported(serde_json::Error::custom(e)))?;
    trace!("Encoded value ({:?}, {} bytes)", options.style, text.len());
    Ok(text)
}

fn write_with<F, T>(buf: &mut Vec<u8>, formatter: F, value: &T) -> Result<(), serde_json::Error>
where
    F: Formatter,
    T: Serialize + ?Sized,
{
    let mut serializer = Serializer::with_formatter(buf, formatter);
    value.serialize(&mut serializer)
}
