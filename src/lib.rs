#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::{
    error::Error,
    fmt::{self, Display},
};

use facet_core::{Facet, Shape};
use facet_reflect::{Peek, ReflectError};
use serde_json::{Map, Value};

mod access;
pub mod coerce;
mod copy;
mod deserialize;
mod kind;
mod options;
mod resolve;
mod serialize;
mod splice;
mod timestamp;

pub use access::{field_keys, field_values, get_field, non_zero_fields, set_field, zero_fields};
pub use copy::{CopyStats, copy_struct};
pub use options::{DEFAULT_MAX_DEPTH, DEFAULT_TIME_FORMAT, DiagnosticSink, Naming, Options, TimeRepr};
pub use resolve::{FieldIdentity, resolve_field, resolve_fields};

use deserialize::Engine;
use kind::ShapeKind;

/// Error type for conversions in either direction.
#[derive(Debug)]
pub struct ConvertError {
    kind: ConvertErrorKind,
}

impl ConvertError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &ConvertErrorKind {
        &self.kind
    }
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "{kind}")
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ConvertErrorKind::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl<K: Into<ConvertErrorKind>> From<K> for ConvertError {
    fn from(value: K) -> Self {
        let kind = value.into();
        ConvertError { kind }
    }
}

/// Detailed classification of conversion errors.
///
/// A value of the wrong shape inside the tree is never an error: it decodes
/// as the destination's default.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConvertErrorKind {
    /// The input bytes are not a valid document.
    Parse(serde_json::Error),
    /// Error from the reflection system.
    Reflect(ReflectError),
    /// The destination could not be allocated.
    Unsettable(String),
    /// The operation needs a record (or, for encoding, a map or list).
    NotARecord(String),
    /// The value nests deeper than [`Options::max_depth`].
    DepthLimitExceeded(usize),
    /// A field received no value and its type has no default.
    MissingField(String),
    /// An enum value whose active variant could not be determined.
    UnknownVariant(String),
}

impl Display for ConvertErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertErrorKind::Parse(e) => write!(f, "{e}"),
            ConvertErrorKind::Reflect(e) => write!(f, "{e}"),
            ConvertErrorKind::Unsettable(msg) => write!(f, "target cannot be set: {msg}"),
            ConvertErrorKind::NotARecord(shape) => write!(f, "expected a record, found {shape}"),
            ConvertErrorKind::DepthLimitExceeded(max) => {
                write!(f, "value nests deeper than {max} levels")
            }
            ConvertErrorKind::MissingField(msg) => write!(f, "missing field without default: {msg}"),
            ConvertErrorKind::UnknownVariant(msg) => write!(f, "unknown enum variant: {msg}"),
        }
    }
}

impl From<serde_json::Error> for ConvertErrorKind {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<ReflectError> for ConvertErrorKind {
    fn from(value: ReflectError) -> Self {
        Self::Reflect(value)
    }
}

type Result<T> = std::result::Result<T, ConvertError>;

/// Decode a generic value into a fresh `T`.
///
/// ```
/// use facet::Facet;
/// use facet_deepcopy::{Options, from_value};
/// use serde_json::json;
///
/// #[derive(Facet, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let point: Point = from_value(&json!({ "x": "3", "y": 4.9 }), &Options::default()).unwrap();
/// assert_eq!(point, Point { x: 3, y: 4 });
/// ```
pub fn from_value<'facet, T: Facet<'facet>>(value: &Value, options: &Options) -> Result<T> {
    log::trace!("Entering `from_value`");
    Engine::new(options).build(value)
}

/// Parse a JSON document and decode it into a fresh `T`.
pub fn from_slice<'facet, T: Facet<'facet>>(bytes: &[u8], options: &Options) -> Result<T> {
    let value: Value = serde_json::from_slice(bytes)?;
    log::trace!("Document parsed");
    from_value(&value, options)
}

/// Parse a JSON document and decode it into a fresh `T`.
pub fn from_str<'facet, T: Facet<'facet>>(text: &str, options: &Options) -> Result<T> {
    let value: Value = serde_json::from_str(text)?;
    log::trace!("Document parsed");
    from_value(&value, options)
}

/// Decode `value` over `target`.
///
/// For records only the fields whose keys are present (and not null) in
/// `value` are written; every other field keeps its current value. Nested
/// records are merged the same way. Other kinds are replaced whole. The new
/// values are built completely before any of them reaches `target`, so on
/// error `target` is left as it was.
///
/// ```
/// use facet::Facet;
/// use facet_deepcopy::{Options, decode_into};
/// use serde_json::json;
///
/// #[derive(Facet)]
/// struct Pair {
///     a: i32,
///     b: i32,
/// }
///
/// let mut pair = Pair { a: 1, b: 2 };
/// decode_into(&mut pair, &json!({ "a": 10 }), &Options::default()).unwrap();
/// assert_eq!((pair.a, pair.b), (10, 2));
/// ```
pub fn decode_into<'facet, T: Facet<'facet>>(
    target: &mut T,
    value: &Value,
    options: &Options,
) -> Result<()> {
    let mut engine = Engine::new(options);
    let mut fresh: T = engine.build(value)?;
    let ShapeKind::Record(fields) = ShapeKind::of(T::SHAPE) else {
        *target = fresh;
        return Ok(());
    };

    let empty = Map::new();
    let mut written = Vec::new();
    engine.written_paths(
        fields,
        value.as_object().unwrap_or(&empty),
        &mut Vec::new(),
        &mut written,
    );
    let spans = written
        .iter()
        .map(|path| splice::span(fields, path))
        .collect::<Result<Vec<_>>>()?;
    log::trace!("Writing {} fields in place", spans.len());
    splice::exchange(target, &mut fresh, &spans);
    Ok(())
}

/// Encode a record, map or list into a generic value.
///
/// Any other top-level kind is rejected with [`ConvertErrorKind::NotARecord`].
pub fn to_value<T: Facet<'static>>(value: &T, options: &Options) -> Result<Value> {
    log::trace!("Entering `to_value`");
    let peek = Peek::new(value);
    let shape = peek.shape();
    match Engine::new(options).encode_value(peek, 0)? {
        Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(value),
        _ => Err(not_a_record(shape)),
    }
}

/// Encode a record or map into a keyed collection.
///
/// ```
/// use facet::Facet;
/// use facet_deepcopy::{Options, to_map};
/// use serde_json::json;
///
/// #[derive(Facet)]
/// struct Account {
///     #[facet(json = "id")]
///     account_id: u64,
///     #[facet(json = "-")]
///     secret: String,
/// }
///
/// let account = Account { account_id: 7, secret: "hunter2".into() };
/// let map = to_map(&account, &Options::default()).unwrap();
/// assert_eq!(serde_json::Value::Object(map), json!({ "id": 7 }));
/// ```
pub fn to_map<T: Facet<'static>>(value: &T, options: &Options) -> Result<Map<String, Value>> {
    log::trace!("Entering `to_map`");
    let peek = Peek::new(value);
    let shape = peek.shape();
    match Engine::new(options).encode_value(peek, 0)? {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(not_a_record(shape)),
    }
}

fn not_a_record(shape: &Shape) -> ConvertError {
    ConvertErrorKind::NotARecord(shape.to_string()).into()
}
