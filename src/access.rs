//! Reading and writing single fields, and listing fields by state.

use facet_core::{Facet, Field};
use facet_reflect::Peek;
use serde_json::{Map, Value};

use crate::{
    ConvertErrorKind, Result,
    deserialize::{Engine, Patch},
    kind::ShapeKind,
    options::Options,
    resolve::{Leaf, RecordLayout},
    serialize::{empty_for_omission, field_peeks, is_zero},
    splice,
};

/// The fields of a record shape, or [`ConvertErrorKind::NotARecord`].
pub(crate) fn record_fields(peek: &Peek<'_, '_>) -> Result<&'static [Field]> {
    match ShapeKind::of(peek.shape()) {
        ShapeKind::Record(fields) => Ok(fields),
        _ => Err(ConvertErrorKind::NotARecord(peek.shape().to_string()).into()),
    }
}

/// Follow `path` through embedded records down to a field value.
fn peek_at<'mem, 'facet>(peek: Peek<'mem, 'facet>, path: &[usize]) -> Result<Peek<'mem, 'facet>> {
    let mut current = peek;
    for &index in path {
        let shape = current.shape();
        current = field_peeks(current)?
            .into_iter()
            .nth(index)
            .ok_or_else(|| ConvertErrorKind::NotARecord(shape.to_string()))?;
    }
    Ok(current)
}

/// Every field of `value` with its current value, embedded records expanded.
fn with_leaves<T, R>(
    value: &T,
    options: &Options,
    mut each: impl FnMut(&mut Engine<'_>, &Leaf<'_>, Peek<'_, '_>) -> Result<Option<R>>,
) -> Result<Vec<R>>
where
    T: Facet<'static>,
{
    let peek = Peek::new(value);
    let fields = record_fields(&peek)?;
    let mut engine = Engine::new(options);
    let layout = engine.layout(fields);
    let mut out = Vec::new();
    for leaf in layout.leaves() {
        let field_peek = peek_at(peek.clone(), &leaf.path)?;
        if let Some(item) = each(&mut engine, &leaf, field_peek)? {
            out.push(item);
        }
    }
    Ok(out)
}

/// Read one field of a record as a generic value.
///
/// `name` may be the declared field name, the resolved key, or the
/// small-camel form of the declared name, tried in that order. Fields of
/// embedded records are found by their own names. Returns `Ok(None)` when no
/// field matches; a `None` optional reads as [`Value::Null`].
///
/// ```
/// use facet::Facet;
/// use facet_deepcopy::{Options, get_field};
/// use serde_json::json;
///
/// #[derive(Facet)]
/// struct User {
///     #[facet(json = "user_name")]
///     name: String,
/// }
///
/// let user = User { name: "ada".into() };
/// let options = Options::default();
/// assert_eq!(get_field(&user, "name", &options).unwrap(), Some(json!("ada")));
/// assert_eq!(get_field(&user, "user_name", &options).unwrap(), Some(json!("ada")));
/// assert_eq!(get_field(&user, "age", &options).unwrap(), None);
/// ```
pub fn get_field<T: Facet<'static>>(
    value: &T,
    name: &str,
    options: &Options,
) -> Result<Option<Value>> {
    let peek = Peek::new(value);
    let fields = record_fields(&peek)?;
    let mut engine = Engine::new(options);
    let layout = engine.layout(fields);
    let Some(leaf) = layout.lookup(name) else {
        log::debug!("No field matches '{name}'");
        return Ok(None);
    };
    let field_peek = peek_at(peek, &leaf.path)?;
    Ok(Some(
        engine.encode_value(field_peek, 1)?.unwrap_or(Value::Null),
    ))
}

/// Decode `value` into one field of `target`, found the same way as
/// [`get_field`]. Every other field keeps its current value.
///
/// Returns `Ok(false)` and leaves `target` untouched when no field matches.
/// On error `target` is untouched as well.
pub fn set_field<T: Facet<'static>>(
    target: &mut T,
    name: &str,
    value: &Value,
    options: &Options,
) -> Result<bool> {
    let snapshot_options = options.snapshot();
    let mut snapshot = Engine::new(&snapshot_options);
    let mut engine = Engine::new(options);

    let (path, span, current) = {
        let peek = Peek::new(&*target);
        let fields = record_fields(&peek)?;
        let layout = engine.layout(fields);
        let Some(path) = lookup_path(&layout, name) else {
            log::debug!("No field matches '{name}'");
            return Ok(false);
        };
        let span = splice::span(fields, &path)?;
        // The rest of the replacement is discarded; the snapshot only has
        // to make it buildable.
        let current = match snapshot.encode_value(peek, 0)? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        (path, span, current)
    };

    let patch = Patch {
        path: &path,
        value,
        engine: &mut engine,
    };
    let mut fresh: T = snapshot.build_patched(&Value::Object(current), Some(patch))?;
    splice::exchange(target, &mut fresh, &[span]);
    Ok(true)
}

fn lookup_path(layout: &RecordLayout, name: &str) -> Option<Vec<usize>> {
    layout.lookup(name).map(|leaf| leaf.path)
}

/// Resolved keys of the fields that are not excluded, in declaration order.
pub fn field_keys<T: Facet<'static>>(value: &T, options: &Options) -> Result<Vec<String>> {
    with_leaves(value, options, |_, leaf, _| {
        Ok((!leaf.identity.exclude).then(|| leaf.identity.key.clone()))
    })
}

/// Encoded values of the fields that are not excluded, in the order of
/// [`field_keys`]. Zero values of omit-empty fields are skipped.
pub fn field_values<T: Facet<'static>>(value: &T, options: &Options) -> Result<Vec<Value>> {
    with_leaves(value, options, |engine, leaf, peek| {
        let skip = leaf.identity.exclude
            || (leaf.identity.omit_empty && empty_for_omission(peek.clone())?);
        if skip {
            return Ok(None);
        }
        Ok(Some(engine.encode_value(peek, 1)?.unwrap_or(Value::Null)))
    })
}

/// Resolved keys of the fields currently holding their zero value.
pub fn zero_fields<T: Facet<'static>>(value: &T, options: &Options) -> Result<Vec<String>> {
    with_leaves(value, options, |_, leaf, peek| {
        Ok(is_zero(peek)?.then(|| leaf.identity.key.clone()))
    })
}

/// Declared names of the fields currently holding a non-zero value.
pub fn non_zero_fields<T: Facet<'static>>(value: &T) -> Result<Vec<&'static str>> {
    with_leaves(value, &Options::default(), |_, leaf, peek| {
        Ok((!is_zero(peek)?).then_some(leaf.field.name))
    })
}
