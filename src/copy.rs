//! Field-by-field copy between two record types.

use facet_core::{Facet, Field, Shape};
use facet_reflect::Peek;
use serde_json::{Map, Value};

use crate::{
    Result,
    access::record_fields,
    deserialize::Engine,
    kind::{ScalarFamily, ShapeKind},
    options::Options,
    splice,
};

/// How many destination fields were copied from the source, and how many
/// were left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Fields copied.
    pub hit: usize,
    /// Fields missing from the source, `None` there, or of an incompatible kind.
    pub miss: usize,
}

enum Compat {
    Value,
    Record(&'static [Field], &'static [Field]),
    Incompatible,
}

fn unwrap_option(shape: &'static Shape) -> &'static Shape {
    match ShapeKind::of(shape) {
        ShapeKind::Option(inner) => unwrap_option(inner),
        _ => shape,
    }
}

fn compatibility(dst: &'static Shape, src: &'static Shape) -> Compat {
    let (dst, src) = (unwrap_option(dst), unwrap_option(src));
    match (ShapeKind::of(dst), ShapeKind::of(src)) {
        (ShapeKind::Record(d), ShapeKind::Record(s)) => Compat::Record(d, s),
        (ShapeKind::Scalar(d), ShapeKind::Scalar(s))
            if d.family() == s.family() && d.family() != ScalarFamily::Other =>
        {
            Compat::Value
        }
        (ShapeKind::Timestamp, ShapeKind::Timestamp) => Compat::Value,
        // Collections, enums and wrappers only copy between identical types.
        _ if dst.id == src.id => Compat::Value,
        _ => Compat::Incompatible,
    }
}

/// Copy every field of `src` into the field of `dst` with the same declared
/// name, when their kinds are compatible.
///
/// Signed integers copy into signed integers of any width, unsigned into
/// unsigned, floats into floats; strings, booleans and timestamps copy into
/// their own kind. Nested records are copied field by field. Collections,
/// enums and other values copy only between identical types. Fields that are
/// absent from `src`, `None` there, or incompatible keep their current value
/// in `dst`.
///
/// ```
/// use facet::Facet;
/// use facet_deepcopy::{Options, copy_struct};
///
/// #[derive(Facet)]
/// struct Wide {
///     num: i64,
///     label: String,
/// }
///
/// #[derive(Facet)]
/// struct Narrow {
///     num: i32,
///     label: u8,
/// }
///
/// let mut dst = Narrow { num: 0, label: 7 };
/// let src = Wide { num: 123, label: "x".into() };
/// let stats = copy_struct(&mut dst, &src, &Options::default()).unwrap();
/// assert_eq!(dst.num, 123);
/// assert_eq!(dst.label, 7);
/// assert_eq!((stats.hit, stats.miss), (1, 1));
/// ```
pub fn copy_struct<D, S>(dst: &mut D, src: &S, options: &Options) -> Result<CopyStats>
where
    D: Facet<'static>,
    S: Facet<'static>,
{
    let snapshot_options = options.snapshot();
    let mut engine = Engine::new(&snapshot_options);
    let mut stats = CopyStats::default();
    let mut copied = Vec::new();

    let (dst_fields, merged) = {
        let dst_peek = Peek::new(&*dst);
        let src_peek = Peek::new(src);
        let dst_fields = record_fields(&dst_peek)?;
        let src_fields = record_fields(&src_peek)?;
        let mut dst_map = as_map(engine.encode_value(dst_peek, 0)?);
        let src_map = as_map(engine.encode_value(src_peek, 0)?);
        merge(
            &mut engine,
            Side {
                fields: dst_fields,
                map: &mut dst_map,
            },
            src_fields,
            &src_map,
            &[],
            &mut copied,
            &mut stats,
        );
        (dst_fields, dst_map)
    };

    let spans = copied
        .iter()
        .map(|path| splice::span(dst_fields, path))
        .collect::<Result<Vec<_>>>()?;
    let mut fresh: D = engine.build(&Value::Object(merged))?;
    splice::exchange(dst, &mut fresh, &spans);

    log::debug!("Copied {} fields, missed {}", stats.hit, stats.miss);
    options.trace(0, || format!("copy: hit {} miss {}", stats.hit, stats.miss));
    Ok(stats)
}

fn as_map(value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// The destination record being merged into.
struct Side<'m> {
    fields: &'static [Field],
    map: &'m mut Map<String, Value>,
}

/// Overwrite entries of the destination map with the compatible entries of
/// `src_map`, recording the path of every field that was written.
///
/// Both maps are keyed by declared field name, with embedded records
/// promoted into their parent.
fn merge(
    engine: &mut Engine<'_>,
    dst: Side<'_>,
    src_fields: &'static [Field],
    src_map: &Map<String, Value>,
    prefix: &[usize],
    copied: &mut Vec<Vec<usize>>,
    stats: &mut CopyStats,
) {
    let dst_layout = engine.layout(dst.fields);
    let src_layout = engine.layout(src_fields);
    let src_leaves = src_layout.leaves();

    for leaf in dst_layout.leaves() {
        let name = leaf.field.name;
        let path: Vec<usize> = prefix.iter().chain(&leaf.path).copied().collect();
        let source = src_leaves
            .iter()
            .find(|s| s.field.name == name)
            .and_then(|s| Some((s, src_map.get(s.field.name)?)));
        let Some((src_leaf, src_value)) = source else {
            stats.miss += 1;
            continue;
        };

        match compatibility((leaf.field.shape)(), (src_leaf.field.shape)()) {
            Compat::Record(dst_inner, src_inner) => {
                let Value::Object(src_sub) = src_value else {
                    stats.miss += 1;
                    continue;
                };
                let slot = dst
                    .map
                    .entry(name)
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                let Value::Object(dst_sub) = slot else {
                    continue;
                };
                let side = Side {
                    fields: dst_inner,
                    map: dst_sub,
                };
                if let ShapeKind::Record(_) = ShapeKind::of((leaf.field.shape)()) {
                    merge(engine, side, src_inner, src_sub, &path, copied, stats);
                } else {
                    // Behind an option the record moves as one field.
                    let mut inner = Vec::new();
                    merge(engine, side, src_inner, src_sub, &[], &mut inner, stats);
                    if !inner.is_empty() {
                        copied.push(path);
                    }
                }
            }
            Compat::Value => {
                dst.map.insert(name.to_string(), src_value.clone());
                copied.push(path);
                stats.hit += 1;
            }
            Compat::Incompatible => {
                log::trace!("Field '{name}' has incompatible kinds");
                stats.miss += 1;
            }
        }
    }
}
