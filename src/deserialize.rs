use std::rc::Rc;

use facet_core::{Facet, Field, Type, UserType, Variant};
use facet_reflect::Partial;
use serde_json::{Map, Value};

use crate::{
    ConvertErrorKind, Result, coerce,
    kind::{ScalarKind, ShapeKind},
    options::Options,
    resolve::{LayoutCache, LayoutEntry, RecordLayout},
    timestamp,
};

/// One recursive pass over a value, with the options of the call and the
/// record layouts resolved so far.
pub(crate) struct Engine<'o> {
    pub(crate) options: &'o Options,
    layouts: LayoutCache,
}

/// Replaces the input of one field during a record decode.
///
/// `path` walks through embedded records down to the field; the field is
/// decoded from `value` by `engine` instead of the engine running the pass.
pub(crate) struct Patch<'p, 'u> {
    pub(crate) path: &'p [usize],
    pub(crate) value: &'p Value,
    pub(crate) engine: &'p mut Engine<'u>,
}

impl<'o> Engine<'o> {
    pub(crate) fn new(options: &'o Options) -> Self {
        Self {
            options,
            layouts: LayoutCache::default(),
        }
    }

    pub(crate) fn layout(&mut self, fields: &'static [Field]) -> Rc<RecordLayout> {
        self.layouts.layout(fields, self.options)
    }

    pub(crate) fn enter(&self, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            log::debug!("Nesting depth {depth} exceeds {}", self.options.max_depth);
            return Err(ConvertErrorKind::DepthLimitExceeded(self.options.max_depth).into());
        }
        Ok(())
    }

    /// Build a fresh `T` from `value`.
    pub(crate) fn build<'facet, T: Facet<'facet>>(&mut self, value: &Value) -> Result<T> {
        self.build_patched(value, None)
    }

    /// Build a fresh record `T` from `value`, letting `patch` supply one field.
    pub(crate) fn build_patched<'facet, T: Facet<'facet>>(
        &mut self,
        value: &Value,
        patch: Option<Patch<'_, '_>>,
    ) -> Result<T> {
        let mut typed_partial = Partial::alloc::<T>()
            .map_err(|e| ConvertErrorKind::Unsettable(format!("{e:?}")))?;
        log::trace!(
            "Allocated WIP for type {}",
            typed_partial.inner_mut().shape()
        );

        {
            let partial = typed_partial.inner_mut();
            match patch {
                Some(patch) => {
                    let ShapeKind::Record(fields) = ShapeKind::of(partial.shape()) else {
                        return Err(ConvertErrorKind::NotARecord(partial.shape().to_string()).into());
                    };
                    let empty = Map::new();
                    let map = value.as_object().unwrap_or(&empty);
                    self.decode_record(partial, fields, map, 0, Some(patch))?;
                }
                None => self.decode_value(partial, value, 0)?,
            }
        }

        let boxed_value = typed_partial.build()?;
        log::trace!("WIP fully built");
        Ok(*boxed_value)
    }

    /// Decode `value` into the frame currently open in `partial`.
    pub(crate) fn decode_value<'facet>(
        &mut self,
        partial: &mut Partial<'facet>,
        value: &Value,
        depth: usize,
    ) -> Result<()> {
        self.enter(depth)?;
        let shape = partial.shape();
        let kind = ShapeKind::of(shape);
        self.options
            .trace(depth, || format!("decode {shape} from {}", brief(value)));

        match kind {
            ShapeKind::Timestamp => {
                partial.set(timestamp::decode(value, self.options))?;
            }
            ShapeKind::Option(_) => {
                if value.is_null() {
                    partial.set_default()?;
                } else {
                    partial.begin_some()?;
                    self.decode_value(partial, value, depth + 1)?;
                    partial.end()?;
                }
            }
            ShapeKind::Pointer => {
                partial.begin_smart_ptr()?;
                self.decode_value(partial, value, depth + 1)?;
                partial.end()?;
            }
            ShapeKind::Transparent => {
                partial.begin_inner()?;
                self.decode_value(partial, value, depth + 1)?;
                partial.end()?;
            }
            ShapeKind::Scalar(scalar) => decode_scalar(partial, scalar, value)?,
            ShapeKind::Record(fields) => {
                let empty = Map::new();
                let map = value.as_object().unwrap_or(&empty);
                self.decode_record(partial, fields, map, depth, None)?;
            }
            ShapeKind::Enum => self.decode_enum(partial, value, depth)?,
            ShapeKind::Map => match value {
                Value::Object(map) => {
                    partial.begin_map()?;
                    for (key, item) in map {
                        partial.begin_key()?;
                        self.decode_value(partial, &Value::String(key.clone()), depth + 1)?;
                        partial.end()?;
                        partial.begin_value()?;
                        self.decode_value(partial, item, depth + 1)?;
                        partial.end()?;
                    }
                }
                _ => {
                    partial.set_default()?;
                }
            },
            ShapeKind::List => match value {
                Value::Array(items) => {
                    partial.begin_list()?;
                    for item in items {
                        partial.begin_list_item()?;
                        self.decode_value(partial, item, depth + 1)?;
                        partial.end()?;
                    }
                }
                _ => {
                    partial.set_default()?;
                }
            },
            ShapeKind::Unsupported => {
                log::debug!("Leaving unsupported shape {shape} at its default");
                partial.set_default()?;
            }
        }
        Ok(())
    }

    /// Decode the fields of the struct (or enum variant) open in `partial`
    /// from `map`, then default every field nothing was decoded into.
    pub(crate) fn decode_record<'facet>(
        &mut self,
        partial: &mut Partial<'facet>,
        fields: &'static [Field],
        map: &Map<String, Value>,
        depth: usize,
        patch: Option<Patch<'_, '_>>,
    ) -> Result<()> {
        self.enter(depth)?;
        let layout = self.layout(fields);
        let mut patch = patch;

        for entry in &layout.entries {
            match entry {
                LayoutEntry::Field {
                    index,
                    field,
                    identity,
                } => {
                    if let Some(patch) = patch.take_if(|p| p.path == [*index]) {
                        self.options
                            .trace(depth, || format!("field {} replaced", field.name));
                        partial.begin_field(field.name)?;
                        patch.engine.decode_value(partial, patch.value, depth + 1)?;
                        partial.end()?;
                        continue;
                    }
                    if identity.exclude {
                        self.options
                            .trace(depth, || format!("field {} excluded", field.name));
                        continue;
                    }
                    match map.get(&identity.key) {
                        None | Some(Value::Null) => {
                            self.options
                                .trace(depth, || format!("key {:?} absent", identity.key));
                        }
                        Some(value) => {
                            partial.begin_field(field.name)?;
                            self.decode_value(partial, value, depth + 1)?;
                            partial.end()?;
                        }
                    }
                }
                LayoutEntry::Flatten {
                    index,
                    field,
                    layout,
                } => {
                    let inner = patch
                        .take_if(|p| p.path.first() == Some(index))
                        .map(|p| Patch {
                            path: &p.path[1..],
                            value: p.value,
                            engine: p.engine,
                        });
                    let ShapeKind::Record(inner_fields) = ShapeKind::of((field.shape)()) else {
                        continue;
                    };
                    self.options.trace(depth, || {
                        format!("embedded {} ({} entries)", field.name, layout.entries.len())
                    });
                    partial.begin_field(field.name)?;
                    self.decode_record(partial, inner_fields, map, depth + 1, inner)?;
                    partial.end()?;
                }
            }
        }

        self.fill_defaults(partial, fields, depth)
    }

    /// Collect the paths of the fields a record decode from `map` writes:
    /// keys present and not null, with nested records followed down to
    /// their own fields.
    pub(crate) fn written_paths(
        &mut self,
        fields: &'static [Field],
        map: &Map<String, Value>,
        prefix: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        let layout = self.layout(fields);
        for entry in &layout.entries {
            match entry {
                LayoutEntry::Field {
                    index,
                    field,
                    identity,
                } => {
                    if identity.exclude {
                        continue;
                    }
                    let Some(value) = map.get(&identity.key).filter(|v| !v.is_null()) else {
                        continue;
                    };
                    prefix.push(*index);
                    if let ShapeKind::Record(inner) = ShapeKind::of((field.shape)()) {
                        let empty = Map::new();
                        let sub = value.as_object().unwrap_or(&empty);
                        self.written_paths(inner, sub, prefix, out);
                    } else {
                        out.push(prefix.clone());
                    }
                    prefix.pop();
                }
                LayoutEntry::Flatten { index, field, .. } => {
                    let ShapeKind::Record(inner) = ShapeKind::of((field.shape)()) else {
                        continue;
                    };
                    prefix.push(*index);
                    self.written_paths(inner, map, prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    fn fill_defaults<'facet>(
        &mut self,
        partial: &mut Partial<'facet>,
        fields: &'static [Field],
        depth: usize,
    ) -> Result<()> {
        for (idx, field) in fields.iter().enumerate() {
            if partial.is_field_set(idx)? {
                continue;
            }
            if let ShapeKind::Record(inner) = ShapeKind::of((field.shape)()) {
                partial.begin_field(field.name)?;
                self.decode_record(partial, inner, &Map::new(), depth + 1, None)?;
                partial.end()?;
            } else {
                log::trace!("Setting unset field '{}' to default", field.name);
                partial
                    .set_nth_field_to_default(idx)
                    .map_err(|e| ConvertErrorKind::MissingField(format!("{}: {e}", field.name)))?;
            }
        }
        Ok(())
    }

    fn decode_enum<'facet>(
        &mut self,
        partial: &mut Partial<'facet>,
        value: &Value,
        depth: usize,
    ) -> Result<()> {
        let Type::User(UserType::Enum(enum_type)) = partial.shape().ty else {
            partial.set_default()?;
            return Ok(());
        };
        let find = |name: &str| -> Option<&'static Variant> {
            enum_type.variants.iter().find(|v| v.name == name)
        };

        match value {
            Value::String(name) => match find(name) {
                Some(variant) if variant.data.fields.is_empty() => {
                    partial.select_variant_named(variant.name)?;
                }
                _ => {
                    log::debug!("No unit variant named '{name}'");
                    partial.set_default()?;
                }
            },
            Value::Object(map) if map.len() == 1 => {
                let Some((name, payload)) = map.iter().next() else {
                    return Ok(());
                };
                let Some(variant) = find(name) else {
                    log::debug!("No variant named '{name}'");
                    partial.set_default()?;
                    return Ok(());
                };
                partial.select_variant_named(variant.name)?;
                let fields = variant.data.fields;
                match payload {
                    Value::Object(inner) => self.decode_record(partial, fields, inner, depth, None)?,
                    // `{"Circle": 1.5}` for a single-field tuple variant.
                    other if fields.len() == 1 && fields[0].name == "0" => {
                        partial.begin_field(fields[0].name)?;
                        self.decode_value(partial, other, depth + 1)?;
                        partial.end()?;
                    }
                    _ => self.decode_record(partial, fields, &Map::new(), depth, None)?,
                }
            }
            _ => {
                partial.set_default()?;
            }
        }
        Ok(())
    }
}

fn decode_scalar(partial: &mut Partial<'_>, kind: ScalarKind, value: &Value) -> Result<()> {
    match kind {
        ScalarKind::I8 => partial.set(coerce::to_i64(value) as i8)?,
        ScalarKind::I16 => partial.set(coerce::to_i64(value) as i16)?,
        ScalarKind::I32 => partial.set(coerce::to_i64(value) as i32)?,
        ScalarKind::I64 => partial.set(coerce::to_i64(value))?,
        ScalarKind::I128 => partial.set(coerce::to_i64(value) as i128)?,
        ScalarKind::ISize => partial.set(coerce::to_i64(value) as isize)?,
        ScalarKind::U8 => partial.set(coerce::to_u64(value) as u8)?,
        ScalarKind::U16 => partial.set(coerce::to_u64(value) as u16)?,
        ScalarKind::U32 => partial.set(coerce::to_u64(value) as u32)?,
        ScalarKind::U64 => partial.set(coerce::to_u64(value))?,
        ScalarKind::U128 => partial.set(coerce::to_u64(value) as u128)?,
        ScalarKind::USize => partial.set(coerce::to_u64(value) as usize)?,
        ScalarKind::F32 => partial.set(coerce::to_f64(value) as f32)?,
        ScalarKind::F64 => partial.set(coerce::to_f64(value))?,
        ScalarKind::Bool => partial.set(coerce::to_bool(value))?,
        ScalarKind::Char => {
            partial.set(coerce::to_string(value).chars().next().unwrap_or_default())?
        }
        ScalarKind::String => partial.set(coerce::to_string(value))?,
        ScalarKind::Other => partial.set_default()?,
    };
    Ok(())
}

/// Short rendering of a value for trace lines.
fn brief(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(map) => format!("object with {} keys", map.len()),
        scalar => scalar.to_string(),
    }
}
