use chrono::{DateTime, Utc};
use facet_core::{Field, Type, UserType};
use facet_reflect::{HasFields, Peek};
use serde_json::{Map, Value};

use crate::{
    ConvertErrorKind, Result, coerce,
    deserialize::Engine,
    kind::{ScalarKind, ShapeKind},
    resolve::LayoutEntry,
    timestamp,
};

impl Engine<'_> {
    /// Encode any value. `None` means the value has no representation and
    /// should be skipped by the caller.
    pub(crate) fn encode_value<'mem, 'facet>(
        &mut self,
        peek: Peek<'mem, 'facet>,
        depth: usize,
    ) -> Result<Option<Value>> {
        self.enter(depth)?;
        let shape = peek.shape();
        self.options.trace(depth, || format!("encode {shape}"));

        let value = match ShapeKind::of(shape) {
            ShapeKind::Timestamp => {
                let ts = peek.get::<DateTime<Utc>>()?;
                Some(timestamp::encode(ts, self.options))
            }
            ShapeKind::Option(_) => match peek.into_option()?.value() {
                Some(inner) => self.encode_value(inner, depth + 1)?,
                None => Some(Value::Null),
            },
            ShapeKind::Pointer => match peek.into_pointer()?.borrow_inner() {
                Some(inner) => self.encode_value(inner, depth + 1)?,
                None => Some(Value::Null),
            },
            ShapeKind::Transparent => self.encode_value(peek.innermost_peek(), depth + 1)?,
            ShapeKind::Scalar(kind) => scalar_value(peek, kind)?,
            ShapeKind::Record(fields) => {
                let peeks = field_peeks(peek)?;
                let mut out = Map::new();
                self.encode_record(fields, &peeks, &mut out, depth)?;
                Some(Value::Object(out))
            }
            ShapeKind::Enum => Some(self.encode_enum(peek, depth)?),
            ShapeKind::Map => {
                let mut out = Map::new();
                for (key, item) in peek.into_map()?.iter() {
                    let key = self
                        .encode_value(key, depth + 1)?
                        .map(|k| coerce::to_string(&k))
                        .unwrap_or_default();
                    let item = self.encode_value(item, depth + 1)?.unwrap_or(Value::Null);
                    out.insert(key, item);
                }
                Some(Value::Object(out))
            }
            ShapeKind::List => {
                let list = peek.into_list()?;
                let mut out = Vec::with_capacity(list.len());
                for item in list.iter() {
                    out.push(self.encode_value(item, depth + 1)?.unwrap_or(Value::Null));
                }
                Some(Value::Array(out))
            }
            ShapeKind::Unsupported => {
                log::debug!("Skipping unsupported shape {shape}");
                None
            }
        };
        Ok(value)
    }

    /// Encode the fields of one record into `out`, embedded records included.
    pub(crate) fn encode_record<'mem, 'facet>(
        &mut self,
        fields: &'static [Field],
        peeks: &[Peek<'mem, 'facet>],
        out: &mut Map<String, Value>,
        depth: usize,
    ) -> Result<()> {
        self.enter(depth)?;
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
                    let Some(peek) = peeks.get(*index).cloned() else {
                        continue;
                    };
                    let kind = ShapeKind::of(peek.shape());
                    if let ShapeKind::Option(_) = kind {
                        if peek.clone().into_option()?.is_none() {
                            self.options
                                .trace(depth, || format!("field {} is None", field.name));
                            continue;
                        }
                    }
                    if identity.omit_empty && empty_for_omission(peek.clone())? {
                        self.options
                            .trace(depth, || format!("field {} omitted", field.name));
                        continue;
                    }
                    if let Some(value) = self.encode_value(peek, depth + 1)? {
                        out.insert(identity.key.clone(), value);
                    }
                }
                LayoutEntry::Flatten { index, .. } => {
                    let Some(peek) = peeks.get(*index).cloned() else {
                        continue;
                    };
                    let ShapeKind::Record(inner) = ShapeKind::of(peek.shape()) else {
                        continue;
                    };
                    let inner_peeks = field_peeks(peek)?;
                    self.encode_record(inner, &inner_peeks, out, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn encode_enum<'mem, 'facet>(
        &mut self,
        peek: Peek<'mem, 'facet>,
        depth: usize,
    ) -> Result<Value> {
        let shape = peek.shape();
        let enum_peek = peek.into_enum()?;
        let name = enum_peek
            .variant_name_active()
            .map_err(|e| ConvertErrorKind::UnknownVariant(format!("{shape}: {e:?}")))?;
        let Type::User(UserType::Enum(enum_type)) = shape.ty else {
            return Ok(Value::String(name.to_string()));
        };
        let Some(variant) = enum_type.variants.iter().find(|v| v.name == name) else {
            return Err(ConvertErrorKind::UnknownVariant(format!("{shape}::{name}")).into());
        };

        let fields = variant.data.fields;
        if fields.is_empty() {
            return Ok(Value::String(name.to_string()));
        }
        let peeks: Vec<_> = enum_peek.fields().map(|(_, p)| p).collect();
        let payload = match (fields, peeks.as_slice()) {
            ([only], [inner]) if only.name == "0" => self
                .encode_value(inner.clone(), depth + 1)?
                .unwrap_or(Value::Null),
            _ => {
                let mut out = Map::new();
                self.encode_record(fields, &peeks, &mut out, depth + 1)?;
                Value::Object(out)
            }
        };
        let mut wrapper = Map::new();
        wrapper.insert(name.to_string(), payload);
        Ok(Value::Object(wrapper))
    }
}

/// The field values of a struct, in declaration order.
pub(crate) fn field_peeks<'mem, 'facet>(
    peek: Peek<'mem, 'facet>,
) -> Result<Vec<Peek<'mem, 'facet>>> {
    Ok(peek.into_struct()?.fields().map(|(_, p)| p).collect())
}

/// Whether an omit-empty field holding `peek` is left out. Pointers and
/// transparent wrappers are seen through first, so a boxed record is never
/// dropped.
pub(crate) fn empty_for_omission(peek: Peek<'_, '_>) -> Result<bool> {
    match ShapeKind::of(peek.shape()) {
        ShapeKind::Pointer => match peek.into_pointer()?.borrow_inner() {
            Some(inner) => empty_for_omission(inner),
            None => Ok(true),
        },
        ShapeKind::Transparent => empty_for_omission(peek.innermost_peek()),
        kind => Ok(omittable(kind) && is_zero(peek)?),
    }
}

/// Records and enums are never dropped for being empty.
fn omittable(kind: ShapeKind) -> bool {
    !matches!(kind, ShapeKind::Record(_) | ShapeKind::Enum)
}

/// Whether a value is the zero value of its type: `None`, the epoch, an empty
/// collection, a zero scalar, or a record whose fields are all zero.
pub(crate) fn is_zero(peek: Peek<'_, '_>) -> Result<bool> {
    Ok(match ShapeKind::of(peek.shape()) {
        ShapeKind::Timestamp => timestamp::is_epoch(peek.get::<DateTime<Utc>>()?),
        ShapeKind::Option(_) => peek.into_option()?.is_none(),
        ShapeKind::Pointer => match peek.into_pointer()?.borrow_inner() {
            Some(inner) => is_zero(inner)?,
            None => true,
        },
        ShapeKind::Transparent => is_zero(peek.innermost_peek())?,
        ShapeKind::Scalar(kind) => scalar_value(peek, kind)?
            .as_ref()
            .is_none_or(coerce::is_zero),
        ShapeKind::Record(_) => {
            let mut zero = true;
            for field in field_peeks(peek)? {
                if !is_zero(field)? {
                    zero = false;
                    break;
                }
            }
            zero
        }
        ShapeKind::Map => peek.into_map()?.len() == 0,
        ShapeKind::List => peek.into_list()?.len() == 0,
        ShapeKind::Enum | ShapeKind::Unsupported => false,
    })
}

/// Normalize a scalar into a primitive [`Value`].
fn scalar_value(peek: Peek<'_, '_>, kind: ScalarKind) -> Result<Option<Value>> {
    Ok(Some(match kind {
        ScalarKind::I8 => Value::from(*peek.get::<i8>()?),
        ScalarKind::I16 => Value::from(*peek.get::<i16>()?),
        ScalarKind::I32 => Value::from(*peek.get::<i32>()?),
        ScalarKind::I64 => Value::from(*peek.get::<i64>()?),
        ScalarKind::ISize => Value::from(*peek.get::<isize>()? as i64),
        // Values past 64 bits are kept exact as strings.
        ScalarKind::I128 => {
            let n = *peek.get::<i128>()?;
            i64::try_from(n).map_or_else(|_| Value::String(n.to_string()), Value::from)
        }
        ScalarKind::U8 => Value::from(*peek.get::<u8>()?),
        ScalarKind::U16 => Value::from(*peek.get::<u16>()?),
        ScalarKind::U32 => Value::from(*peek.get::<u32>()?),
        ScalarKind::U64 => Value::from(*peek.get::<u64>()?),
        ScalarKind::USize => Value::from(*peek.get::<usize>()? as u64),
        ScalarKind::U128 => {
            let n = *peek.get::<u128>()?;
            u64::try_from(n).map_or_else(|_| Value::String(n.to_string()), Value::from)
        }
        // Non-finite floats become null.
        ScalarKind::F32 => Value::from(*peek.get::<f32>()? as f64),
        ScalarKind::F64 => Value::from(*peek.get::<f64>()?),
        ScalarKind::Bool => Value::from(*peek.get::<bool>()?),
        ScalarKind::Char => Value::String(peek.get::<char>()?.to_string()),
        ScalarKind::String => Value::String(peek.get::<String>()?.clone()),
        ScalarKind::Other => match peek.as_str() {
            Some(s) => Value::String(s.to_string()),
            None => return Ok(None),
        },
    }))
}
