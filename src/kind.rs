//! Closed classification of a [`Shape`] into the kinds the engines handle.

use chrono::{DateTime, Utc};
use facet_core::{Def, Facet, Field, Shape, Type, UserType};

/// Primitive kinds the coercion layer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    I128,
    ISize,
    U8,
    U16,
    U32,
    U64,
    U128,
    USize,
    F32,
    F64,
    Bool,
    Char,
    String,
    /// A scalar we do not know how to coerce into (paths, addresses, ...).
    Other,
}

/// Coarse family used when deciding whether two scalars are copy-compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarFamily {
    Signed,
    Unsigned,
    Float,
    Bool,
    Text,
    Other,
}

impl ScalarKind {
    fn from_identifier(identifier: &str) -> Self {
        match identifier {
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "i128" => Self::I128,
            "isize" => Self::ISize,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "usize" => Self::USize,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "bool" => Self::Bool,
            "char" => Self::Char,
            "String" => Self::String,
            _ => Self::Other,
        }
    }

    pub(crate) fn family(self) -> ScalarFamily {
        match self {
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::I128 | Self::ISize => {
                ScalarFamily::Signed
            }
            Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::U128 | Self::USize => {
                ScalarFamily::Unsigned
            }
            Self::F32 | Self::F64 => ScalarFamily::Float,
            Self::Bool => ScalarFamily::Bool,
            Self::Char | Self::String => ScalarFamily::Text,
            Self::Other => ScalarFamily::Other,
        }
    }
}

/// What a shape looks like to the decode and encode engines.
#[derive(Clone, Copy)]
pub(crate) enum ShapeKind {
    Timestamp,
    Option(&'static Shape),
    Pointer,
    Transparent,
    Scalar(ScalarKind),
    Record(&'static [Field]),
    Enum,
    Map,
    List,
    Unsupported,
}

impl ShapeKind {
    /// Classify `shape`. Wrappers are recognised before the value kinds they
    /// wrap, so an `Option<Box<T>>` is an option first.
    pub(crate) fn of(shape: &'static Shape) -> Self {
        if is_timestamp(shape) {
            return Self::Timestamp;
        }
        match shape.def {
            Def::Option(opt) => return Self::Option(opt.t),
            Def::Pointer(_) => return Self::Pointer,
            _ => {}
        }
        if shape.inner.is_some() {
            return Self::Transparent;
        }
        if matches!(shape.def, Def::Scalar) {
            return Self::Scalar(ScalarKind::from_identifier(shape.type_identifier));
        }
        match shape.ty {
            Type::User(UserType::Struct(struct_type)) => return Self::Record(struct_type.fields),
            Type::User(UserType::Enum(_)) => return Self::Enum,
            _ => {}
        }
        match shape.def {
            Def::Map(_) => Self::Map,
            Def::List(_) => Self::List,
            _ => Self::Unsupported,
        }
    }
}

fn is_timestamp(shape: &'static Shape) -> bool {
    shape.id == <DateTime<Utc> as Facet<'_>>::SHAPE.id
}
