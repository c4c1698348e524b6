//! Field-name resolution: which key identifies a field in the generic tree.
//!
//! Three annotation conventions are understood, written as arbitrary facet
//! attributes on the field:
//!
//! ```text
//! #[facet(json = "name,omitempty")]   // or "-", ",omitempty"
//! #[facet(gorm = "column:name")]      // or "type:text;name", "-"
//! #[facet(xorm = "'name' notnull")]   // or "name", "-", "extends"
//! ```

use std::{collections::HashMap, rc::Rc};

use facet_core::{Field, FieldAttribute, FieldFlags, Shape};

use crate::{
    kind::ShapeKind,
    options::{Naming, Options},
};

/// The resolved identity of one field under a given [`Options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIdentity {
    /// Declared Rust field name.
    pub name: &'static str,
    /// Key used in the generic tree.
    pub key: String,
    /// Whether the field is dropped from encoded output when zero.
    pub omit_empty: bool,
    /// Whether the field is skipped in both directions.
    pub exclude: bool,
}

/// What one convention says about a field.
#[derive(Debug, Default)]
struct Tag {
    key: Option<String>,
    omit_empty: bool,
    exclude: bool,
}

#[derive(Debug, Clone, Copy)]
enum Convention {
    Json,
    Gorm,
    Xorm,
}

impl Convention {
    const CASCADE: [Convention; 3] = [Convention::Json, Convention::Gorm, Convention::Xorm];

    fn attribute(self) -> &'static str {
        match self {
            Convention::Json => "json",
            Convention::Gorm => "gorm",
            Convention::Xorm => "xorm",
        }
    }

    fn parse(self, raw: &str) -> Tag {
        match self {
            Convention::Json => parse_json(raw),
            Convention::Gorm => parse_gorm(raw),
            Convention::Xorm => parse_xorm(raw),
        }
    }

    fn read(self, field: &Field) -> Tag {
        annotation(field, self.attribute())
            .map(|raw| self.parse(&raw))
            .unwrap_or_default()
    }
}

/// Find `name = "..."` among a field's arbitrary attributes and return the
/// unquoted right-hand side.
fn annotation(field: &Field, name: &str) -> Option<String> {
    field.attributes.iter().find_map(|attr| {
        let FieldAttribute::Arbitrary(raw) = attr else {
            return None;
        };
        let (lhs, rhs) = raw.split_once('=')?;
        if lhs.trim() != name {
            return None;
        }
        let rhs = rhs.trim();
        let rhs = rhs
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(rhs);
        Some(rhs.replace("\\\"", "\"").replace("\\\\", "\\"))
    })
}

fn parse_json(raw: &str) -> Tag {
    if raw.trim() == "-" {
        return Tag {
            exclude: true,
            ..Tag::default()
        };
    }
    let mut parts = raw.split(',');
    let name = parts.next().unwrap_or_default().trim();
    let omit_empty = parts.any(|opt| opt.trim() == "omitempty");
    Tag {
        key: (!name.is_empty()).then(|| name.to_string()),
        omit_empty,
        exclude: false,
    }
}

const GORM_SETTINGS: &[&str] = &[
    "column",
    "type",
    "serializer",
    "size",
    "primarykey",
    "primary_key",
    "unique",
    "default",
    "precision",
    "scale",
    "not null",
    "autoincrement",
    "autoincrementincrement",
    "embedded",
    "embeddedprefix",
    "autocreatetime",
    "autoupdatetime",
    "index",
    "uniqueindex",
    "check",
    "comment",
    "foreignkey",
    "references",
    "polymorphic",
    "polymorphicvalue",
    "many2many",
    "joinforeignkey",
    "joinreferences",
    "constraint",
    "<-",
    "->",
];

fn parse_gorm(raw: &str) -> Tag {
    if raw.trim() == "-" {
        return Tag {
            exclude: true,
            ..Tag::default()
        };
    }
    let mut column = None;
    let mut bare = None;
    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        match segment.split_once(':') {
            Some((setting, value)) if setting.trim().eq_ignore_ascii_case("column") => {
                let value = value.trim();
                if !value.is_empty() {
                    column = Some(value.to_string());
                }
            }
            Some(_) => {}
            None => {
                let lowered = segment.to_ascii_lowercase();
                if bare.is_none() && !GORM_SETTINGS.contains(&lowered.as_str()) {
                    bare = Some(segment.to_string());
                }
            }
        }
    }
    Tag {
        key: column.or(bare),
        ..Tag::default()
    }
}

const XORM_KEYWORDS: &[&str] = &[
    "pk",
    "autoincr",
    "null",
    "notnull",
    "unique",
    "index",
    "extends",
    "deleted",
    "created",
    "updated",
    "version",
    "default",
    "comment",
    "cache",
    "nocache",
    "json",
    "jsonb",
    "bool",
    "int",
    "integer",
    "bigint",
    "smallint",
    "tinyint",
    "float",
    "double",
    "decimal",
    "char",
    "varchar",
    "text",
    "mediumtext",
    "longtext",
    "blob",
    "date",
    "datetime",
    "timestamp",
    "time",
    "<-",
    "->",
];

fn parse_xorm(raw: &str) -> Tag {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens == ["-"] {
        return Tag {
            exclude: true,
            ..Tag::default()
        };
    }
    let quoted = tokens.iter().find_map(|token| {
        token
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .filter(|s| !s.is_empty())
    });
    if let Some(name) = quoted {
        return Tag {
            key: Some(name.to_string()),
            ..Tag::default()
        };
    }
    let key = match tokens.as_slice() {
        [single]
            if is_identifier(single)
                && !XORM_KEYWORDS.contains(&single.to_ascii_lowercase().as_str()) =>
        {
            Some(single.to_string())
        }
        _ => None,
    };
    Tag {
        key,
        ..Tag::default()
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Lower-case the first character: `"UserName"` becomes `"userName"`.
pub(crate) fn to_lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Resolve the external key and flags of `field` under `options`.
pub fn resolve_field(field: &'static Field, options: &Options) -> FieldIdentity {
    let fallback = || to_lowercase_first(field.name);
    let (key, omit_empty, exclude) = match options.naming {
        Naming::Declared => (field.name.to_string(), false, false),
        Naming::Json => single(Convention::Json, field, fallback),
        Naming::Gorm => single(Convention::Gorm, field, fallback),
        Naming::Xorm => single(Convention::Xorm, field, fallback),
        Naming::Cascade => {
            // `json = ",omitempty"` names nothing but its flag still applies.
            let json_omit = Convention::Json.read(field).omit_empty;
            Convention::CASCADE
                .iter()
                .map(|convention| convention.read(field))
                .find(|tag| tag.exclude || tag.key.is_some())
                .map(|tag| (tag.key.unwrap_or_else(fallback), json_omit, tag.exclude))
                .unwrap_or_else(|| (fallback(), json_omit, false))
        }
    };
    let exclude = exclude || options.is_excluded(&key);
    FieldIdentity {
        name: field.name,
        key,
        omit_empty: omit_empty || options.omit_empty,
        exclude,
    }
}

fn single(
    convention: Convention,
    field: &Field,
    fallback: impl FnOnce() -> String,
) -> (String, bool, bool) {
    let tag = convention.read(field);
    let key = tag.key.unwrap_or_else(fallback);
    (key, tag.omit_empty, tag.exclude)
}

/// One field of a record as the engines see it.
#[derive(Debug)]
pub(crate) enum LayoutEntry {
    /// A regular field, addressed by its resolved key.
    Field {
        index: usize,
        field: &'static Field,
        identity: FieldIdentity,
    },
    /// An embedded record whose fields live in the parent's key space.
    Flatten {
        index: usize,
        field: &'static Field,
        layout: Rc<RecordLayout>,
    },
}

/// The resolved fields of one record type, in declaration order.
#[derive(Debug, Default)]
pub(crate) struct RecordLayout {
    pub(crate) entries: Vec<LayoutEntry>,
}

/// A field reached through zero or more embedded records.
#[derive(Debug)]
pub(crate) struct Leaf<'a> {
    /// Field indices from the outer record down to the field itself.
    pub(crate) path: Vec<usize>,
    pub(crate) field: &'static Field,
    pub(crate) identity: &'a FieldIdentity,
}

impl RecordLayout {
    /// Every non-embedded field, with embedded records expanded in place.
    pub(crate) fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &mut Vec<usize>, out: &mut Vec<Leaf<'a>>) {
        for entry in &self.entries {
            match entry {
                LayoutEntry::Field {
                    index,
                    field,
                    identity,
                } => {
                    let mut path = prefix.clone();
                    path.push(*index);
                    out.push(Leaf {
                        path,
                        field,
                        identity,
                    });
                }
                LayoutEntry::Flatten { index, layout, .. } => {
                    prefix.push(*index);
                    layout.collect_leaves(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    /// Find a field by declared name, then by resolved key, then by the
    /// small-camel form of the declared name.
    pub(crate) fn lookup(&self, name: &str) -> Option<Leaf<'_>> {
        let leaves = self.leaves();
        let position = leaves
            .iter()
            .position(|leaf| leaf.field.name == name)
            .or_else(|| leaves.iter().position(|leaf| leaf.identity.key == name))
            .or_else(|| {
                leaves
                    .iter()
                    .position(|leaf| to_lowercase_first(leaf.field.name) == name)
            })?;
        leaves.into_iter().nth(position)
    }
}

/// Per-call cache of record layouts, keyed by the address of the field
/// slice they were built from.
#[derive(Debug, Default)]
pub(crate) struct LayoutCache {
    layouts: HashMap<usize, Rc<RecordLayout>>,
}

impl LayoutCache {
    pub(crate) fn layout(&mut self, fields: &'static [Field], options: &Options) -> Rc<RecordLayout> {
        let id = fields.as_ptr() as usize;
        if let Some(layout) = self.layouts.get(&id) {
            return Rc::clone(layout);
        }
        let mut entries = Vec::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if field.flags.contains(FieldFlags::FLATTEN) {
                if let ShapeKind::Record(inner) = ShapeKind::of((field.shape)()) {
                    let layout = self.layout(inner, options);
                    entries.push(LayoutEntry::Flatten {
                        index,
                        field,
                        layout,
                    });
                    continue;
                }
            }
            entries.push(LayoutEntry::Field {
                index,
                field,
                identity: resolve_field(field, options),
            });
        }
        let layout = Rc::new(RecordLayout { entries });
        log::trace!(
            "Resolved layout with {} entries for fields at {id:#x}",
            layout.entries.len()
        );
        self.layouts.insert(id, Rc::clone(&layout));
        layout
    }
}

/// Resolve every field of a record shape, with embedded records expanded.
///
/// Returns an empty list for shapes that are not records.
pub fn resolve_fields(shape: &'static Shape, options: &Options) -> Vec<FieldIdentity> {
    let ShapeKind::Record(fields) = ShapeKind::of(shape) else {
        return Vec::new();
    };
    let mut cache = LayoutCache::default();
    cache
        .layout(fields, options)
        .leaves()
        .into_iter()
        .map(|leaf| leaf.identity.clone())
        .collect()
}
