//! Moving single fields between two values of the same record type.
//!
//! Writers that must leave the rest of a record untouched build a complete
//! replacement value, then exchange only the fields they wrote. Both values
//! stay fully initialized throughout, so the replacement is dropped normally
//! afterwards and takes the old field values with it.

use facet_core::Field;

use crate::{ConvertErrorKind, Result, kind::ShapeKind};

/// Where one field lives inside its outermost record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpan {
    offset: usize,
    size: usize,
}

/// Resolve `path` (field indices through directly nested records) to the
/// byte range of the field it ends at.
pub(crate) fn span(fields: &'static [Field], path: &[usize]) -> Result<FieldSpan> {
    let mut fields = fields;
    let mut offset = 0;
    let mut last = None;
    for (step, &index) in path.iter().enumerate() {
        let field = fields
            .get(index)
            .ok_or_else(|| ConvertErrorKind::NotARecord(format!("no field #{index}")))?;
        offset += field.offset;
        last = Some(field);
        if step + 1 < path.len() {
            let ShapeKind::Record(inner) = ShapeKind::of((field.shape)()) else {
                return Err(ConvertErrorKind::NotARecord((field.shape)().to_string()).into());
            };
            fields = inner;
        }
    }
    let field = last.ok_or_else(|| ConvertErrorKind::NotARecord("empty field path".into()))?;
    let layout = (field.shape)()
        .layout
        .sized_layout()
        .map_err(|_| ConvertErrorKind::Unsettable(format!("{} is unsized", field.name)))?;
    Ok(FieldSpan {
        offset,
        size: layout.size(),
    })
}

/// Exchange the fields at `spans` between `target` and `fresh`.
///
/// Every span must come from [`span`] over the field list of `T`, and no two
/// spans may overlap.
pub(crate) fn exchange<T>(target: &mut T, fresh: &mut T, spans: &[FieldSpan]) {
    let target = (target as *mut T).cast::<u8>();
    let fresh = (fresh as *mut T).cast::<u8>();
    for span in spans {
        // SAFETY: both pointers come from live, distinct `&mut T`. A span
        // names one field of `T` by offset and size, so it lies inside both
        // values and holds an initialized value of the same type on each
        // side. Swapping the bytes moves each value to the other owner.
        unsafe {
            std::ptr::swap_nonoverlapping(target.add(span.offset), fresh.add(span.offset), span.size);
        }
    }
}
