//! Layout arithmetic: the two primitives every strategy and the walker's
//! backreference bookkeeping is built from.

use crate::model::{Field, Struct};

/// `ceil(offset / a) * a`, assumes `a >= 1` (callers clamp with `.max(1)`).
pub fn align_up(offset: u64, a: u64) -> u64 {
    let a = a.max(1);
    (offset + a - 1) / a * a
}

/// Visits the fields of `s` in order starting at `base_offset`, calling
/// `visitor(pad, fields)` once per field (`fields` holding exactly that one
/// field) with the pre-field padding needed to satisfy its alignment, then
/// once more at the end with an empty `fields` slice and the struct's
/// trailing padding. `struct_align_override`, when set, is used instead of
/// `max(field.align)` for the trailing padding computation. Returns the
/// final offset (i.e. the struct's total size from `base_offset`).
pub fn walk_struct<F>(s: &Struct, base_offset: u64, struct_align_override: Option<u64>, mut visitor: F) -> u64
where
    F: FnMut(u64, &[Field]),
{
    let mut o = base_offset;
    for f in &s.fields {
        let a = f.align.max(1);
        let pad = align_up(o, a) - o;
        visitor(pad, std::slice::from_ref(f));
        o += pad + f.size;
    }
    let struct_align =
        struct_align_override.unwrap_or_else(|| s.fields.iter().map(|f| f.align).max().unwrap_or(1));
    let tpad = align_up(o, struct_align.max(1)) - o;
    visitor(tpad, &[]);
    o + tpad
}

/// `(size, align)` of `s`. An empty struct is `(0, 1)`.
pub fn size_align(s: &Struct) -> (u64, u64) {
    if s.fields.is_empty() {
        return (0, 1);
    }
    let align = s.fields.iter().map(|f| f.align).max().unwrap_or(1);
    let size = walk_struct(s, 0, None, |_, _| {});
    (size, align)
}

/// Running sum of field sizes plus inter-field padding, excluding trailing
/// struct padding — what the cache-rounding strategies fit to a cache line.
pub fn footprint(s: &Struct) -> u64 {
    let mut fp = 0u64;
    let mut o = 0u64;
    for f in &s.fields {
        let a = f.align.max(1);
        let pad = align_up(o, a) - o;
        fp += pad + f.size;
        o += pad + f.size;
    }
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn field(name: &str, size: u64, align: u64) -> Field {
        Field {
            name: name.to_string(),
            r#type: String::new(),
            size,
            align,
            ..Default::default()
        }
    }

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 8), 16);
    }

    #[test]
    fn size_align_empty_struct_is_zero_one() {
        let s = Struct::default();
        assert_eq!(size_align(&s), (0, 1));
    }

    #[test]
    fn size_align_accounts_for_interior_and_trailing_padding() {
        // a: i8, b: i64, c: i8 -> padding before b, trailing pad to align 8.
        let s = Struct {
            name: "S".into(),
            fields: vec![field("a", 1, 1), field("b", 8, 8), field("c", 1, 1)],
            ..Default::default()
        };
        assert_eq!(size_align(&s), (24, 8));
    }

    #[test]
    fn footprint_excludes_trailing_padding() {
        let s = Struct {
            name: "S".into(),
            fields: vec![field("a", 1, 1), field("b", 8, 8), field("c", 1, 1)],
            ..Default::default()
        };
        // 1 (a) + 7 pad + 8 (b) + 1 (c) = 17, no trailing pad counted.
        assert_eq!(footprint(&s), 17);
    }
}
