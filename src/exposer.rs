//! `Exposer`: for a parsed type, its name/size/align. The one concrete
//! implementation, `StdSizes`, mirrors the array-size recurrence
//! `go/types.StdSizes` uses and additionally consults a `Reference` for
//! named struct types when one is wired in.

use syn::Type;

use crate::collections::Reference;
use crate::layout::align_up;
use crate::platform::Platform;

/// `(name, size, align)` for a type, the minimal oracle the walker needs to
/// turn a parsed field into a `gopium::Field`.
pub trait Exposer: Send + Sync {
    fn name(&self, ty: &Type) -> String;
    fn size(&self, ty: &Type) -> u64;
    fn align(&self, ty: &Type) -> u64;
}

/// The standard-platform-sizes Exposer: primitive scalars and pointers are
/// sized from `Platform`; arrays recurse via the documented
/// `align(elem)*(n-1) + elem_size` formula; named types fall back to the
/// `Reference` (when the caller wires one in via `with_reference`) and
/// finally to a zero-sized stub for types this source-level parser can't
/// resolve (an external/opaque type), logging a warning so the gap is
/// visible rather than silently wrong.
#[derive(Clone)]
pub struct StdSizes {
    platform: Platform,
    reference: Option<Reference>,
}

impl StdSizes {
    pub fn new(platform: Platform) -> Self {
        Self { platform, reference: None }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    fn scalar_size_align(&self, ident: &str) -> Option<(u64, u64)> {
        let word = self.platform.sys_word();
        Some(match ident {
            "u8" | "i8" | "bool" => (1, 1),
            "u16" | "i16" => (2, 2),
            "u32" | "i32" | "f32" | "char" => (4, 4),
            "u64" | "i64" | "f64" => (8, 8),
            "u128" | "i128" => (16, 16),
            "usize" | "isize" => (word, word),
            _ => return None,
        })
    }

    fn named_size_align(&self, name: &str) -> (u64, u64) {
        if let Some(reference) = &self.reference {
            if let Some(sa) = reference.get(name) {
                return (sa.size, sa.align);
            }
        }
        tracing::warn!(type_name = name, "exposer: no reference known for named type, falling back to zero-sized stub");
        (0, 1)
    }
}

impl Exposer for StdSizes {
    fn name(&self, ty: &Type) -> String {
        quote::quote!(#ty).to_string().replace(' ', "")
    }

    fn size(&self, ty: &Type) -> u64 {
        self.size_align(ty).0
    }

    fn align(&self, ty: &Type) -> u64 {
        self.size_align(ty).1
    }
}

impl StdSizes {
    pub fn size_align(&self, ty: &Type) -> (u64, u64) {
        match ty {
            // Pointers and references are word-sized regardless of pointee,
            // which is why backreference cycles through pointers can't
            // deadlock.
            Type::Reference(_) | Type::Ptr(_) => (self.platform.sys_word(), self.platform.sys_word()),
            Type::Array(arr) => {
                let (esize, ealign) = self.size_align(&arr.elem);
                let n = eval_array_len(&arr.len);
                match n {
                    Some(n) if n > 0 => (align_up(esize, ealign) * (n - 1) + esize, ealign),
                    Some(_) => (0, ealign),
                    None => (0, ealign),
                }
            }
            Type::Path(p) => {
                let seg = p.path.segments.last();
                let ident = seg.map(|s| s.ident.to_string()).unwrap_or_default();
                if let Some(sa) = self.scalar_size_align(&ident) {
                    return sa;
                }
                if ident == "Box" || ident == "Rc" || ident == "Arc" {
                    return (self.platform.sys_word(), self.platform.sys_word());
                }
                self.named_size_align(&self.name(ty))
            }
            _ => self.named_size_align(&self.name(ty)),
        }
    }
}

fn eval_array_len(expr: &syn::Expr) -> Option<u64> {
    if let syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(n), .. }) = expr {
        return n.base10_parse::<u64>().ok();
    }
    None
}
