//! Maps the abstract per-field metadata (`Doc`, `Comment`, `Tag`,
//! `Embedded`) onto concrete Rust syntax: doc lines are `#[doc = "..."]`
//! (what `///` desugars to), and since Rust has neither struct tags nor
//! field embedding, both are carried in one
//! `#[gopium(tag = "...", embedded)]` attribute -- the nearest
//! Rust-idiomatic analogue of an arbitrary per-field tag string.

use syn::{Attribute, Lit, Meta};

pub fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter_map(|a| {
            if !a.path().is_ident("doc") {
                return None;
            }
            match &a.meta {
                Meta::NameValue(nv) => match &nv.value {
                    syn::Expr::Lit(syn::ExprLit { lit: Lit::Str(s), .. }) => Some(format!("///{}", s.value())),
                    _ => None,
                },
                _ => None,
            }
        })
        .collect()
}

/// Replaces every existing `#[doc = "..."]` attribute with one built from
/// `lines` (each expected to start with `///`, as `doc_lines` produces).
pub fn set_doc_lines(attrs: &mut Vec<Attribute>, lines: &[String]) {
    attrs.retain(|a| !a.path().is_ident("doc"));
    for line in lines {
        let text = line.trim_start_matches("///").to_string();
        let attr: Attribute = syn::parse_quote!(#[doc = #text]);
        attrs.push(attr);
    }
}

struct GopiumMeta {
    tag: String,
    embedded: bool,
}

fn gopium_meta(attrs: &[Attribute]) -> GopiumMeta {
    let mut out = GopiumMeta { tag: String::new(), embedded: false };
    for a in attrs {
        if !a.path().is_ident("gopium") {
            continue;
        }
        let _ = a.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                out.tag = lit.value();
            } else if meta.path.is_ident("embedded") {
                out.embedded = true;
            }
            Ok(())
        });
    }
    out
}

pub fn gopium_tag(attrs: &[Attribute]) -> String {
    gopium_meta(attrs).tag
}

pub fn gopium_embedded(attrs: &[Attribute]) -> bool {
    gopium_meta(attrs).embedded
}

/// Replaces any existing `#[gopium(...)]` attribute with one reflecting
/// `tag`/`embedded`. A blank tag and `embedded = false` removes the
/// attribute entirely rather than emitting `#[gopium()]`.
pub fn set_gopium_attr(attrs: &mut Vec<Attribute>, tag: &str, embedded: bool) {
    attrs.retain(|a| !a.path().is_ident("gopium"));
    if tag.is_empty() && !embedded {
        return;
    }
    let attr: Attribute = if tag.is_empty() {
        syn::parse_quote!(#[gopium(embedded)])
    } else if embedded {
        syn::parse_quote!(#[gopium(tag = #tag, embedded)])
    } else {
        syn::parse_quote!(#[gopium(tag = #tag)])
    };
    attrs.push(attr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_lines_round_trip() {
        let item: syn::ItemStruct = syn::parse_quote! {
            /// first line
            /// second line
            struct Foo { a: u8 }
        };
        let lines = doc_lines(&item.attrs);
        assert_eq!(lines, vec!["/// first line", "/// second line"]);
    }

    #[test]
    fn gopium_attr_round_trip() {
        let field: syn::Field = syn::parse_quote! {
            #[gopium(tag = "json:\"x\"", embedded)]
            x: u8
        };
        assert_eq!(gopium_tag(&field.attrs), "json:\"x\"");
        assert!(gopium_embedded(&field.attrs));
    }

    #[test]
    fn set_gopium_attr_writes_tag_only() {
        let mut attrs: Vec<Attribute> = Vec::new();
        set_gopium_attr(&mut attrs, "gopium:\"memory_pack\"", false);
        assert_eq!(gopium_tag(&attrs), "gopium:\"memory_pack\"");
        assert!(!gopium_embedded(&attrs));
    }
}
