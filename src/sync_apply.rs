//! `SyncApply`: rewrites a package's parsed ASTs in place so that each
//! struct's fields, doc comments, and `#[gopium(...)]` attribute match its
//! `Hierarchic` result, ready for an `AstPrinter` to re-emit.

use crate::collections::Hierarchic;
use crate::error::GopiumError;
use crate::model::Struct;
use crate::parser::{resolve_item_mut, AstPackage, Locator};
use crate::rust_attrs;

/// Rewrites every struct in `ast` whose id (per `locator`) appears in
/// `hier`, in place. Ids with no matching AST node (the struct moved or was
/// filtered out of a later parse) are skipped rather than treated as an
/// error -- `SyncApply` only ever narrows an existing declaration.
pub fn sync_apply(ast: &mut AstPackage, _locator: &Locator, hier: &Hierarchic) -> Result<(), GopiumError> {
    for (file, tree) in &mut ast.files {
        let entries: Vec<(String, Struct)> =
            hier.entries_in(file).map(|(id, st)| (id.to_string(), st.clone())).collect();
        for (id, result) in &entries {
            let Some(path) = decode_path(file, id) else { continue };
            let Some(item) = resolve_item_mut(&mut tree.items, &path) else { continue };
            if let syn::Item::Struct(item_struct) = item {
                apply_struct(item_struct, result);
            }
        }
    }
    Ok(())
}

/// Reverses `Locator::id`: `"{file}::{a:b:c}"` -> `[a, b, c]`. Returns
/// `None` for an id that doesn't belong to `file` or has a malformed path
/// segment, so a stale/foreign id is skipped rather than panicking.
fn decode_path(file: &str, id: &str) -> Option<Vec<usize>> {
    let rest = id.strip_prefix(file)?.strip_prefix("::")?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    rest.split(':').map(|p| p.parse().ok()).collect()
}

fn apply_struct(item: &mut syn::ItemStruct, result: &Struct) {
    rust_attrs::set_doc_lines(&mut item.attrs, &result.doc);
    match &mut item.fields {
        syn::Fields::Named(named) => {
            let mut fields: syn::punctuated::Punctuated<syn::Field, syn::token::Comma> = Default::default();
            for f in &result.fields {
                fields.push(rebuild_named_field(named.named.iter().find(|nf| matches_name(nf, &f.name)), f));
            }
            named.named = fields;
        }
        syn::Fields::Unnamed(unnamed) => {
            let mut fields: syn::punctuated::Punctuated<syn::Field, syn::token::Comma> = Default::default();
            for (i, f) in result.fields.iter().enumerate() {
                let existing = unnamed.unnamed.iter().nth(i);
                fields.push(rebuild_unnamed_field(existing, f));
            }
            unnamed.unnamed = fields;
        }
        syn::Fields::Unit => {}
    }
}

fn matches_name(field: &syn::Field, name: &str) -> bool {
    field.ident.as_ref().map(|i| i.to_string() == name).unwrap_or(false)
}

fn rebuild_named_field(existing: Option<&syn::Field>, result: &crate::model::Field) -> syn::Field {
    let ident = syn::Ident::new(sanitize_ident(&result.name).as_str(), proc_macro2::Span::call_site());
    let mut field = existing.cloned().unwrap_or_else(|| blank_field(Some(ident.clone())));
    field.ident = Some(ident);
    finish_field(&mut field, result);
    field
}

fn rebuild_unnamed_field(existing: Option<&syn::Field>, result: &crate::model::Field) -> syn::Field {
    let mut field = existing.cloned().unwrap_or_else(|| blank_field(None));
    field.ident = None;
    finish_field(&mut field, result);
    field
}

fn blank_field(ident: Option<syn::Ident>) -> syn::Field {
    syn::Field {
        attrs: Vec::new(),
        vis: syn::Visibility::Inherited,
        mutability: syn::FieldMutability::None,
        ident,
        colon_token: None,
        ty: syn::parse_quote!(()),
    }
}

fn finish_field(field: &mut syn::Field, result: &crate::model::Field) {
    field.vis = if result.exported { syn::parse_quote!(pub) } else { syn::Visibility::Inherited };
    if let Ok(ty) = syn::parse_str::<syn::Type>(&result.r#type) {
        field.ty = ty;
    }
    rust_attrs::set_doc_lines(&mut field.attrs, &result.doc);
    rust_attrs::set_gopium_attr(&mut field.attrs, &result.tag, result.embedded);
}

/// Padding fields are named `_`, a valid Rust identifier, but a field
/// re-synthesized for a brand-new name with no prior AST counterpart could
/// in principle collide with a keyword; this narrows to `_` explicitly
/// since that's the only name gopium's own strategies ever invent.
fn sanitize_ident(name: &str) -> String {
    if name.is_empty() {
        "_".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    #[test]
    fn decode_path_round_trips_locator_id() {
        let locator = Locator;
        let pos = crate::parser::Pos { file: "lib.rs".into(), path: vec![2, 1] };
        let id = locator.id(&pos);
        assert_eq!(decode_path("lib.rs", &id), Some(vec![2, 1]));
    }

    #[test]
    fn decode_path_rejects_foreign_file() {
        assert_eq!(decode_path("lib.rs", "other.rs::0"), None);
    }

    #[test]
    fn sync_apply_rewrites_field_order_and_tag() {
        let file: syn::File = syn::parse_str("struct Foo { a: u8, b: u32 }").unwrap();
        let mut ast = AstPackage { files: vec![("lib.rs".to_string(), file)] };
        let locator = Locator;
        let mut hier = Hierarchic::new();
        hier.insert(
            "lib.rs",
            "lib.rs::0",
            Struct {
                name: "Foo".into(),
                fields: vec![
                    Field { name: "b".into(), r#type: "u32".into(), size: 4, align: 4, ..Default::default() },
                    Field { name: "a".into(), r#type: "u8".into(), size: 1, align: 1, ..Default::default() },
                ],
                ..Default::default()
            },
        );
        sync_apply(&mut ast, &locator, &hier).unwrap();
        let syn::Item::Struct(st) = &ast.files[0].1.items[0] else { panic!("expected struct") };
        let syn::Fields::Named(named) = &st.fields else { panic!("expected named fields") };
        let names: Vec<String> = named.named.iter().map(|f| f.ident.as_ref().unwrap().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn sync_apply_skips_unknown_ids() {
        let file: syn::File = syn::parse_str("struct Foo { a: u8 }").unwrap();
        let mut ast = AstPackage { files: vec![("lib.rs".to_string(), file)] };
        let locator = Locator;
        let mut hier = Hierarchic::new();
        hier.insert("lib.rs", "lib.rs::9", Struct { name: "Ghost".into(), ..Default::default() });
        sync_apply(&mut ast, &locator, &hier).unwrap();
        let syn::Item::Struct(st) = &ast.files[0].1.items[0] else { panic!("expected struct") };
        assert_eq!(st.ident, "Foo");
    }
}
