//! `TypeParser`: since this crate's concrete stand-in source language is
//! Rust itself (its `#[repr(C)]` structs satisfy "C-like record layout
//! rules" exactly), `RustParser` realizes it for real with `syn`, giving
//! the walker and `SyncApply` something real to operate on.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GopiumError;

/// A stable declaration position: the file it came from plus an index path
/// through the item tree (top-level index, then one index per nested
/// `mod`/fn-body scope crossed to reach it).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    pub file: String,
    pub path: Vec<usize>,
}

/// `id(pos)` / `loc(pos)`. `id` is globally unique across the package (it
/// embeds the file), used to dedupe a struct visited from more than one
/// scope and as its `Hierarchic` entry key; `loc` is just the file path,
/// used as a `Hierarchic` category.
#[derive(Debug, Clone, Copy, Default)]
pub struct Locator;

impl Locator {
    pub fn id(&self, pos: &Pos) -> String {
        let path = pos.path.iter().map(ToString::to_string).collect::<Vec<_>>().join(":");
        format!("{}::{}", pos.file, path)
    }

    pub fn loc(&self, pos: &Pos) -> String {
        pos.file.clone()
    }
}

/// A visitable scope: the struct declarations directly in it, plus the
/// nested scopes reachable from it (inline `mod` bodies, fn bodies with
/// local item structs). Shallow walking stops at `structs`; deep walking
/// recurses into `children` too.
#[derive(Debug, Default)]
pub struct Scope {
    pub structs: Vec<StructDecl>,
    pub children: Vec<Scope>,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub pos: Pos,
    pub name: String,
    pub item: syn::ItemStruct,
}

/// The typed view of a package: one top scope per source file.
#[derive(Debug, Default)]
pub struct Package {
    pub files: Vec<(String, Scope)>,
}

/// The raw parsed ASTs, one per source file, kept for `SyncApply` +
/// `AstPrinter` to rewrite and re-emit.
#[derive(Debug, Default)]
pub struct AstPackage {
    pub files: Vec<(String, syn::File)>,
}

#[derive(Clone, Copy, Default)]
pub struct RustParser;

impl RustParser {
    pub fn new() -> Self {
        Self
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<(String, String)>, GopiumError> {
        let mut out = Vec::new();
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| GopiumError::Parse(format!("{}: {e}", dir.display())))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("rs"))
            .collect();
        entries.sort();
        for path in entries {
            let src = fs::read_to_string(&path).map_err(|e| GopiumError::Parse(format!("{}: {e}", path.display())))?;
            out.push((path.display().to_string(), src));
        }
        Ok(out)
    }

    /// `parse_types(ctx) -> (Package, Locator)`.
    pub fn parse_types(&self, dir: &Path) -> Result<(Package, Locator), GopiumError> {
        let mut files = Vec::new();
        for (path, src) in self.read_dir(dir)? {
            let parsed = syn::parse_file(&src).map_err(|e| GopiumError::Parse(format!("{path}: {e}")))?;
            let scope = build_scope(&path, &parsed.items, &[]);
            files.push((path, scope));
        }
        Ok((Package { files }, Locator))
    }

    /// `parse_ast(ctx) -> (AstPackage, Locator)`.
    pub fn parse_ast(&self, dir: &Path) -> Result<(AstPackage, Locator), GopiumError> {
        let mut files = Vec::new();
        for (path, src) in self.read_dir(dir)? {
            let parsed = syn::parse_file(&src).map_err(|e| GopiumError::Parse(format!("{path}: {e}")))?;
            files.push((path, parsed));
        }
        Ok((AstPackage { files }, Locator))
    }
}

fn build_scope(file: &str, items: &[syn::Item], prefix: &[usize]) -> Scope {
    let mut structs = Vec::new();
    let mut children = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(i);
        match item {
            syn::Item::Struct(st) => {
                structs.push(StructDecl {
                    pos: Pos { file: file.to_string(), path },
                    name: st.ident.to_string(),
                    item: st.clone(),
                });
            }
            syn::Item::Mod(m) => {
                if let Some((_, inner)) = &m.content {
                    children.push(build_scope(file, inner, &path));
                }
            }
            syn::Item::Fn(f) => {
                let local: Vec<syn::Item> = f
                    .block
                    .stmts
                    .iter()
                    .filter_map(|s| match s {
                        syn::Stmt::Item(it) => Some(it.clone()),
                        _ => None,
                    })
                    .collect();
                if !local.is_empty() {
                    children.push(build_scope(file, &local, &path));
                }
            }
            _ => {}
        }
    }
    Scope { structs, children }
}

/// Finds the mutable `syn::Item` at `path` within `items`, descending
/// through `mod` content or (one level of) fn-local item statements. Used
/// by `SyncApply` to locate the node a `Hierarchic` entry's id points at.
pub fn resolve_item_mut<'a>(items: &'a mut Vec<syn::Item>, path: &[usize]) -> Option<&'a mut syn::Item> {
    let (&head, rest) = path.split_first()?;
    let item = items.get_mut(head)?;
    if rest.is_empty() {
        return Some(item);
    }
    match item {
        syn::Item::Mod(m) => m.content.as_mut().and_then(|(_, inner)| resolve_item_mut(inner, rest)),
        syn::Item::Fn(f) => {
            let (&h2, r2) = rest.split_first()?;
            if !r2.is_empty() {
                return None;
            }
            f.block
                .stmts
                .iter_mut()
                .filter_map(|s| match s {
                    syn::Stmt::Item(it) => Some(it),
                    _ => None,
                })
                .nth(h2)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::TempDir;

    fn write_tmp(src: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.rs");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(src.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn parse_types_finds_top_level_struct() {
        let (dir, _path) = write_tmp("struct Foo { a: u8, b: u32 }\n");
        let parser = RustParser::new();
        let (pkg, loc) = parser.parse_types(dir.path()).unwrap();
        assert_eq!(pkg.files.len(), 1);
        let (_, scope) = &pkg.files[0];
        assert_eq!(scope.structs.len(), 1);
        assert_eq!(scope.structs[0].name, "Foo");
        assert_eq!(loc.id(&scope.structs[0].pos).ends_with("::0"), true);
    }

    #[test]
    fn parse_types_descends_into_inline_mod() {
        let (dir, _path) = write_tmp("mod inner { struct Bar { x: u8 } }\n");
        let parser = RustParser::new();
        let (pkg, _loc) = parser.parse_types(dir.path()).unwrap();
        let (_, scope) = &pkg.files[0];
        assert!(scope.structs.is_empty());
        assert_eq!(scope.children.len(), 1);
        assert_eq!(scope.children[0].structs[0].name, "Bar");
    }

    #[test]
    fn resolve_item_mut_finds_nested_mod_item() {
        let mut file: syn::File = syn::parse_str("mod inner { struct Bar { x: u8 } }").unwrap();
        let item = resolve_item_mut(&mut file.items, &[0, 0]).unwrap();
        match item {
            syn::Item::Struct(st) => assert_eq!(st.ident, "Bar"),
            _ => panic!("expected struct"),
        }
    }
}
