//! The package walker: matches struct declarations by regex across nested
//! scopes, applies a strategy to each concurrently, dedupes by id, and
//! threads backreferences through a shared `Reference`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use regex::Regex;

use crate::collections::{Reference, SizeAlign};
use crate::context::CancelToken;
use crate::error::GopiumError;
use crate::exposer::Exposer;
use crate::layout::size_align;
use crate::model::{Field, Struct};
use crate::parser::{Locator, Package, Scope};
use crate::rust_attrs;
use crate::strategies::Strategy;

/// One struct's visit-and-apply result, as emitted onto the walker's
/// output channel.
pub struct Applied {
    pub id: String,
    pub loc: String,
    pub origin: Struct,
    pub result: Struct,
    pub err: Option<GopiumError>,
}

#[derive(Debug, Clone, Copy)]
pub struct WalkerConfig {
    pub deep: bool,
    pub backref: bool,
}

/// Spawns the walker's traversal on a background thread and returns the
/// receiving end of its output channel immediately; the channel closes
/// once every matched struct's task has sent its result (single-producer
/// rule: the outermost scope visit owns the `Sender` and is the only place
/// it's ever dropped).
pub fn walk(
    package: Package,
    locator: Locator,
    regex: Regex,
    pipeline: Arc<dyn Strategy>,
    exposer: Arc<dyn Exposer>,
    reference: Reference,
    config: WalkerConfig,
    ctx: CancelToken,
) -> Receiver<Applied> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let visited: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
        thread::scope(|scope| {
            for (file, top) in &package.files {
                if ctx.is_cancelled() {
                    break;
                }
                visit_scope(
                    scope,
                    top,
                    file,
                    &locator,
                    &regex,
                    pipeline.as_ref(),
                    exposer.as_ref(),
                    config,
                    &reference,
                    &visited,
                    &tx,
                    &ctx,
                );
            }
        });
        // `tx` drops here once every scoped task spawned above has joined,
        // closing the channel exactly once.
    });
    rx
}

#[allow(clippy::too_many_arguments)]
fn visit_scope<'scope, 'env>(
    scope_exec: &'scope thread::Scope<'scope, 'env>,
    scope: &'env Scope,
    file: &'env str,
    locator: &'env Locator,
    regex: &'env Regex,
    pipeline: &'env dyn Strategy,
    exposer: &'env dyn Exposer,
    config: WalkerConfig,
    reference: &'env Reference,
    visited: &'env Mutex<HashSet<String>>,
    tx: &'env Sender<Applied>,
    ctx: &'env CancelToken,
) {
    for decl in &scope.structs {
        if ctx.is_cancelled() {
            break;
        }
        if !regex.is_match(&decl.name) {
            continue;
        }
        let id = locator.id(&decl.pos);
        {
            let mut seen = visited.lock().unwrap();
            if !seen.insert(id.clone()) {
                continue;
            }
        }
        // The `Reference` is keyed by the struct's *name*, not its
        // declaration id: a field's type is spelled as a bare identifier
        // (`inner: Inner`), never as a position, so that's the only key the
        // Exposer can look embedded structs up by. This assumes struct
        // names are unique within the package, the same assumption a
        // source-level (not fully type-checked) resolver of `go/types`-style
        // backreferences makes.
        if config.backref {
            reference.reserve(&decl.name);
        }
        let loc = locator.loc(&decl.pos);
        let item = decl.item.clone();
        let name = decl.name.clone();
        let tx = tx.clone();
        let task_ctx = ctx.clone();
        let reference = reference.clone();
        scope_exec.spawn(move || {
            let origin = enum_struct(exposer, &item);
            let (result, err) = match pipeline.apply(&task_ctx, origin.clone()) {
                Ok(r) => (r, None),
                Err(e) => (Struct::default(), Some(e)),
            };
            if config.backref {
                let (size, align) = size_align(&result);
                reference.set(&name, SizeAlign { size, align });
            }
            let _ = tx.send(Applied { id, loc, origin, result, err });
        });
    }
    if config.deep {
        for child in &scope.children {
            if ctx.is_cancelled() {
                break;
            }
            visit_scope(scope_exec, child, file, locator, regex, pipeline, exposer, config, reference, visited, tx, ctx);
        }
    }
}

/// Converts a parsed `syn::ItemStruct` into the abstract `Struct` model,
/// delegating size/align/name to the `Exposer` for each field's type.
pub fn enum_struct(exposer: &dyn Exposer, item: &syn::ItemStruct) -> Struct {
    let fields = match &item.fields {
        syn::Fields::Named(named) => named.named.iter().map(|f| named_field(exposer, f)).collect(),
        syn::Fields::Unnamed(unnamed) => {
            unnamed.unnamed.iter().enumerate().map(|(i, f)| unnamed_field(exposer, i, f)).collect()
        }
        syn::Fields::Unit => Vec::new(),
    };
    Struct {
        name: item.ident.to_string(),
        doc: rust_attrs::doc_lines(&item.attrs),
        comment: Vec::new(),
        fields,
    }
}

fn named_field(exposer: &dyn Exposer, f: &syn::Field) -> Field {
    let name = f.ident.as_ref().map(ToString::to_string).unwrap_or_default();
    build_field(exposer, f, name)
}

fn unnamed_field(exposer: &dyn Exposer, index: usize, f: &syn::Field) -> Field {
    build_field(exposer, f, index.to_string())
}

fn build_field(exposer: &dyn Exposer, f: &syn::Field, name: String) -> Field {
    Field {
        name,
        r#type: exposer.name(&f.ty),
        size: exposer.size(&f.ty),
        align: exposer.align(&f.ty),
        tag: rust_attrs::gopium_tag(&f.attrs),
        exported: matches!(f.vis, syn::Visibility::Public(_)),
        embedded: rust_attrs::gopium_embedded(&f.attrs),
        doc: rust_attrs::doc_lines(&f.attrs),
        comment: Vec::new(),
    }
}
