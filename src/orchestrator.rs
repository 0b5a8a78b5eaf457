//! Orchestrator: wires `Platform` + `StdSizes` (Exposer) + `RustParser`
//! (TypeParser) + walker + pipeline + one of the two output paths (Bytes or
//! Sync), under a single cancellation token.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use crate::collections::{Hierarchic, Reference};
use crate::config::GopiumConfig;
use crate::context::CancelToken;
use crate::error::GopiumError;
use crate::exposer::{Exposer, StdSizes};
use crate::parser::RustParser;
use crate::printer::{AstPrinter, PrettyPlease};
use crate::serialize;
use crate::strategies::{build_pipeline, Strategy};
use crate::sync_apply::sync_apply;
use crate::walker::{walk, WalkerConfig};
use crate::writer::{new_writer, Writer};

/// Runs the whole pipeline end to end, per `cfg`, under `root` -- the same
/// token the caller's signal handler cancels, here additionally decorated
/// with `cfg.timeout` so a signal and a timeout both cancel the one token
/// every strategy, walker task and output step polls. Returns the first
/// error surfaced through the walker's channel or from output, whichever
/// came first -- once one arrives the root token is cancelled so every
/// other in-flight task winds down without doing further useful work.
pub fn run(cfg: &GopiumConfig, root: &CancelToken) -> Result<(), GopiumError> {
    root.err()?;
    let decorated = root.clone().with_timeout(cfg.timeout);
    let root = &decorated;
    let strategy_refs: Vec<&str> = cfg.strategies.iter().map(String::as_str).collect();
    let pipeline: Arc<dyn Strategy> = Arc::new(build_pipeline(&strategy_refs, &cfg.platform, cfg.tag_type)?);
    let regex = Regex::new(&cfg.walker_regexp).map_err(|e| GopiumError::InvalidConfig(e.to_string()))?;

    let reference = Reference::new();
    let dir = Path::new(&cfg.package_path);
    let parser = RustParser::new();

    if is_sync_walker(&cfg.walker_name) {
        run_sync(cfg, root, dir, &parser, pipeline, regex, reference)
    } else {
        run_bytes(cfg, root, dir, &parser, pipeline, regex, reference)
    }
}

fn is_sync_walker(name: &str) -> bool {
    name.starts_with("sync_ast")
}

fn run_bytes(
    cfg: &GopiumConfig,
    root: &CancelToken,
    dir: &Path,
    parser: &RustParser,
    pipeline: Arc<dyn Strategy>,
    regex: Regex,
    reference: Reference,
) -> Result<(), GopiumError> {
    let (package, locator) = parser.parse_types(dir)?;
    let exposer: Arc<dyn Exposer> =
        Arc::new(StdSizes::new(cfg.platform).with_reference(reference.clone()));
    let config = WalkerConfig { deep: cfg.walker_deep, backref: cfg.walker_backref };
    let rx = walk(package, locator, regex, pipeline, exposer, reference, config, root.clone());

    let mut hier = Hierarchic::new();
    let mut first_err: Option<GopiumError> = None;
    for applied in rx.iter() {
        if let Some(err) = applied.err {
            tracing::error!(id = %applied.id, %err, "struct failed to apply");
            if first_err.is_none() {
                first_err = Some(err);
                root.cancel();
            }
            continue;
        }
        tracing::debug!(id = %applied.id, "struct applied");
        hier.insert(applied.loc, applied.id, applied.result);
    }
    if let Some(err) = first_err {
        return Err(err);
    }

    let flat = hier.flatten();
    let (bytes, ext): (Vec<u8>, &str) = match cfg.walker_name.as_str() {
        "json_std" | "json_files" => (serialize::jsonb(&flat)?, "json"),
        "xml_std" | "xml_files" => (serialize::xmlb(&flat)?, "xml"),
        "csv_std" | "csv_files" => (serialize::csvb(&flat)?, "csv"),
        "md_files" => (serialize::mdb(&flat)?, "md"),
        other => return Err(GopiumError::InvalidConfig(format!("unknown walker name {other:?}"))),
    };

    let is_std = cfg.walker_name.ends_with("_std");
    let name = if is_std { "-" } else { cfg.package_name.as_str() };
    let mut writer = new_writer(name, dir, if is_std { None } else { Some(ext) })?;
    writer.write(&bytes)?;
    writer.close()
}

fn run_sync(
    cfg: &GopiumConfig,
    root: &CancelToken,
    dir: &Path,
    parser: &RustParser,
    pipeline: Arc<dyn Strategy>,
    regex: Regex,
    reference: Reference,
) -> Result<(), GopiumError> {
    let (package, locator) = parser.parse_types(dir)?;
    let (mut ast, _) = parser.parse_ast(dir)?;
    let exposer: Arc<dyn Exposer> =
        Arc::new(StdSizes::new(cfg.platform).with_reference(reference.clone()));
    let config = WalkerConfig { deep: cfg.walker_deep, backref: cfg.walker_backref };
    let rx = walk(package, locator.clone(), regex, pipeline, exposer, reference, config, root.clone());

    let mut hier = Hierarchic::new();
    let mut first_err: Option<GopiumError> = None;
    for applied in rx.iter() {
        if let Some(err) = applied.err {
            tracing::error!(id = %applied.id, %err, "struct failed to apply");
            if first_err.is_none() {
                first_err = Some(err);
                root.cancel();
            }
            continue;
        }
        hier.insert(applied.loc, applied.id, applied.result);
    }
    if let Some(err) = first_err {
        return Err(err);
    }

    sync_apply(&mut ast, &locator, &hier)?;

    let printer = PrettyPlease;
    for (file, tree) in &ast.files {
        root.err()?;
        let mut writer = sync_writer(&cfg.walker_name, dir, file)?;
        printer.print(root, writer.as_mut(), tree)?;
    }
    Ok(())
}

/// `sync_ast` overwrites the original file in place; `sync_ast_std`
/// concatenates every rewritten file to stdout; `sync_ast_gopium` writes
/// beside the original as `<name>.gopium.rs`, leaving the source untouched
/// (the Rust-native variant -- there is no in-place rewrite risk when the
/// output always lands in a new file).
fn sync_writer(walker_name: &str, dir: &Path, file: &str) -> Result<Box<dyn Writer>, GopiumError> {
    match walker_name {
        "sync_ast_std" => new_writer("-", dir, None),
        "sync_ast_gopium" => {
            let stem = Path::new(file).file_stem().and_then(|s| s.to_str()).unwrap_or("out");
            new_writer(&format!("{stem}.gopium"), dir, Some("rs"))
        }
        _ => new_writer(file, dir, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_sync_walker_matches_all_three_variants() {
        assert!(is_sync_walker("sync_ast"));
        assert!(is_sync_walker("sync_ast_std"));
        assert!(is_sync_walker("sync_ast_gopium"));
        assert!(!is_sync_walker("json_std"));
    }
}
