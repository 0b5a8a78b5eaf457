//! The `gopium` struct-tag grammar and the one non-atomic strategy built on
//! it: `process_tag_group`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::context::CancelToken;
use crate::error::GopiumError;
use crate::model::{Struct, TAG_KEY};
use crate::platform::Platform;

use super::{build_pipeline, Strategy, TagType};

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"gopium:"([^"]*)""#).unwrap())
}

/// Reads the `gopium` key's value out of a field tag string. `Ok(None)`
/// means no `gopium` key is present at all; a `gopium:` substring whose
/// value isn't a well-formed quoted string is a `MalformedTag` error.
pub fn gopium_value(tag: &str) -> Result<Option<String>, GopiumError> {
    if let Some(caps) = tag_regex().captures(tag) {
        return Ok(Some(caps[1].to_string()));
    }
    if tag.contains(&format!("{TAG_KEY}:")) {
        return Err(GopiumError::MalformedTag(format!("malformed {TAG_KEY} tag: {tag:?}")));
    }
    Ok(None)
}

/// Splits a `gopium` tag value into its group name (empty = default) and
/// its comma-separated strategy name list, per the `stg,stg` /
/// `group:name;stg,stg` grammar.
pub fn split_group(value: &str) -> (String, Vec<String>) {
    if let Some(rest) = value.strip_prefix("group:") {
        if let Some((name, stgs)) = rest.split_once(';') {
            return (name.to_string(), split_names(stgs));
        }
    }
    (String::new(), split_names(value))
}

fn split_names(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

/// Writes `value` as the `gopium` tag on `tag`: force replaces an existing
/// value, soft leaves it, absence appends (non-empty `tag`) or sets (empty
/// `tag`).
pub fn write_tag(tag: &str, value: &str, force: bool) -> String {
    let fulltag = format!(r#"{TAG_KEY}:"{value}""#);
    match tag_regex().find(tag) {
        Some(m) if force => {
            let mut out = String::with_capacity(tag.len());
            out.push_str(&tag[..m.start()]);
            out.push_str(&fulltag);
            out.push_str(&tag[m.end()..]);
            out
        }
        Some(_) => tag.to_string(),
        None if !tag.is_empty() => format!("{tag} {fulltag}"),
        None => fulltag,
    }
}

/// Removes the `gopium:"..."` fragment from `tag`, normalizing whitespace.
pub fn remove_tag(tag: &str) -> String {
    let stripped = tag_regex().replace(tag, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `process_tag_group`: partitions a struct's fields by the group name in
/// their `gopium` tag, applies each group's own sub-pipeline, then
/// recombines -- default group first, then the rest lexicographically.
pub struct TagGroup {
    platform: Platform,
}

impl TagGroup {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl Strategy for TagGroup {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;

        let mut groups: BTreeMap<String, Vec<crate::model::Field>> = BTreeMap::new();
        let mut group_stgs: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for f in &s.fields {
            let value = gopium_value(&f.tag)?;
            let (group, names) = match value {
                Some(v) => split_group(&v),
                None => (String::new(), Vec::new()),
            };
            groups.entry(group.clone()).or_default().push(f.clone());
            if !names.is_empty() {
                group_stgs.entry(group).or_insert(names);
            }
        }

        let mut order: Vec<String> = groups.keys().cloned().collect();
        order.sort();
        if let Some(pos) = order.iter().position(String::is_empty) {
            let default = order.remove(pos);
            order.insert(0, default);
        }

        let mut out_name = s.name.clone();
        let mut out_doc = s.doc.clone();
        let mut out_comment = s.comment.clone();
        let mut out_fields = Vec::new();

        for group in order {
            ctx.err()?;
            let fields = groups.remove(&group).unwrap_or_default();
            let sub = Struct { name: s.name.clone(), doc: s.doc.clone(), comment: s.comment.clone(), fields };
            let names = group_stgs.get(&group).cloned().unwrap_or_default();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let pipeline = build_pipeline(&refs, &self.platform, TagType::None)
                .map_err(|e| GopiumError::MalformedTag(e.to_string()))?;
            let result = pipeline.apply(ctx, sub)?;
            if group.is_empty() {
                out_name = result.name;
                out_doc = result.doc;
                out_comment = result.comment;
            }
            out_fields.extend(result.fields);
        }

        Ok(Struct { name: out_name, doc: out_doc, comment: out_comment, fields: out_fields })
    }
}
