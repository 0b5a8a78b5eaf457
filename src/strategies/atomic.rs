//! The atomic strategies: every named transform the registry can build
//! except `process_tag_group`, which lives in `tag.rs` since it needs to
//! recurse back into the registry.

use crate::context::CancelToken;
use crate::error::GopiumError;
use crate::layout;
use crate::model::{self, pad_field, Field, Struct};
use crate::platform::Platform;

use super::{tag, Strategy};

pub struct MemoryPack;

impl Strategy for MemoryPack {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let mut idx: Vec<usize> = (0..s.fields.len()).filter(|&i| !model::is_pad(&s.fields[i])).collect();
        idx.sort_by(|&a, &b| s.fields[b].align.cmp(&s.fields[a].align).then(a.cmp(&b)));
        let fields = idx.into_iter().map(|i| s.fields[i].clone()).collect();
        Ok(Struct { fields, ..s })
    }
}

pub struct MemoryUnpack;

impl Strategy for MemoryUnpack {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let mut idx: Vec<usize> = (0..s.fields.len()).filter(|&i| !model::is_pad(&s.fields[i])).collect();
        idx.sort_by(|&a, &b| s.fields[a].align.cmp(&s.fields[b].align).then(a.cmp(&b)));
        let fields = idx.into_iter().map(|i| s.fields[i].clone()).collect();
        Ok(Struct { fields, ..s })
    }
}

/// `None` means "natural" (`max(Field.Align)`), `Some(a)` means a fixed
/// override (system alignment). Materializes every implicit pre-field pad,
/// never a trailing one.
pub struct ExplicitPad {
    struct_align_override: Option<u64>,
}

impl ExplicitPad {
    pub fn new(struct_align_override: Option<u64>) -> Self {
        Self { struct_align_override }
    }
}

impl Strategy for ExplicitPad {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let mut fields = Vec::with_capacity(s.fields.len() * 2);
        layout::walk_struct(&s, 0, self.struct_align_override, |pad, fs| {
            if let Some(f) = fs.first() {
                if pad > 0 {
                    fields.push(pad_field(pad));
                }
                fields.push(f.clone());
            }
        });
        Ok(Struct { fields, ..s })
    }
}

pub struct CacheRounding {
    level: u8,
    discrete: bool,
    platform: Platform,
}

impl CacheRounding {
    pub fn new(level: u8, discrete: bool, platform: Platform) -> Self {
        Self { level, discrete, platform }
    }
}

impl Strategy for CacheRounding {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let l = self.platform.sys_cache(self.level);
        if l == 0 {
            return Ok(s);
        }
        let fp = layout::footprint(&s);
        let mut cachel = l;
        if self.discrete && fp > 0 && cachel > fp {
            while cachel >= fp && cachel > 1 {
                cachel /= 2;
            }
            cachel *= 2;
        }
        let rem = fp % cachel;
        let mut fields = s.fields.clone();
        if rem != 0 {
            fields.push(pad_field(cachel - rem));
        }
        Ok(Struct { fields, ..s })
    }
}

pub struct FalseSharing {
    level: u8,
    platform: Platform,
}

impl FalseSharing {
    pub fn new(level: u8, platform: Platform) -> Self {
        Self { level, platform }
    }
}

impl Strategy for FalseSharing {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let l = self.platform.sys_cache(self.level);
        if l == 0 {
            return Ok(s);
        }
        let mut fields = Vec::with_capacity(s.fields.len() * 2);
        let mut o = 0u64;
        for f in &s.fields {
            let a = f.align.max(1);
            let pad = layout::align_up(o, a) - o;
            if pad > 0 {
                fields.push(pad_field(pad));
                o += pad;
            }
            fields.push(f.clone());
            o += f.size;
            let tail = layout::align_up(o, l) - o;
            if tail > 0 {
                fields.push(pad_field(tail));
                o += tail;
            }
        }
        Ok(Struct { fields, ..s })
    }
}

#[derive(Clone, Copy)]
pub enum SepBasis {
    SysAlign,
    Cache(u8),
}

pub struct SeparatePadding {
    basis: SepBasis,
    top: bool,
    platform: Platform,
}

impl SeparatePadding {
    pub fn new(basis: SepBasis, top: bool, platform: Platform) -> Self {
        Self { basis, top, platform }
    }
}

impl Strategy for SeparatePadding {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let size = match self.basis {
            SepBasis::SysAlign => self.platform.sys_align(),
            SepBasis::Cache(k) => self.platform.sys_cache(k),
        };
        if size == 0 {
            return Ok(s);
        }
        let mut fields = s.fields.clone();
        if self.top {
            fields.insert(0, pad_field(size));
        } else {
            fields.push(pad_field(size));
        }
        Ok(Struct { fields, ..s })
    }
}

pub enum FilterKind {
    Pads,
    Embedded,
    NotEmbedded,
    Exported,
    NotExported,
}

pub struct Filter(FilterKind);

impl Filter {
    pub fn new(kind: FilterKind) -> Self {
        Self(kind)
    }
}

impl Strategy for Filter {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let keep = |f: &Field| match self.0 {
            FilterKind::Pads => !model::is_pad(f),
            FilterKind::Embedded => !f.embedded,
            FilterKind::NotEmbedded => f.embedded,
            FilterKind::Exported => !f.exported,
            FilterKind::NotExported => f.exported,
        };
        let fields = s.fields.iter().filter(|f| keep(f)).cloned().collect();
        Ok(Struct { fields, ..s })
    }
}

fn stable_sort(fields: &[Field], desc: bool, cmp: impl Fn(&Field, &Field) -> std::cmp::Ordering) -> Vec<Field> {
    let mut idx: Vec<usize> = (0..fields.len()).collect();
    idx.sort_by(|&a, &b| {
        let ord = cmp(&fields[a], &fields[b]);
        if desc {
            ord.reverse()
        } else {
            ord
        }
    });
    idx.into_iter().map(|i| fields[i].clone()).collect()
}

pub struct SortName {
    by_length: bool,
    desc: bool,
}

impl SortName {
    pub fn new(by_length: bool, desc: bool) -> Self {
        Self { by_length, desc }
    }
}

impl Strategy for SortName {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let fields = stable_sort(&s.fields, self.desc, |a, b| {
            if self.by_length {
                a.name.chars().count().cmp(&b.name.chars().count())
            } else {
                a.name.cmp(&b.name)
            }
        });
        Ok(Struct { fields, ..s })
    }
}

pub struct SortType {
    by_length: bool,
    desc: bool,
}

impl SortType {
    pub fn new(by_length: bool, desc: bool) -> Self {
        Self { by_length, desc }
    }
}

impl Strategy for SortType {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let fields = stable_sort(&s.fields, self.desc, |a, b| {
            if self.by_length {
                a.r#type.chars().count().cmp(&b.r#type.chars().count())
            } else {
                a.r#type.cmp(&b.r#type)
            }
        });
        Ok(Struct { fields, ..s })
    }
}

pub enum SortBoolKey {
    Embedded,
    Exported,
}

pub struct SortBool {
    key: SortBoolKey,
    desc: bool,
}

impl SortBool {
    pub fn new(key: SortBoolKey, desc: bool) -> Self {
        Self { key, desc }
    }
}

impl Strategy for SortBool {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let fields = stable_sort(&s.fields, self.desc, |a, b| match self.key {
            SortBoolKey::Embedded => a.embedded.cmp(&b.embedded),
            SortBoolKey::Exported => a.exported.cmp(&b.exported),
        });
        Ok(Struct { fields, ..s })
    }
}

pub struct FieldsAnnotate {
    to_doc: bool,
}

impl FieldsAnnotate {
    pub fn new(to_doc: bool) -> Self {
        Self { to_doc }
    }
}

impl Strategy for FieldsAnnotate {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let (stsize, stalign) = layout::size_align(&s);
        let aligned = layout::align_up(stsize, stalign.max(1));
        let fields = s
            .fields
            .iter()
            .map(|f| {
                let mut nf = f.clone();
                let line = format!("// field size: {} bytes; field align: {} bytes;", f.size, f.align);
                if self.to_doc {
                    nf.doc.insert(0, line);
                } else {
                    nf.comment.insert(0, line);
                }
                nf
            })
            .collect();
        let mut out = Struct { fields, ..s };
        let line = format!(
            "// struct size: {stsize} bytes; struct align: {stalign} bytes; struct aligned size: {aligned} bytes;"
        );
        if self.to_doc {
            out.doc.push(line);
        } else {
            out.comment.push(line);
        }
        Ok(out)
    }
}

pub struct StructStamp {
    to_doc: bool,
}

impl StructStamp {
    pub fn new(to_doc: bool) -> Self {
        Self { to_doc }
    }
}

impl Strategy for StructStamp {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let line = format!("// struct has been auto curated by gopium - {}", model::STAMP);
        let mut out = s;
        if self.to_doc {
            out.doc.push(line);
        } else {
            out.comment.push(line);
        }
        Ok(out)
    }
}

pub struct AddTagGroup {
    names: Vec<String>,
    force: bool,
    discrete: bool,
}

impl AddTagGroup {
    pub fn new(names: Vec<String>, force: bool, discrete: bool) -> Self {
        Self { names, force, discrete }
    }
}

impl Strategy for AddTagGroup {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let base = self.names.join(",");
        let fields = s
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let mut nf = f.clone();
                let value = if self.discrete {
                    format!("group:{}-{};{}", model::TAG_KEY, i + 1, base)
                } else {
                    base.clone()
                };
                nf.tag = tag::write_tag(&f.tag, &value, self.force);
                nf
            })
            .collect();
        Ok(Struct { fields, ..s })
    }
}

pub struct RemoveTagGroup;

impl Strategy for RemoveTagGroup {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        let fields = s
            .fields
            .iter()
            .map(|f| {
                let mut nf = f.clone();
                nf.tag = tag::remove_tag(&f.tag);
                nf
            })
            .collect();
        Ok(Struct { fields, ..s })
    }
}

pub struct Nope;

impl Strategy for Nope {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        Ok(s)
    }
}

pub struct Void;

impl Strategy for Void {
    fn apply(&self, ctx: &CancelToken, _s: Struct) -> Result<Struct, GopiumError> {
        ctx.err()?;
        Ok(Struct::default())
    }
}
