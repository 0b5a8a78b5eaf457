//! The strategy algebra: pure, composable struct transforms plus the
//! registry that turns a list of names into a pipeline.

mod atomic;
mod tag;

pub use tag::{gopium_value, remove_tag, split_group, write_tag};

use crate::context::CancelToken;
use crate::error::GopiumError;
use crate::model::Struct;
use crate::platform::Platform;

/// A pure transform `apply(ctx, Struct) -> (Struct, Error)`. Implementations
/// never mutate their input and never block; the only suspension point is
/// the cancellation check at entry.
pub trait Strategy: Send + Sync {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError>;
}

/// Sequential fold `S = s_n . ... . s_1`; a strategy that errors
/// short-circuits the remaining stages.
pub struct Pipeline(Vec<Box<dyn Strategy>>);

impl Pipeline {
    pub fn new(stgs: Vec<Box<dyn Strategy>>) -> Self {
        Pipeline(stgs)
    }

    pub fn empty() -> Self {
        Pipeline(Vec::new())
    }
}

impl Strategy for Pipeline {
    fn apply(&self, ctx: &CancelToken, s: Struct) -> Result<Struct, GopiumError> {
        self.0.iter().try_fold(s, |acc, stg| stg.apply(ctx, acc))
    }
}

/// `tag_type` CLI value: whether (and how) to prepend a tag-writing
/// strategy to every pipeline the registry builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    None,
    Soft,
    Force,
}

impl TagType {
    pub fn parse(s: &str) -> Result<Self, GopiumError> {
        match s {
            "none" => Ok(TagType::None),
            "soft" => Ok(TagType::Soft),
            "force" => Ok(TagType::Force),
            other => Err(GopiumError::InvalidConfig(format!(
                "unknown tag_type {other:?}, expected none|soft|force"
            ))),
        }
    }
}

/// Builds a pipeline from a list of strategy names looked up in the
/// registry below. `tag_type`, when not `None`, prepends a tag
/// strategy that records the rest of `names` on every field -- the same
/// mechanism an explicit `add_tag_group_*` name in `names` uses, so both
/// paths stamp fields with the same sibling-strategy list.
pub fn build_pipeline(
    names: &[&str],
    platform: &Platform,
    tag_type: TagType,
) -> Result<Pipeline, GopiumError> {
    let siblings: Vec<String> = names
        .iter()
        .filter(|n| !is_tag_writer(n))
        .map(|n| n.to_string())
        .collect();

    let mut stgs = Vec::with_capacity(names.len() + 1);
    if let Some(prelude) = tag_prelude(tag_type, &siblings) {
        stgs.push(prelude);
    }
    for name in names {
        stgs.push(build_one(name, platform, &siblings)?);
    }
    Ok(Pipeline::new(stgs))
}

fn is_tag_writer(name: &str) -> bool {
    name.starts_with("add_tag_group") || *name == "process_tag_group"
}

fn tag_prelude(tag_type: TagType, siblings: &[String]) -> Option<Box<dyn Strategy>> {
    match tag_type {
        TagType::None => None,
        TagType::Soft => Some(Box::new(atomic::AddTagGroup::new(siblings.to_vec(), false, false))),
        TagType::Force => Some(Box::new(atomic::AddTagGroup::new(siblings.to_vec(), true, false))),
    }
}

fn build_one(name: &str, platform: &Platform, siblings: &[String]) -> Result<Box<dyn Strategy>, GopiumError> {
    use atomic::*;

    Ok(match name {
        "process_tag_group" => Box::new(tag::TagGroup::new(platform.clone())),

        "memory_pack" => Box::new(MemoryPack),
        "memory_unpack" => Box::new(MemoryUnpack),

        "cache_rounding_cpu_l1" => Box::new(CacheRounding::new(1, false, platform.clone())),
        "cache_rounding_cpu_l2" => Box::new(CacheRounding::new(2, false, platform.clone())),
        "cache_rounding_cpu_l3" => Box::new(CacheRounding::new(3, false, platform.clone())),
        "cache_rounding_cpu_l1_discrete" => Box::new(CacheRounding::new(1, true, platform.clone())),
        "cache_rounding_cpu_l2_discrete" => Box::new(CacheRounding::new(2, true, platform.clone())),
        "cache_rounding_cpu_l3_discrete" => Box::new(CacheRounding::new(3, true, platform.clone())),

        "false_sharing_cpu_l1" => Box::new(FalseSharing::new(1, platform.clone())),
        "false_sharing_cpu_l2" => Box::new(FalseSharing::new(2, platform.clone())),
        "false_sharing_cpu_l3" => Box::new(FalseSharing::new(3, platform.clone())),

        "separate_padding_system_alignment_top" => Box::new(SeparatePadding::new(SepBasis::SysAlign, true, platform.clone())),
        "separate_padding_system_alignment_bottom" => Box::new(SeparatePadding::new(SepBasis::SysAlign, false, platform.clone())),
        "separate_padding_cpu_l1_top" => Box::new(SeparatePadding::new(SepBasis::Cache(1), true, platform.clone())),
        "separate_padding_cpu_l1_bottom" => Box::new(SeparatePadding::new(SepBasis::Cache(1), false, platform.clone())),
        "separate_padding_cpu_l2_top" => Box::new(SeparatePadding::new(SepBasis::Cache(2), true, platform.clone())),
        "separate_padding_cpu_l2_bottom" => Box::new(SeparatePadding::new(SepBasis::Cache(2), false, platform.clone())),
        "separate_padding_cpu_l3_top" => Box::new(SeparatePadding::new(SepBasis::Cache(3), true, platform.clone())),
        "separate_padding_cpu_l3_bottom" => Box::new(SeparatePadding::new(SepBasis::Cache(3), false, platform.clone())),

        "explicit_padings_system_alignment" => Box::new(ExplicitPad::new(Some(platform.sys_align()))),
        "explicit_padings_type_natural" => Box::new(ExplicitPad::new(None)),

        "doc_fields_annotate" => Box::new(FieldsAnnotate::new(true)),
        "comment_fields_annotate" => Box::new(FieldsAnnotate::new(false)),
        "doc_struct_stamp" => Box::new(StructStamp::new(true)),
        "comment_struct_stamp" => Box::new(StructStamp::new(false)),

        "name_lexicographical_ascending" => Box::new(SortName::new(false, false)),
        "name_lexicographical_descending" => Box::new(SortName::new(false, true)),
        "name_length_ascending" => Box::new(SortName::new(true, false)),
        "name_length_descending" => Box::new(SortName::new(true, true)),
        "type_lexicographical_ascending" => Box::new(SortType::new(false, false)),
        "type_lexicographical_descending" => Box::new(SortType::new(false, true)),
        "type_length_ascending" => Box::new(SortType::new(true, false)),
        "type_length_descending" => Box::new(SortType::new(true, true)),

        "embedded_ascending" => Box::new(SortBool::new(SortBoolKey::Embedded, false)),
        "embedded_descending" => Box::new(SortBool::new(SortBoolKey::Embedded, true)),
        "exported_ascending" => Box::new(SortBool::new(SortBoolKey::Exported, false)),
        "exported_descending" => Box::new(SortBool::new(SortBoolKey::Exported, true)),

        "filter_pads" => Box::new(Filter::new(FilterKind::Pads)),
        "filter_embedded" => Box::new(Filter::new(FilterKind::Embedded)),
        "filter_not_embedded" => Box::new(Filter::new(FilterKind::NotEmbedded)),
        "filter_exported" => Box::new(Filter::new(FilterKind::Exported)),
        "filter_not_exported" => Box::new(Filter::new(FilterKind::NotExported)),

        "add_tag_group_soft" => Box::new(AddTagGroup::new(siblings.to_vec(), false, false)),
        "add_tag_group_force" => Box::new(AddTagGroup::new(siblings.to_vec(), true, false)),
        "add_tag_group_soft_discrete" => Box::new(AddTagGroup::new(siblings.to_vec(), false, true)),
        "add_tag_group_force_discrete" => Box::new(AddTagGroup::new(siblings.to_vec(), true, true)),
        "remove_tag_group" => Box::new(RemoveTagGroup),

        "nope" => Box::new(Nope),
        "void" => Box::new(Void),

        other => {
            return Err(GopiumError::InvalidConfig(format!(
                "unknown strategy name {other:?}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn field(name: &str, size: u64, align: u64) -> Field {
        Field { name: name.to_string(), size, align, ..Default::default() }
    }

    #[test]
    fn unknown_strategy_name_is_invalid_config() {
        let platform = Platform::default();
        let err = build_pipeline(&["bogus_strategy"], &platform, TagType::None).unwrap_err();
        assert!(matches!(err, GopiumError::InvalidConfig(_)));
    }

    #[test]
    fn pipeline_composes_in_order() {
        // memory_pack then filter_pads: pack first produces no pads, so
        // this mostly checks that both stages actually ran in sequence.
        let platform = Platform::default();
        let pipeline = build_pipeline(&["memory_pack", "filter_pads"], &platform, TagType::None).unwrap();
        let s = Struct {
            name: "S".into(),
            fields: vec![field("a", 1, 1), field("b", 8, 8), field("c", 1, 1)],
            ..Default::default()
        };
        let ctx = CancelToken::new();
        let r = pipeline.apply(&ctx, s).unwrap();
        assert_eq!(r.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }
}
