use serde::{Deserialize, Serialize};

/// The struct-tag key every gopium strategy reads and writes.
pub const TAG_KEY: &str = "gopium";

/// Stamp text, `doc_struct_stamp`/`comment_struct_stamp` append this.
pub const STAMP: &str = "gopium @core";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// An ordered sequence of fields; aggregate ordering is semantic since
/// reordering changes layout. Name plus optional doc/comment lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment: Vec<String>,
    pub fields: Vec<Field>,
}

/// One struct field. `name` may be empty (it isn't: padding fields use
/// `"_"`), `tag` is a space-separated `key:"value"` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub size: u64,
    pub align: u64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment: Vec<String>,
}

/// Builds a padding field: `Name = "_"`, `Type = "[N]byte"`, `Align = 1`,
/// not exported, not embedded. The one invariant every strategy that
/// inserts padding must uphold.
pub fn pad_field(size: u64) -> Field {
    Field {
        name: "_".to_string(),
        r#type: format!("[{}]byte", size),
        size,
        align: 1,
        ..Default::default()
    }
}

pub fn is_pad(f: &Field) -> bool {
    f.name == "_"
}
