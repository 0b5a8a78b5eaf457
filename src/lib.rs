//! gopium: a source-level struct layout optimizer. Parses a package of Rust
//! struct declarations, exposes each field's size and natural alignment,
//! and applies a composable pipeline of layout-transforming strategies --
//! packing, cache-line rounding, false-sharing avoidance, padding
//! annotation, sorting, filtering and tag-group dispatch -- producing
//! either a structured report (JSON/XML/CSV/Markdown) or a rewritten copy
//! of the source itself.
//!
//! ```
//! use gopium::model::{Field, Struct};
//! use gopium::strategies::{build_pipeline, TagType};
//! use gopium::platform::Platform;
//! use gopium::context::CancelToken;
//! use gopium::strategies::Strategy;
//!
//! let platform = Platform::default();
//! let pipeline = build_pipeline(&["memory_pack"], &platform, TagType::None).unwrap();
//! let s = Struct {
//!     name: "Example".to_string(),
//!     fields: vec![
//!         Field { name: "a".into(), r#type: "u8".into(), size: 1, align: 1, ..Default::default() },
//!         Field { name: "b".into(), r#type: "u64".into(), size: 8, align: 8, ..Default::default() },
//!     ],
//!     ..Default::default()
//! };
//! let packed = pipeline.apply(&CancelToken::new(), s).unwrap();
//! assert_eq!(packed.fields[0].name, "b");
//! ```

pub mod collections;
pub mod config;
pub mod context;
pub mod error;
pub mod exposer;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod platform;
pub mod printer;
pub mod rust_attrs;
pub mod serialize;
pub mod strategies;
pub mod sync_apply;
pub mod walker;
pub mod writer;

pub use config::GopiumConfig;
pub use context::CancelToken;
pub use error::GopiumError;
pub use model::{Struct, Field};
pub use platform::Platform;
