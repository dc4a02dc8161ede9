//! OPF（Open Packaging Format）文件解析模块
//!
//! 此模块提供EPUB文件中OPF包文件的解析功能，包括元数据、清单、脊柱等信息的提取，
//! 以及封面图片与目录导航文档的定位。

pub mod media_type;
mod manifest;
mod metadata;
mod parser;
mod spine;

pub use manifest::ManifestEntry;
pub use media_type::MediaType;
pub use metadata::{Creator, DublinCore, EventDate, Identifier, Meta, Metadata};
pub use parser::{CoverImage, NavDocument, NavKind, Package, parse_package};
pub(crate) use parser::attributes;
pub use spine::{Spine, SpineItem};
