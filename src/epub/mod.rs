pub mod archive;
pub mod book;
pub mod config;
pub mod container;
pub mod error;
pub mod nav;
pub mod opf;
pub mod path;
pub mod smil;

#[cfg(test)]
pub(crate) mod test_support;

// 重新导出错误处理
pub use error::{EpubError, ErrorKind, Result};

pub use archive::Archive;
pub use book::Book;
pub use config::ParserConfig;
pub use container::{Container, RootFile};

// 重新导出OPF相关
pub use opf::{
    CoverImage,
    Creator,
    Identifier,
    ManifestEntry,
    Metadata,
    NavDocument,
    NavKind,
    Spine,
    SpineItem,
};

pub use smil::{SmilDocument, SmilElement};

// 重新导出目录相关
pub use nav::{
    FlatTocEntry,
    TocEntry,
    TocStatistics,
    TocTree,
    TocTreeStyle,
};
