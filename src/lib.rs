pub mod epub;
pub mod render;

// === 核心API重新导出 ===

/// 解析完成的书籍（主要接口）
pub use epub::Book;

/// 错误处理
pub use epub::{EpubError, ErrorKind, Result};

/// 解析配置
pub use epub::ParserConfig;

// === 底层组件（高级用法） ===

/// 归档与容器组件
pub use epub::{Archive, Container, RootFile};

/// OPF组件
pub use epub::{CoverImage, Creator, Identifier, ManifestEntry, Metadata, Spine, SpineItem};

/// 目录组件
pub use epub::{FlatTocEntry, TocEntry, TocStatistics, TocTree, TocTreeStyle};

/// 媒体覆盖组件
pub use epub::{SmilDocument, SmilElement};

/// 渲染组件
pub use render::{BookRenderer, TextSummary, YamlDump};

// === 库信息 ===

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// === 便捷函数 ===

/// 使用默认配置解析EPUB文件
///
/// 这是 `Book::assemble` 的便捷包装函数。
///
/// # 示例
///
/// ```no_run
/// let book = epubcore::assemble("book.epub")?;
/// println!("书名: {}", book.title());
/// for entry in book.flat_toc() {
///     println!("{}{}", "  ".repeat(entry.depth), entry.title);
/// }
/// # Ok::<(), epubcore::EpubError>(())
/// ```
pub fn assemble<P: AsRef<std::path::Path>>(path: P) -> Result<Book> {
    Book::assemble(path)
}

/// 快速打开EPUB文件，等同于 [`assemble`]
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Book> {
    Book::assemble(path)
}
