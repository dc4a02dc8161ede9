//! 书籍渲染
//!
//! 解析器本身从不调用这里的代码，外层（如命令行工具）通过 [`BookRenderer`] 选择输出方式。

use std::fmt::Write;

use crate::epub::{Book, TocTreeStyle};

/// 把书籍渲染为文本的能力
pub trait BookRenderer {
    fn render(&self, book: &Book) -> String;
}

/// 人类可读的书籍摘要
#[derive(Debug, Clone, Default)]
pub struct TextSummary {
    /// 显示完整元数据
    pub show_metadata: bool,
    /// 显示层级目录
    pub show_toc: bool,
    /// 显示展平目录
    pub show_flat_toc: bool,
    /// 目录显示样式
    pub style: TocTreeStyle,
    /// 目录最大显示深度
    pub max_depth: Option<usize>,
}

impl TextSummary {
    fn write_metadata(&self, book: &Book, out: &mut String) -> std::fmt::Result {
        let metadata = book.metadata();
        writeln!(out, "\n📊 元数据:")?;

        let creators = metadata.creators();
        if !creators.is_empty() {
            writeln!(out, "  作者:")?;
            for (i, creator) in creators.iter().enumerate() {
                let mut line = format!("    {}. {}", i + 1, creator.name);
                if let Some(role) = &creator.role {
                    line.push_str(&format!(" ({})", role));
                }
                if let Some(file_as) = &creator.file_as {
                    line.push_str(&format!(" [排序: {}]", file_as));
                }
                writeln!(out, "{}", line)?;
            }
        }

        if let Some(language) = metadata.language() {
            writeln!(out, "  语言: {}", language)?;
        }
        for publisher in metadata.publishers() {
            writeln!(out, "  出版社: {}", publisher)?;
        }
        for date in metadata.dates() {
            match &date.event {
                Some(event) => writeln!(out, "  日期: {} ({})", date.date, event)?,
                None => writeln!(out, "  日期: {}", date.date)?,
            }
        }
        for description in metadata.descriptions() {
            writeln!(out, "  描述: {}", description)?;
        }

        let identifiers = metadata.identifiers();
        if !identifiers.is_empty() {
            writeln!(out, "  标识符:")?;
            for identifier in &identifiers {
                match &identifier.scheme {
                    Some(scheme) => writeln!(out, "    - {} ({})", identifier.value, scheme)?,
                    None => writeln!(out, "    - {}", identifier.value)?,
                }
            }
        }

        let subjects = metadata.subjects();
        if !subjects.is_empty() {
            writeln!(out, "  主题: {}", subjects.join(", "))?;
        }
        for rights in metadata.rights() {
            writeln!(out, "  版权: {}", rights)?;
        }

        let contributors = metadata.contributors();
        if !contributors.is_empty() {
            writeln!(out, "  贡献者:")?;
            for contributor in &contributors {
                match &contributor.role {
                    Some(role) => writeln!(out, "    - {} ({})", contributor.name, role)?,
                    None => writeln!(out, "    - {}", contributor.name)?,
                }
            }
        }
        Ok(())
    }

    fn write_summary(&self, book: &Book, out: &mut String) -> std::fmt::Result {
        writeln!(out, "📖 {}", book.title())?;
        writeln!(out, "✍️  {}", book.author())?;
        writeln!(out, "  EPUB版本: {}", book.version())?;
        if let Some(identifier) = book.unique_identifier() {
            writeln!(out, "  唯一标识符: {}", identifier)?;
        }
        writeln!(out, "  包文档: {}", book.package_path())?;
        writeln!(
            out,
            "  清单项目: {} 个, 脊柱项目: {} 个 (线性 {} 个)",
            book.manifest().len(),
            book.spine().len(),
            book.reading_order().len()
        )?;
        if let Some(direction) = book.page_progression_direction() {
            writeln!(out, "  翻页方向: {}", direction)?;
        }
        match book.cover_image() {
            Some(cover) => writeln!(
                out,
                "  🖼️  封面: {} ({}, {} 字节)",
                cover.full_path,
                cover.media_type,
                book.cover_image_bytes().map_or(0, <[u8]>::len)
            )?,
            None => writeln!(out, "  🖼️  封面: 无")?,
        }
        writeln!(out, "  {}", book.toc().statistics())?;
        if !book.media_overlays().is_empty() {
            writeln!(out, "  🔊 媒体覆盖: {} 个SMIL文档", book.media_overlays().len())?;
        }

        if self.show_metadata {
            self.write_metadata(book, out)?;
        }

        if self.show_toc {
            writeln!(out, "\n🌳 目录:")?;
            write!(
                out,
                "{}",
                book.toc().display().with_style(self.style).with_max_depth(self.max_depth)
            )?;
        }

        if self.show_flat_toc {
            writeln!(out, "\n📑 展平目录:")?;
            for (index, entry) in book.flat_toc().iter().enumerate() {
                if self.max_depth.is_some_and(|max| entry.depth >= max) {
                    continue;
                }
                let target = entry.href.as_deref().unwrap_or("-");
                writeln!(out, "  {:>3}. [{}] {} → {}", index + 1, entry.depth, entry.title, target)?;
            }
        }
        Ok(())
    }
}

impl BookRenderer for TextSummary {
    fn render(&self, book: &Book) -> String {
        let mut out = String::new();
        // 写入String不会失败
        let _ = self.write_summary(book, &mut out);
        out
    }
}

/// 把整本书（封面字节除外）序列化为YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDump;

impl BookRenderer for YamlDump {
    fn render(&self, book: &Book) -> String {
        match serde_yml::to_string(book) {
            Ok(yaml) => yaml,
            Err(e) => format!("# YAML序列化失败: {}\n", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::test_support::EpubFixture;

    fn minimal_book() -> Book {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal().write_to(dir.path(), "render.epub");
        Book::assemble(&path).unwrap()
    }

    #[test]
    fn test_text_summary() {
        let book = minimal_book();
        let summary = TextSummary {
            show_metadata: true,
            show_toc: true,
            ..TextSummary::default()
        };
        let text = summary.render(&book);
        assert!(text.starts_with("📖 测试书籍\n"));
        assert!(text.contains("测试作者"));
        assert!(text.contains("封面: 无"));
        assert!(text.contains("urn:uuid:0000"));
    }

    #[test]
    fn test_yaml_dump() {
        let book = minimal_book();
        let yaml = YamlDump.render(&book);
        assert!(yaml.contains("title: 测试书籍"));
        assert!(yaml.contains("package_path: OEBPS/content.opf"));
        assert!(!yaml.contains("cover_image_bytes"));
    }
}
