//! 书籍模型
//!
//! 把归档、容器、包文档和导航文档的解析结果组装为一个不可变的 [`Book`]。

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info_span, warn};

use crate::epub::archive::Archive;
use crate::epub::config::ParserConfig;
use crate::epub::container;
use crate::epub::error::{EpubError, Result};
use crate::epub::nav::{self, FlatTocEntry, TocTree};
use crate::epub::opf::{self, CoverImage, ManifestEntry, Metadata, Package, Spine};
use crate::epub::smil::{self, SmilDocument};

/// 解析完成的书籍
///
/// 与归档文件没有任何关联，可以在线程间自由传递。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    title: String,
    author: String,
    metadata: Metadata,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unique_identifier: Option<String>,
    package_path: String,
    manifest: BTreeMap<String, ManifestEntry>,
    spine: Spine,
    toc: TocTree,
    flat_toc: Vec<FlatTocEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_image: Option<CoverImage>,
    #[serde(skip)]
    cover_image_bytes: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_progression_direction: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media_overlays: Vec<SmilDocument>,
}

impl Book {
    /// 使用默认配置解析EPUB文件
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<Book>` - 任一阶段的致命错误都会直接返回，不会产生部分结果
    pub fn assemble<P: AsRef<Path>>(path: P) -> Result<Book> {
        Self::assemble_with_config(path, &ParserConfig::default())
    }

    /// 使用指定配置解析EPUB文件
    pub fn assemble_with_config<P: AsRef<Path>>(path: P, config: &ParserConfig) -> Result<Book> {
        let path = path.as_ref();
        let span = info_span!("assemble", path = %path.display());
        let _guard = span.enter();

        let mut archive = Archive::open_with_config(path, config)?;
        let root_path = container::resolve_root_path(&mut archive)?;
        let package = opf::parse_package(&mut archive, &root_path)?;

        Self::check_spine_documents(&archive, &package)?;

        let toc = match package.nav_document() {
            Some(nav_document) => nav::parse_toc(&mut archive, &nav_document, &package.manifest)?,
            None => {
                warn!("包文档中没有导航文档，目录为空");
                TocTree::default()
            }
        };

        let media_overlays = smil::parse_media_overlays(&mut archive, &package)?;

        let (cover_image, cover_image_bytes) = match package.cover_image(config) {
            Some(cover) => match archive.read_entry(&cover.full_path) {
                Ok(bytes) => (Some(cover), Some(bytes)),
                Err(EpubError::EntryNotFound(entry)) => {
                    warn!(entry = %entry, "封面图片不在归档中");
                    (None, None)
                }
                Err(e) => return Err(e),
            },
            None => {
                warn!("没有找到封面图片");
                (None, None)
            }
        };

        let flat_toc = toc.flatten();
        debug!(
            spine = package.spine.len(),
            toc = flat_toc.len(),
            cover = cover_image.is_some(),
            media_overlays = media_overlays.len(),
            "书籍组装完成"
        );

        Ok(Book {
            title: package.title(),
            author: package.author(),
            unique_identifier: package.unique_identifier(),
            page_progression_direction: package.spine.page_progression_direction.clone(),
            version: package.version,
            package_path: package.path,
            metadata: package.metadata,
            manifest: package.manifest,
            spine: package.spine,
            toc,
            flat_toc,
            cover_image,
            cover_image_bytes,
            media_overlays,
        })
    }

    /// 脊柱引用的每个文档都必须存在于归档中
    fn check_spine_documents(archive: &Archive, package: &Package) -> Result<()> {
        for item in &package.spine.items {
            let entry = package.manifest_entry(&item.idref).ok_or_else(|| {
                EpubError::MalformedPackage(format!("脊柱引用了不存在的清单项: {}", item.idref))
            })?;
            if !archive.contains(&entry.full_path) {
                return Err(EpubError::EntryNotFound(entry.full_path.clone()));
            }
        }
        Ok(())
    }

    /// 获取标题，缺失时为空字符串
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 获取第一作者，缺失时为空字符串
    pub fn author(&self) -> &str {
        &self.author
    }

    /// 获取完整元数据
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// EPUB版本（package元素的version属性）
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn unique_identifier(&self) -> Option<&str> {
        self.unique_identifier.as_deref()
    }

    /// 包文档在归档中的路径
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    pub fn manifest(&self) -> &BTreeMap<String, ManifestEntry> {
        &self.manifest
    }

    /// 根据ID获取清单项
    pub fn manifest_entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.get(id)
    }

    pub fn spine(&self) -> &Spine {
        &self.spine
    }

    /// 按脊柱顺序获取所有清单项，包括非线性项目
    pub fn spine_entries(&self) -> Vec<&ManifestEntry> {
        self.spine
            .items
            .iter()
            .filter_map(|item| self.manifest.get(&item.idref))
            .collect()
    }

    /// 默认阅读顺序：只包含线性脊柱项
    pub fn reading_order(&self) -> Vec<&ManifestEntry> {
        self.spine
            .linear_items()
            .filter_map(|item| self.manifest.get(&item.idref))
            .collect()
    }

    /// 层级目录
    pub fn toc(&self) -> &TocTree {
        &self.toc
    }

    /// 前序展平的目录
    pub fn flat_toc(&self) -> &[FlatTocEntry] {
        &self.flat_toc
    }

    /// 封面图片引用
    pub fn cover_image(&self) -> Option<&CoverImage> {
        self.cover_image.as_ref()
    }

    /// 封面图片的原始字节
    pub fn cover_image_bytes(&self) -> Option<&[u8]> {
        self.cover_image_bytes.as_deref()
    }

    /// 翻页方向（`ltr`、`rtl` 或 `default`）
    pub fn page_progression_direction(&self) -> Option<&str> {
        self.page_progression_direction.as_deref()
    }

    /// 清单中全部可用的SMIL媒体覆盖文档
    pub fn media_overlays(&self) -> &[SmilDocument] {
        &self.media_overlays
    }

    /// 指定清单项通过 `media-overlay` 属性关联的SMIL文档
    pub fn media_overlay_for(&self, manifest_id: &str) -> Option<&SmilDocument> {
        let overlay = self.manifest.get(manifest_id)?.media_overlay.as_deref()?;
        self.media_overlays.iter().find(|doc| doc.manifest_id == overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::error::ErrorKind;
    use crate::epub::test_support::{CHAPTER_XHTML, EpubFixture};

    const OPF_WITH_EXTRAS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Extras</dc:title>
    <dc:creator>Someone</dc:creator>
    <dc:identifier id="uid">isbn-1</dc:identifier>
    <meta name="cover" content="cover-img"/>
  </metadata>
  <manifest>
    <item id="cover-img" href="images/cover.png" media-type="image/png"/>
    <item id="front" href="front.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx" page-progression-direction="ltr">
    <itemref idref="front" linear="no"/>
    <itemref idref="ch1"/>
  </spine>
</package>"#;

    const NCX: &str = r#"<ncx><navMap>
  <navPoint><navLabel><text>Chapter 1</text></navLabel><content src="ch1.xhtml"/></navPoint>
</navMap></ncx>"#;

    fn extras_fixture() -> EpubFixture {
        EpubFixture::minimal()
            .with_file("OEBPS/content.opf", OPF_WITH_EXTRAS)
            .with_file("OEBPS/front.xhtml", CHAPTER_XHTML)
            .with_file("OEBPS/ch1.xhtml", CHAPTER_XHTML)
            .with_file("OEBPS/toc.ncx", NCX)
            .with_file("OEBPS/images/cover.png", b"\x89PNG fake".to_vec())
    }

    #[test]
    fn test_assemble_minimal() {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal().write_to(dir.path(), "minimal.epub");

        let book = Book::assemble(&path).unwrap();
        assert_eq!(book.title(), "测试书籍");
        assert_eq!(book.author(), "测试作者");
        assert_eq!(book.unique_identifier(), Some("urn:uuid:0000"));
        assert_eq!(book.package_path(), "OEBPS/content.opf");
        assert_eq!(book.spine_entries().len(), 1);
        assert!(book.toc().is_empty());
        assert!(book.flat_toc().is_empty());
        assert!(book.cover_image().is_none());
        assert!(book.cover_image_bytes().is_none());
    }

    #[test]
    fn test_assemble_with_extras() {
        let dir = tempfile::tempdir().unwrap();
        let path = extras_fixture().write_to(dir.path(), "extras.epub");

        let book = Book::assemble(&path).unwrap();
        assert_eq!(book.version(), "2.0");
        assert_eq!(book.unique_identifier(), Some("isbn-1"));
        assert_eq!(book.page_progression_direction(), Some("ltr"));

        let spine: Vec<_> = book.spine_entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(spine, vec!["front", "ch1"]);
        let reading: Vec<_> = book.reading_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(reading, vec!["ch1"]);

        assert_eq!(book.flat_toc().len(), 1);
        assert_eq!(book.flat_toc()[0].manifest_id.as_deref(), Some("ch1"));

        assert_eq!(book.cover_image().unwrap().full_path, "OEBPS/images/cover.png");
        assert_eq!(book.cover_image_bytes(), Some(&b"\x89PNG fake"[..]));
        assert_eq!(book.manifest_entry("ncx").unwrap().full_path, "OEBPS/toc.ncx");
    }

    #[test]
    fn test_missing_cover_entry_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = extras_fixture()
            .without_file("OEBPS/images/cover.png")
            .write_to(dir.path(), "nocover.epub");

        let book = Book::assemble(&path).unwrap();
        assert!(book.cover_image().is_none());
        assert!(book.cover_image_bytes().is_none());
    }

    #[test]
    fn test_missing_spine_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal()
            .without_file("OEBPS/text/chapter1.xhtml")
            .write_to(dir.path(), "nospine.epub");

        let err = Book::assemble(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EntryNotFound);
    }

    #[test]
    fn test_missing_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal()
            .without_file("META-INF/container.xml")
            .write_to(dir.path(), "nocontainer.epub");

        let err = Book::assemble(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidContainer);
    }

    #[test]
    fn test_missing_package_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal()
            .without_file("OEBPS/content.opf")
            .write_to(dir.path(), "noopf.epub");

        let err = Book::assemble(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EntryNotFound);
    }

    const OPF_WITH_OVERLAY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>有声书</dc:title>
    <dc:identifier id="uid">urn:uuid:1111</dc:identifier>
  </metadata>
  <manifest>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml" media-overlay="ch1_mo"/>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml" media-overlay="ch2_mo"/>
    <item id="ch1_mo" href="smil/ch1.smil" media-type="application/smil+xml"/>
    <item id="ch2_mo" href="smil/ch2.smil" media-type="application/smil+xml"/>
    <item id="audio" href="audio/book.mp3" media-type="audio/mpeg"/>
  </manifest>
  <spine>
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

    const CH1_SMIL: &str = r#"<smil xmlns="http://www.w3.org/ns/SMIL" version="3.0"><body>
  <par id="p1"><text src="../ch1.xhtml#p1"/><audio src="../audio/book.mp3" clipBegin="0s" clipEnd="4.5s"/></par>
</body></smil>"#;

    fn overlay_fixture() -> EpubFixture {
        EpubFixture::minimal()
            .with_file("OEBPS/content.opf", OPF_WITH_OVERLAY)
            .with_file("OEBPS/ch1.xhtml", CHAPTER_XHTML)
            .with_file("OEBPS/ch2.xhtml", CHAPTER_XHTML)
            .with_file("OEBPS/smil/ch1.smil", CH1_SMIL)
    }

    #[test]
    fn test_media_overlays() {
        let dir = tempfile::tempdir().unwrap();
        let path = overlay_fixture().write_to(dir.path(), "overlay.epub");

        let book = Book::assemble(&path).unwrap();
        assert_eq!(book.manifest_entry("ch1").unwrap().media_overlay.as_deref(), Some("ch1_mo"));

        // ch2.smil缺失：跳过且不影响整本书
        assert_eq!(book.media_overlays().len(), 1);
        let overlay = book.media_overlay_for("ch1").unwrap();
        assert_eq!(overlay.full_path, "OEBPS/smil/ch1.smil");
        let par = overlay.par_for_fragment(Some("p1")).unwrap();
        assert_eq!(par.audio_src(), Some("../audio/book.mp3"));
        assert_eq!(par.clip_end(), Some(4.5));

        assert!(book.media_overlay_for("ch2").is_none());
        assert!(book.media_overlay_for("audio").is_none());
    }

    #[test]
    fn test_unparsable_smil_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = overlay_fixture()
            .with_file("OEBPS/smil/ch2.smil", "<smil><body><par></body></smil>")
            .write_to(dir.path(), "badsmil.epub");

        let book = Book::assemble(&path).unwrap();
        assert_eq!(book.media_overlays().len(), 1);
        assert_eq!(book.media_overlays()[0].manifest_id, "ch1_mo");
    }

    #[test]
    fn test_book_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Book>();
    }
}
