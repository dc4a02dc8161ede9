//! 目录导航模块
//!
//! 解析NCX或EPUB3导航文档，得到层级目录树，并把每个目录项关联到清单项。

mod nav_doc;
mod ncx;
mod toc;

pub use nav_doc::parse_nav_document;
pub use ncx::parse_ncx;
pub use toc::{FlatTocEntry, TocDisplay, TocEntry, TocStatistics, TocTree, TocTreeStyle};

use crate::epub::archive::Archive;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{ManifestEntry, NavDocument, NavKind};
use crate::epub::path;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// 从归档中读取并解析导航文档
///
/// 导航文档在归档中不存在时返回空目录并记录警告；
/// 文档存在但无法解析时返回 `EpubError::MalformedToc`。
pub fn parse_toc(
    archive: &mut Archive,
    nav_document: &NavDocument,
    manifest: &BTreeMap<String, ManifestEntry>,
) -> Result<TocTree> {
    let content = match archive.read_entry_to_string(&nav_document.full_path) {
        Ok(content) => content,
        Err(EpubError::EntryNotFound(entry)) => {
            warn!(entry = %entry, "导航文档不存在，目录为空");
            return Ok(TocTree::default());
        }
        Err(e) => return Err(e),
    };

    let parsed = match nav_document.kind {
        NavKind::Ncx => parse_ncx(&content, &nav_document.full_path),
        NavKind::Xhtml => parse_nav_document(&content, &nav_document.full_path),
    };
    let mut tree = parsed.map_err(|e| e.xml_into(EpubError::MalformedToc))?;

    link_manifest(&mut tree, manifest);

    debug!(
        path = %nav_document.full_path,
        kind = ?nav_document.kind,
        entries = tree.statistics().total_nodes,
        "解析目录完成"
    );
    Ok(tree)
}

/// 按归档内完整路径把目录项关联到清单项，找不到时记录警告
pub fn link_manifest(tree: &mut TocTree, manifest: &BTreeMap<String, ManifestEntry>) {
    let by_path: HashMap<&str, &str> = manifest
        .values()
        .map(|entry| (entry.full_path.as_str(), entry.id.as_str()))
        .collect();

    tree.for_each_mut(|entry| {
        let Some(href) = entry.href.as_deref() else {
            return;
        };
        if path::is_external(href) {
            return;
        }
        match by_path.get(href) {
            Some(id) => entry.manifest_id = Some(id.to_string()),
            None => warn!(href, title = %entry.title, "目录项指向的文件不在清单中"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::test_support::EpubFixture;

    fn manifest() -> BTreeMap<String, ManifestEntry> {
        [("ch1", "text/ch1.xhtml"), ("ch2", "text/ch2.xhtml")]
            .into_iter()
            .map(|(id, href)| {
                let entry = ManifestEntry {
                    id: id.to_string(),
                    href: href.to_string(),
                    full_path: format!("OEBPS/{}", href),
                    media_type: "application/xhtml+xml".to_string(),
                    properties: None,
                    media_overlay: None,
                };
                (id.to_string(), entry)
            })
            .collect()
    }

    const NCX: &str = r#"<ncx><navMap>
        <navPoint><navLabel><text>One</text></navLabel><content src="text/ch1.xhtml"/></navPoint>
        <navPoint><navLabel><text>Ghost</text></navLabel><content src="text/ghost.xhtml#x"/></navPoint>
        <navPoint><navLabel><text>Web</text></navLabel><content src="http://example.com/"/></navPoint>
    </navMap></ncx>"#;

    #[test]
    fn test_link_manifest() {
        let mut tree = parse_ncx(NCX, "OEBPS/toc.ncx").unwrap();
        link_manifest(&mut tree, &manifest());

        assert_eq!(tree.roots[0].manifest_id.as_deref(), Some("ch1"));
        assert!(tree.roots[1].manifest_id.is_none());
        assert_eq!(tree.roots[1].href.as_deref(), Some("OEBPS/text/ghost.xhtml"));
        assert!(tree.roots[2].manifest_id.is_none());
    }

    #[test]
    fn test_parse_toc_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal()
            .with_file("OEBPS/toc.ncx", NCX)
            .write_to(dir.path(), "toc.epub");
        let mut archive = Archive::open(&path).unwrap();

        let nav = NavDocument {
            manifest_id: "ncx".to_string(),
            full_path: "OEBPS/toc.ncx".to_string(),
            kind: NavKind::Ncx,
        };
        let tree = parse_toc(&mut archive, &nav, &manifest()).unwrap();
        assert_eq!(tree.flatten().len(), 3);
    }

    #[test]
    fn test_missing_nav_document_gives_empty_toc() {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal().write_to(dir.path(), "nonav.epub");
        let mut archive = Archive::open(&path).unwrap();

        let nav = NavDocument {
            manifest_id: "nav".to_string(),
            full_path: "OEBPS/nav.xhtml".to_string(),
            kind: NavKind::Xhtml,
        };
        let tree = parse_toc(&mut archive, &nav, &manifest()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_unparsable_nav_is_malformed_toc() {
        let dir = tempfile::tempdir().unwrap();
        let path = EpubFixture::minimal()
            .with_file("OEBPS/toc.ncx", "<ncx><navMap><navPoint></navMap></ncx>")
            .write_to(dir.path(), "broken.epub");
        let mut archive = Archive::open(&path).unwrap();

        let nav = NavDocument {
            manifest_id: "ncx".to_string(),
            full_path: "OEBPS/toc.ncx".to_string(),
            kind: NavKind::Ncx,
        };
        let result = parse_toc(&mut archive, &nav, &manifest());
        assert!(matches!(result, Err(EpubError::MalformedToc(_))));
    }
}
