//! EPUB3导航文档解析
//!
//! 从XHTML导航文档中选出 `epub:type` 包含 `toc` 的 `<nav>`（没有时取第一个），
//! 按 `ol/li/(a|span)` 的嵌套关系构造目录树。

use crate::epub::error::Result;
use crate::epub::nav::ncx::collapse_whitespace;
use crate::epub::nav::toc::{TocEntry, TocTree};
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

/// 正在解析的列表项
#[derive(Default)]
struct PendingItem {
    label: String,
    has_label: bool,
    href: Option<String>,
    children: Vec<TocEntry>,
}

/// 一个已解析的 `<nav>` 元素
struct NavSection {
    is_toc: bool,
    entries: Vec<TocEntry>,
}

/// 解析EPUB3导航文档
///
/// # 参数
/// * `xml_content` - 导航文档的XHTML内容
/// * `doc_path` - 导航文档在归档中的路径，`a/@href` 相对于它所在目录解析
pub fn parse_nav_document(xml_content: &str, doc_path: &str) -> Result<TocTree> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut sections: Vec<NavSection> = Vec::new();
    // 当前 <nav> 的状态，不在 <nav> 内时为空
    let mut current: Option<NavSection> = None;
    let mut stack: Vec<PendingItem> = Vec::new();
    // 标签元素（a或span）内部的嵌套深度，0表示不在标签内
    let mut label_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if label_depth > 0 {
                    label_depth += 1;
                    buf.clear();
                    continue;
                }
                match e.local_name().as_ref() {
                    b"nav" if current.is_none() => {
                        current = Some(NavSection {
                            is_toc: is_toc_nav(e)?,
                            entries: Vec::new(),
                        });
                    }
                    b"li" if current.is_some() => stack.push(PendingItem::default()),
                    name @ (b"a" | b"span") => {
                        if let Some(top) = stack.last_mut().filter(|top| !top.has_label) {
                            top.has_label = true;
                            if name == b"a" {
                                top.href = href_attribute(e)?;
                            }
                            label_depth = 1;
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if label_depth > 0 {
                    if let Some(top) = stack.last_mut() {
                        top.label.push_str(&text_of(e));
                    }
                }
            }
            Event::CData(e) => {
                if label_depth > 0 {
                    if let Some(top) = stack.last_mut() {
                        top.label.push_str(&String::from_utf8_lossy(&e));
                    }
                }
            }
            Event::End(ref e) => {
                if label_depth > 0 {
                    label_depth -= 1;
                    buf.clear();
                    continue;
                }
                match e.local_name().as_ref() {
                    b"li" => {
                        if let Some(item) = stack.pop() {
                            match (stack.last_mut(), current.as_mut()) {
                                (Some(parent), _) => push_item(&mut parent.children, item, doc_path),
                                (None, Some(section)) => push_item(&mut section.entries, item, doc_path),
                                (None, None) => {}
                            }
                        }
                    }
                    b"nav" => {
                        if let Some(section) = current.take() {
                            stack.clear();
                            sections.push(section);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let chosen = match sections.iter().position(|section| section.is_toc) {
        Some(index) => Some(sections.swap_remove(index)),
        None => sections.into_iter().next(),
    };

    Ok(TocTree::new(chosen.map(|section| section.entries).unwrap_or_default()))
}

/// 把完成的列表项加入兄弟列表；没有标签和链接的项只保留其子项
fn push_item(siblings: &mut Vec<TocEntry>, item: PendingItem, doc_path: &str) {
    let title = collapse_whitespace(&item.label);
    if !item.has_label && item.href.is_none() {
        siblings.extend(item.children);
        return;
    }

    let mut entry = TocEntry::from_target(title, item.href.as_deref(), doc_path);
    entry.children = item.children;
    siblings.push(entry);
}

/// 判断 `<nav>` 的 `epub:type` 是否包含 `toc`
fn is_toc_nav(e: &BytesStart) -> Result<bool> {
    for attr_result in e.attributes() {
        let attr = attr_result?;
        if attr.key.local_name().as_ref() == b"type" {
            let value = attr.unescape_value()?;
            return Ok(value.split_whitespace().any(|t| t == "toc"));
        }
    }
    Ok(false)
}

fn href_attribute(e: &BytesStart) -> Result<Option<String>> {
    for attr_result in e.attributes() {
        let attr = attr_result?;
        if attr.key.local_name().as_ref() == b"href" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// 按HTML5实体表反转义文本，XHTML导航文档常用 `&nbsp;` 之类未在XML中声明的实体
///
/// 实体表之外的名称无法解析，此时退回原始文本
fn text_of(e: &BytesText) -> String {
    match e.unescape_with(resolve_html5_entity) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(e).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAV: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Navigation</title></head>
<body>
  <nav epub:type="landmarks">
    <ol><li><a epub:type="cover" href="cover.xhtml">Cover</a></li></ol>
  </nav>
  <nav epub:type="toc" id="toc">
    <h1>Contents</h1>
    <ol>
      <li><a href="text/part1.xhtml">Part
            <em>One</em></a>
        <ol>
          <li><a href="text/ch1.xhtml#sec">Chapter 1</a></li>
          <li><span>Unlinked heading</span>
            <ol><li><a href="text/ch2.xhtml">Chapter 2</a></li></ol>
          </li>
        </ol>
      </li>
      <li><a href="../back.xhtml">Back&nbsp;Matter</a></li>
    </ol>
  </nav>
</body>
</html>"#;

    #[test]
    fn test_parse_toc_nav() {
        let tree = parse_nav_document(NAV, "OEBPS/nav.xhtml").unwrap();
        assert_eq!(tree.roots.len(), 2);

        let part1 = &tree.roots[0];
        assert_eq!(part1.title, "Part One");
        assert_eq!(part1.href.as_deref(), Some("OEBPS/text/part1.xhtml"));
        assert_eq!(part1.children.len(), 2);
        assert_eq!(part1.children[0].fragment.as_deref(), Some("sec"));

        let heading = &part1.children[1];
        assert_eq!(heading.title, "Unlinked heading");
        assert!(heading.href.is_none());
        assert_eq!(heading.children[0].href.as_deref(), Some("OEBPS/text/ch2.xhtml"));

        assert_eq!(tree.roots[1].href.as_deref(), Some("back.xhtml"));
        assert_eq!(tree.roots[1].title, "Back\u{a0}Matter");
    }

    #[test]
    fn test_flatten_nav_preorder() {
        let tree = parse_nav_document(NAV, "OEBPS/nav.xhtml").unwrap();
        let titles: Vec<_> = tree.flatten().into_iter().map(|e| e.title).collect();
        assert_eq!(titles.len(), 5);
        assert_eq!(titles[1], "Chapter 1");
        assert_eq!(titles[3], "Chapter 2");
    }

    #[test]
    fn test_html_entities_in_labels() {
        let xml = r#"<html><body><nav epub:type="toc"><ol>
            <li><a href="a.xhtml">Tom &amp; Jerry&nbsp;Show</a></li>
            <li><a href="b.xhtml">&ldquo;Quoted&rdquo; &#8212; &#x41;</a></li>
            <li><a href="c.xhtml">Broken &madeup; entity</a></li>
        </ol></nav></body></html>"#;
        let tree = parse_nav_document(xml, "nav.xhtml").unwrap();
        assert_eq!(tree.roots[0].title, "Tom & Jerry\u{a0}Show");
        assert_eq!(tree.roots[1].title, "\u{201c}Quoted\u{201d} \u{2014} A");
        assert_eq!(tree.roots[2].title, "Broken &madeup; entity");
    }

    #[test]
    fn test_first_nav_when_no_toc_type() {
        let xml = r#"<html><body><nav><ol><li><a href="a.xhtml">A</a></li></ol></nav>
            <nav><ol><li><a href="b.xhtml">B</a></li></ol></nav></body></html>"#;
        let tree = parse_nav_document(xml, "nav.xhtml").unwrap();
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].title, "A");
    }

    #[test]
    fn test_no_nav_element() {
        let tree = parse_nav_document("<html><body><p>nothing</p></body></html>", "nav.xhtml").unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_broken_nav_is_error() {
        assert!(parse_nav_document("<html><body><nav><ol></nav></body></html>", "nav.xhtml").is_err());
    }
}
