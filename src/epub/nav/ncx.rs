//! NCX解析器模块
//!
//! 提供NCX（Navigation Control file for XML）文件的XML解析功能。
//! 只关心 `docTitle` 和 `navMap`，`pageList`、`navList` 会被跳过。

use crate::epub::error::{EpubError, Result};
use crate::epub::nav::toc::{TocEntry, TocTree};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// 正在解析的导航点
#[derive(Default)]
struct PendingNavPoint {
    label: Option<String>,
    src: Option<String>,
    children: Vec<TocEntry>,
}

impl PendingNavPoint {
    fn finish(self, doc_path: &str) -> TocEntry {
        let mut entry = TocEntry::from_target(self.label.unwrap_or_default(), self.src.as_deref(), doc_path);
        entry.children = self.children;
        entry
    }
}

/// 解析NCX文件内容
///
/// # 参数
/// * `xml_content` - NCX文件的XML内容
/// * `doc_path` - NCX文件在归档中的路径，`content/@src` 相对于它所在目录解析
///
/// # 返回值
/// * `Result<TocTree>` - 导航点按文档顺序排列，不按playOrder重排
pub fn parse_ncx(xml_content: &str, doc_path: &str) -> Result<TocTree> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut in_doc_title = false;
    let mut in_nav_map = false;
    let mut in_nav_label = false;
    let mut in_text = false;
    let mut text_content = String::new();

    let mut doc_title: Option<String> = None;
    let mut roots: Vec<TocEntry> = Vec::new();
    // 导航点栈，栈顶是最内层未闭合的navPoint
    let mut stack: Vec<PendingNavPoint> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"docTitle" if !in_nav_map => in_doc_title = true,
                b"navMap" => in_nav_map = true,
                b"navPoint" if in_nav_map => stack.push(PendingNavPoint::default()),
                b"navLabel" if in_nav_map => in_nav_label = true,
                b"text" if in_doc_title || in_nav_label => {
                    in_text = true;
                    text_content.clear();
                }
                b"content" if in_nav_map => {
                    if let Some(top) = stack.last_mut() {
                        if top.src.is_none() {
                            top.src = content_src(e)?;
                        }
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    text_content.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if in_text {
                    text_content.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"text" if in_text => {
                    in_text = false;
                    let text = collapse_whitespace(&text_content);
                    if in_nav_label {
                        // 多语言标签只取第一个
                        if let Some(top) = stack.last_mut() {
                            top.label.get_or_insert(text);
                        }
                    } else if in_doc_title {
                        doc_title.get_or_insert(text);
                    }
                }
                b"navLabel" => in_nav_label = false,
                b"docTitle" => in_doc_title = false,
                b"navPoint" if in_nav_map => {
                    let Some(finished) = stack.pop() else {
                        return Err(EpubError::MalformedToc("多余的navPoint结束标签".to_string()));
                    };
                    let entry = finished.finish(doc_path);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(entry),
                        None => roots.push(entry),
                    }
                }
                b"navMap" => in_nav_map = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(EpubError::MalformedToc(format!("{} 中有未闭合的navPoint", doc_path)));
    }

    Ok(TocTree::new(roots).with_title(doc_title.filter(|t| !t.is_empty())))
}

/// 解析content元素的src属性
fn content_src(e: &BytesStart) -> Result<Option<String>> {
    for attr_result in e.attributes() {
        let attr = attr_result?;
        if attr.key.local_name().as_ref() == b"src" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// 把连续的XML空白折叠为单个空格，`\u{a0}` 等不间断空格原样保留
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}
