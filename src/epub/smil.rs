//! 媒体覆盖（SMIL）文档解析
//!
//! 清单中的SMIL文档描述文本片段与音频片段的同步关系。这里只解析文档结构
//! （`<body>` 下的 `seq`、`par`、`text`、`audio` 树），不涉及音频播放。

use crate::epub::archive::Archive;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{self, Package};
use crate::epub::path;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// SMIL文档中的一个元素
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmilElement {
    /// 去掉命名空间前缀的标签名，如 `par`、`text`、`audio`
    pub name: String,
    /// 属性，键为去掉前缀的本地名（`epub:textref` 记为 `textref`）
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SmilElement>,
}

impl SmilElement {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// 第一个指定名称的子元素
    pub fn child(&self, name: &str) -> Option<&SmilElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// `par` 中 `<text>` 的src，即被朗读的文本位置
    pub fn text_src(&self) -> Option<&str> {
        self.child("text")?.attribute("src")
    }

    /// `par` 中 `<audio>` 的src
    pub fn audio_src(&self) -> Option<&str> {
        self.child("audio")?.attribute("src")
    }

    /// 音频片段起点（秒）
    pub fn clip_begin(&self) -> Option<f64> {
        self.child("audio")?.attribute("clipBegin").and_then(parse_clock_value)
    }

    /// 音频片段终点（秒）
    pub fn clip_end(&self) -> Option<f64> {
        self.child("audio")?.attribute("clipEnd").and_then(parse_clock_value)
    }

    fn collect_pars<'a>(&'a self, pars: &mut Vec<&'a SmilElement>) {
        if self.name == "par" {
            pars.push(self);
        }
        for child in &self.children {
            child.collect_pars(pars);
        }
    }
}

/// 一个已解析的SMIL清单项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmilDocument {
    /// 清单项ID，文档的 `media-overlay` 属性引用它
    pub manifest_id: String,
    /// 在归档中的完整路径
    pub full_path: String,
    /// `<body>` 的子元素
    pub elements: Vec<SmilElement>,
}

impl SmilDocument {
    /// 按文档顺序列出所有 `par` 元素，包括嵌套在 `seq` 中的
    pub fn pars(&self) -> Vec<&SmilElement> {
        let mut pars = Vec::new();
        for element in &self.elements {
            element.collect_pars(&mut pars);
        }
        pars
    }

    /// 查找朗读指定片段的 `par`，`fragment` 为 `None` 时返回第一个
    pub fn par_for_fragment(&self, fragment: Option<&str>) -> Option<&SmilElement> {
        let pars = self.pars();
        match fragment {
            None => pars.into_iter().next(),
            Some(fragment) => pars.into_iter().find(|par| text_fragment(par) == Some(fragment)),
        }
    }

    /// 指定片段之后的下一个 `par`
    pub fn next_par_after(&self, fragment: &str) -> Option<&SmilElement> {
        let pars = self.pars();
        let index = pars.iter().position(|par| text_fragment(par) == Some(fragment))?;
        pars.get(index + 1).copied()
    }
}

fn text_fragment(par: &SmilElement) -> Option<&str> {
    path::split_fragment(par.text_src()?).1
}

/// 把SMIL时钟值换算为秒
///
/// 支持完整时钟 `01:02:03.5`、部分时钟 `02:03.5`，
/// 以及带单位的计时 `3.5s`、`120ms`、`2min`、`1h`（不带单位时按秒计）。
pub fn parse_clock_value(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.contains(':') {
        let parts: Vec<&str> = value.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, s.parse::<f64>().ok()?),
            [m, s] => (0, m.parse::<u64>().ok()?, s.parse::<f64>().ok()?),
            _ => return None,
        };
        if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
            return None;
        }
        return Some((hours * 3600 + minutes * 60) as f64 + seconds);
    }

    let (number, scale) = if let Some(n) = value.strip_suffix("ms") {
        (n, 0.001)
    } else if let Some(n) = value.strip_suffix("min") {
        (n, 60.0)
    } else if let Some(n) = value.strip_suffix('h') {
        (n, 3600.0)
    } else if let Some(n) = value.strip_suffix('s') {
        (n, 1.0)
    } else {
        (value, 1.0)
    };
    let number: f64 = number.parse().ok()?;
    (number.is_finite() && number >= 0.0).then_some(number * scale)
}

/// 解析SMIL文档内容，返回 `<body>` 的子元素树
pub fn parse_smil(xml_content: &str) -> Result<Vec<SmilElement>> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut in_body = false;
    let mut stack: Vec<SmilElement> = Vec::new();
    let mut elements = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if in_body => stack.push(SmilElement {
                name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                attributes: opf::attributes(e)?,
                children: Vec::new(),
            }),
            Event::Start(ref e) => {
                if e.local_name().as_ref() == b"body" {
                    in_body = true;
                }
            }
            Event::End(_) if in_body => match stack.pop() {
                Some(element) => match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => elements.push(element),
                },
                // 栈为空时结束的是 <body> 本身
                None => in_body = false,
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(elements)
}

/// 读取并解析清单中的全部SMIL文档
///
/// SMIL文档只是附加信息：缺失或无法解析的文档记录警告后跳过，不会使整本书解析失败。
pub fn parse_media_overlays(archive: &mut Archive, package: &Package) -> Result<Vec<SmilDocument>> {
    let mut documents = Vec::new();

    for entry in package.manifest_entries().filter(|entry| entry.is_media_overlay()) {
        let content = match archive.read_entry_to_string(&entry.full_path) {
            Ok(content) => content,
            Err(EpubError::EntryNotFound(missing)) => {
                warn!(entry = %missing, "SMIL文档不在归档中");
                continue;
            }
            Err(e) => return Err(e),
        };

        match parse_smil(&content) {
            Ok(elements) => documents.push(SmilDocument {
                manifest_id: entry.id.clone(),
                full_path: entry.full_path.clone(),
                elements,
            }),
            Err(e) => warn!(entry = %entry.full_path, error = %e, "无法解析SMIL文档"),
        }
    }

    for entry in package.manifest_entries() {
        if let Some(overlay) = entry.media_overlay.as_deref() {
            if !documents.iter().any(|doc| doc.manifest_id == overlay) {
                warn!(id = %entry.id, overlay, "media-overlay指向的SMIL文档不可用");
            }
        }
    }

    debug!(count = documents.len(), "解析媒体覆盖完成");
    Ok(documents)
}
