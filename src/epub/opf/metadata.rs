//! 元数据处理模块
//!
//! 提供EPUB元数据的结构定义和处理功能。

use serde::Serialize;
use std::collections::BTreeMap;

/// Dublin Core元素，如 `<dc:title>`、`<dc:creator>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DublinCore {
    /// 去掉命名空间前缀的元素名（如 "title"）
    pub name: String,
    /// 元素文本内容
    pub value: String,
    /// 元素属性（键为去掉前缀的本地名，如 role, file-as, scheme）
    pub attributes: BTreeMap<String, String>,
}

impl DublinCore {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// meta标签
///
/// EPUB2使用 `<meta name="cover" content="cover-image"/>`，
/// EPUB3使用 `<meta property="dcterms:modified">2025-06-05T11:24:01Z</meta>`，
/// 带 `refines` 的meta用于补充其他元素（如作者角色）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// 被精化的元素ID（不包含#前缀）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refines: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// 标签文本内容
    pub value: String,
}

/// 创建者信息(作者、编辑者等)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Creator {
    /// 创建者姓名
    pub name: String,
    /// 角色(如author、editor等)
    pub role: Option<String>,
    /// 排序用名称
    pub file_as: Option<String>,
    /// 显示顺序
    pub display_seq: Option<u32>,
    /// 元素ID（用于关联refines元数据）
    pub id: Option<String>,
}

/// 标识符信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    /// 标识符值
    pub value: String,
    /// 标识符类型(如ISBN、UUID等)
    pub scheme: Option<String>,
    /// 元素ID
    pub id: Option<String>,
}

/// 日期及其事件（如 publication、modification）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDate {
    pub date: String,
    pub event: Option<String>,
}

/// OPF文件中的元数据信息，按文档顺序保存
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    elements: Vec<DublinCore>,
    metas: Vec<Meta>,
}

impl Metadata {
    /// 创建新的元数据实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加Dublin Core元数据
    pub fn add_dublin_core(&mut self, name: String, value: String, attributes: BTreeMap<String, String>) {
        self.elements.push(DublinCore { name, value, attributes });
    }

    /// 添加meta元数据
    pub fn add_meta(&mut self, meta: Meta) {
        self.metas.push(meta);
    }

    fn values_of<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a DublinCore> {
        self.elements.iter().filter(move |e| e.name == name)
    }

    fn first_value(&self, name: &str) -> Option<&str> {
        self.values_of(name).next().map(|e| e.value.as_str())
    }

    /// 获取标题（多个时取第一个）
    pub fn title(&self) -> Option<&str> {
        self.first_value("title")
    }

    /// 获取所有标题
    pub fn titles(&self) -> Vec<&str> {
        self.values_of("title").map(|e| e.value.as_str()).collect()
    }

    /// 获取所有创建者
    pub fn creators(&self) -> Vec<Creator> {
        self.values_of("creator").map(|e| self.extract_creator(e)).collect()
    }

    /// 获取所有贡献者
    pub fn contributors(&self) -> Vec<Creator> {
        self.values_of("contributor").map(|e| self.extract_creator(e)).collect()
    }

    /// 获取语言
    pub fn language(&self) -> Option<&str> {
        self.first_value("language")
    }

    /// 获取所有标识符
    pub fn identifiers(&self) -> Vec<Identifier> {
        self.values_of("identifier")
            .map(|e| Identifier {
                value: e.value.clone(),
                scheme: e.attribute("scheme").map(str::to_string),
                id: e.attribute("id").map(str::to_string),
            })
            .collect()
    }

    /// 根据元素ID查找标识符（用于package的unique-identifier）
    pub fn identifier_by_id(&self, id: &str) -> Option<Identifier> {
        self.identifiers()
            .into_iter()
            .find(|identifier| identifier.id.as_deref() == Some(id))
    }

    /// 获取所有出版社
    pub fn publishers(&self) -> Vec<&str> {
        self.values_of("publisher").map(|e| e.value.as_str()).collect()
    }

    /// 获取所有日期
    pub fn dates(&self) -> Vec<EventDate> {
        self.values_of("date")
            .map(|e| EventDate {
                date: e.value.clone(),
                event: e.attribute("event").map(str::to_string),
            })
            .collect()
    }

    /// 获取所有描述
    pub fn descriptions(&self) -> Vec<&str> {
        self.values_of("description").map(|e| e.value.as_str()).collect()
    }

    /// 获取所有主题
    pub fn subjects(&self) -> Vec<&str> {
        self.values_of("subject").map(|e| e.value.as_str()).collect()
    }

    /// 获取所有版权信息
    pub fn rights(&self) -> Vec<&str> {
        self.values_of("rights").map(|e| e.value.as_str()).collect()
    }

    /// 获取所有meta标签
    pub fn metas(&self) -> &[Meta] {
        &self.metas
    }

    /// 获取所有Dublin Core元素
    pub fn dublin_core(&self) -> &[DublinCore] {
        &self.elements
    }

    /// 根据name查找meta的content，如 `find_meta_by_name("cover")`
    pub fn find_meta_by_name(&self, name: &str) -> Option<&str> {
        self.metas
            .iter()
            .find(|m| m.name.as_deref() == Some(name))
            .and_then(|m| m.content.as_deref())
    }

    /// 根据property查找meta的文本，可选地限定被精化的元素ID
    pub fn find_meta_by_property(&self, property: &str, refined_by: Option<&str>) -> Option<&str> {
        self.metas
            .iter()
            .find(|m| m.property.as_deref() == Some(property) && (refined_by.is_none() || m.refines.as_deref() == refined_by))
            .map(|m| m.value.as_str())
    }

    /// 从Dublin Core元素中提取创建者信息（支持EPUB3的refines关联）
    fn extract_creator(&self, element: &DublinCore) -> Creator {
        let mut creator = Creator {
            name: element.value.clone(),
            role: element.attribute("role").map(str::to_string),
            file_as: element.attribute("file-as").map(str::to_string),
            display_seq: None,
            id: element.attribute("id").map(str::to_string),
        };

        let Some(id) = creator.id.clone() else {
            return creator;
        };

        for meta in self.metas.iter().filter(|m| m.refines.as_deref() == Some(id.as_str())) {
            match meta.property.as_deref() {
                Some("role") => {
                    // marc:relators 代码转换为可读名称
                    creator.role = Some(match meta.value.as_str() {
                        "aut" => "author".to_string(),
                        "edt" => "editor".to_string(),
                        "trl" => "translator".to_string(),
                        "ill" => "illustrator".to_string(),
                        other => other.to_string(),
                    });
                }
                Some("file-as") => creator.file_as = Some(meta.value.clone()),
                Some("display-seq") => creator.display_seq = meta.value.parse::<u32>().ok(),
                _ => {}
            }
        }

        creator
    }
}
