//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。

use crate::epub::opf::media_type::{self, MediaType};
use serde::Serialize;

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// 项目ID
    pub id: String,
    /// 原始href(相对于OPF文件)
    pub href: String,
    /// 解析后在归档中的完整路径
    pub full_path: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
    /// `media-overlay` 属性：为此文档配音的SMIL清单项ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_overlay: Option<String>,
}

impl ManifestEntry {
    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|properties| properties.split_whitespace().any(|p| p == property))
    }

    /// 检查是否为EPUB3导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// 检查是否为NCX文档（按媒体类型）
    pub fn is_ncx(&self) -> bool {
        self.media_type.trim() == media_type::NCX
    }

    /// 检查是否带有cover-image属性
    pub fn is_cover_image(&self) -> bool {
        self.has_property("cover-image")
    }

    /// 检查是否为图片文件
    pub fn is_image(&self) -> bool {
        media_type::is_image(&self.media_type)
    }

    /// 查找已知的媒体类型，未登记的类型按扩展名推断
    pub fn known_media_type(&self) -> Option<&'static MediaType> {
        MediaType::by_name(&self.media_type).or_else(|| MediaType::by_file_name(&self.href))
    }

    /// 检查是否为媒体覆盖（SMIL）文档
    pub fn is_media_overlay(&self) -> bool {
        self.known_media_type().is_some_and(|t| t.name == media_type::SMIL)
    }
}
