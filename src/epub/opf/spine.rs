//! 脊柱模块
//!
//! 提供EPUB包中阅读顺序（脊柱）的结构定义。

use serde::Serialize;

/// 脊柱项信息(阅读顺序)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpineItem {
    /// 引用的清单项ID
    pub idref: String,
    /// 是否线性阅读，`linear="no"` 的项目是补充内容
    pub linear: bool,
}

impl SpineItem {
    /// 创建指定线性属性的脊柱项
    pub fn with_linear(idref: String, linear: bool) -> Self {
        Self { idref, linear }
    }

    /// 检查是否为线性阅读
    pub fn is_linear(&self) -> bool {
        self.linear
    }
}

/// 脊柱：有序的阅读序列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Spine {
    /// 脊柱项，顺序即阅读顺序
    pub items: Vec<SpineItem>,
    /// `toc` 属性引用的NCX清单项ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toc: Option<String>,
    /// 翻页方向（`ltr`、`rtl` 或 `default`）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_progression_direction: Option<String>,
}

impl Spine {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 只包含线性项目的默认阅读顺序
    pub fn linear_items(&self) -> impl Iterator<Item = &SpineItem> {
        self.items.iter().filter(|item| item.is_linear())
    }
}
