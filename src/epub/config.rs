//! 解析配置模块
//!
//! 提供解析行为的配置管理功能，支持从YAML文件加载配置。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 解析器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// mimetype条目缺失或内容错误时是否视为致命错误
    pub strict_mimetype: bool,
    /// 按ID约定查找封面时接受的清单项ID（不区分大小写）
    pub cover_id_conventions: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict_mimetype: false,
            cover_id_conventions: vec![
                "cover".to_string(),
                "cover-image".to_string(),
                "cover_image".to_string(),
                "coverimage".to_string(),
            ],
        }
    }
}

impl ParserConfig {
    /// 从YAML配置文件中加载解析器配置
    ///
    /// 文件中未出现的字段使用默认值。
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use epubcore::ParserConfig;
    /// let config = ParserConfig::from_file("epubcore.yaml")?;
    /// # Ok::<(), epubcore::EpubError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EpubError::Config(format!("无法读取配置文件 {}: {}", path.display(), e)))?;

        Self::from_yaml(&content)
    }

    /// 从YAML字符串解析配置
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content)
            .map_err(|e| EpubError::Config(format!("配置文件格式错误: {}", e)))
    }

    /// 检查清单项ID是否符合封面命名约定
    pub fn is_cover_id(&self, id: &str) -> bool {
        self.cover_id_conventions
            .iter()
            .any(|convention| convention.eq_ignore_ascii_case(id))
    }
}
