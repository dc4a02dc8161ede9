use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::epub::config::ParserConfig;
use crate::epub::error::{EpubError, Result};

/// OCF规定的mimetype内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 表示一个已打开的EPUB归档
///
/// 文件句柄在 `Archive` 被丢弃时释放。
pub struct Archive {
    archive: ZipArchive<File>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl Archive {
    /// 从文件路径打开EPUB归档
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<Archive>` - 文件不存在、无法读取或不是ZIP格式时返回 `EpubError::Archive`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Archive> {
        Self::open_with_config(path, &ParserConfig::default())
    }

    /// 使用指定配置打开EPUB归档
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: &ParserConfig) -> Result<Archive> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| EpubError::Archive(format!("无法打开 {}: {}", path.display(), e)))?;
        let archive = ZipArchive::new(file)
            .map_err(|e| EpubError::Archive(format!("{} 不是有效的ZIP容器: {}", path.display(), e)))?;

        let mut archive = Archive { archive };
        archive.validate(config.strict_mimetype)?;

        debug!(path = %path.display(), entries = archive.archive.len(), "打开EPUB归档");
        Ok(archive)
    }

    /// 验证mimetype条目
    ///
    /// 非严格模式下只记录警告，严格模式下返回错误。
    fn validate(&mut self, strict: bool) -> Result<()> {
        let problem = match self.read_entry_to_string("mimetype") {
            Ok(content) if content.trim() == EPUB_MIMETYPE => return Ok(()),
            Ok(content) => format!("无效的mimetype: 期望 {}, 找到 {}", EPUB_MIMETYPE, content.trim()),
            Err(EpubError::EntryNotFound(_)) => "缺少mimetype文件".to_string(),
            Err(e) => return Err(e),
        };

        if strict {
            return Err(EpubError::Archive(problem));
        }
        warn!("{}", problem);
        Ok(())
    }

    /// 列出归档中的所有条目
    pub fn list_entries(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// 检查归档中是否存在指定条目
    pub fn contains(&self, entry_path: &str) -> bool {
        self.archive.index_for_name(entry_path).is_some()
    }

    /// 读取指定条目的二进制内容
    ///
    /// # 参数
    /// * `entry_path` - 条目在归档内的完整路径
    ///
    /// # 返回值
    /// * `Result<Vec<u8>>` - 条目不存在时返回 `EpubError::EntryNotFound`
    pub fn read_entry(&mut self, entry_path: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(entry_path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(EpubError::EntryNotFound(entry_path.to_string()));
            }
            Err(e) => {
                return Err(EpubError::Archive(format!("无法读取条目 {}: {}", entry_path, e)));
            }
        };

        let mut buffer = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buffer)
            .map_err(|e| EpubError::Archive(format!("解压条目 {} 失败: {}", entry_path, e)))?;
        Ok(buffer)
    }

    /// 读取指定条目并按UTF-8解码，去掉可能存在的BOM
    pub fn read_entry_to_string(&mut self, entry_path: &str) -> Result<String> {
        let bytes = self.read_entry(entry_path)?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
