use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub解析相关的错误类型
///
/// 除 `Xml` 外每个变体都对应解析管线中的一种致命错误；
/// `Xml` 只在单个阶段内部流转，离开阶段前会被映射为该阶段自己的错误类型。
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("归档文件错误: {0}")]
    Archive(String),

    #[error("归档中缺少条目: {0}")]
    EntryNotFound(String),

    #[error("container.xml无效: {0}")]
    InvalidContainer(String),

    #[error("OPF包文档格式错误: {0}")]
    MalformedPackage(String),

    #[error("导航文档格式错误: {0}")]
    MalformedToc(String),

    #[error("配置文件错误: {0}")]
    Config(String),

    #[error("XML解析错误: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// 错误类别，便于调用方按类别匹配而不关心细节字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Archive,
    EntryNotFound,
    InvalidContainer,
    MalformedPackage,
    MalformedToc,
    Config,
    Xml,
}

impl EpubError {
    /// 获取错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            EpubError::Archive(_) => ErrorKind::Archive,
            EpubError::EntryNotFound(_) => ErrorKind::EntryNotFound,
            EpubError::InvalidContainer(_) => ErrorKind::InvalidContainer,
            EpubError::MalformedPackage(_) => ErrorKind::MalformedPackage,
            EpubError::MalformedToc(_) => ErrorKind::MalformedToc,
            EpubError::Config(_) => ErrorKind::Config,
            EpubError::Xml(_) => ErrorKind::Xml,
        }
    }

    /// 把阶段内部的XML错误映射为指定阶段的错误，其余错误原样返回
    pub(crate) fn xml_into(self, wrap: fn(String) -> EpubError) -> EpubError {
        match self {
            EpubError::Xml(err) => wrap(err.to_string()),
            other => other,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for EpubError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        EpubError::Xml(quick_xml::Error::InvalidAttr(err))
    }
}
