use crate::epub::archive::Archive;
use crate::epub::error::{EpubError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

/// container.xml在归档中的固定位置
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: Option<String>,
}

/// Container.xml的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 只收录带有 `full-path` 属性的rootfile，XML错误原样返回 `EpubError::Xml`。
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut rootfiles = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e)
                    if e.local_name().as_ref() == b"rootfile" =>
                {
                    let mut full_path = None;
                    let mut media_type = None;

                    for attr_result in e.attributes() {
                        let attr = attr_result?;
                        match attr.key.local_name().as_ref() {
                            b"full-path" => {
                                full_path = Some(attr.unescape_value()?.into_owned());
                            }
                            b"media-type" => {
                                media_type = Some(attr.unescape_value()?.into_owned());
                            }
                            _ => {}
                        }
                    }

                    if let Some(full_path) = full_path.filter(|p| !p.is_empty()) {
                        rootfiles.push(RootFile { full_path, media_type });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Container { rootfiles })
    }

    /// 获取包文档路径：第一个rootfile的 `full-path`
    pub fn root_path(&self) -> Option<&str> {
        self.rootfiles.first().map(|rf| rf.full_path.as_str())
    }
}

/// 从归档中读取container.xml并返回OPF包文档路径
///
/// container.xml缺失、无法解析或没有带 `full-path` 的rootfile时返回 `EpubError::InvalidContainer`。
pub fn resolve_root_path(archive: &mut Archive) -> Result<String> {
    let content = archive.read_entry_to_string(CONTAINER_PATH).map_err(|e| match e {
        EpubError::EntryNotFound(_) => {
            EpubError::InvalidContainer(format!("归档中缺少 {}", CONTAINER_PATH))
        }
        other => other,
    })?;

    let container = Container::parse_xml(&content).map_err(|e| e.xml_into(EpubError::InvalidContainer))?;

    let root_path = container.root_path().ok_or_else(|| {
        EpubError::InvalidContainer("没有找到带有full-path属性的rootfile".to_string())
    })?;

    debug!(root_path, "解析container.xml完成");
    Ok(root_path.to_string())
}
