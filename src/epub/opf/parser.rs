//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的XML解析功能。

use crate::epub::archive::Archive;
use crate::epub::config::ParserConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    manifest::ManifestEntry,
    media_type::{self, MediaType},
    metadata::{Meta, Metadata},
    spine::{Spine, SpineItem},
};
use crate::epub::path;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 封面图片引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverImage {
    /// 清单项ID
    pub manifest_id: String,
    /// 在归档中的完整路径
    pub full_path: String,
    /// 媒体类型
    pub media_type: String,
}

impl From<&ManifestEntry> for CoverImage {
    fn from(entry: &ManifestEntry) -> Self {
        Self {
            manifest_id: entry.id.clone(),
            full_path: entry.full_path.clone(),
            media_type: entry.media_type.clone(),
        }
    }
}

/// 导航文档的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavKind {
    /// EPUB2的NCX文件
    Ncx,
    /// EPUB3的XHTML导航文档
    Xhtml,
}

/// 包文档中定位到的导航文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavDocument {
    pub manifest_id: String,
    pub full_path: String,
    pub kind: NavKind,
}

/// OPF包文档解析结果
#[derive(Debug, Clone)]
pub struct Package {
    /// 包文档在归档中的路径
    pub path: String,
    /// 包文档所在目录，所有href都相对于此目录
    pub base_dir: String,
    /// EPUB版本
    pub version: String,
    /// package元素的unique-identifier属性（指向某个dc:identifier的ID）
    pub unique_identifier_id: Option<String>,
    /// 元数据
    pub metadata: Metadata,
    /// 清单项(文件列表)，按ID索引
    pub manifest: BTreeMap<String, ManifestEntry>,
    /// 清单项ID的文档顺序
    manifest_order: Vec<String>,
    /// 脊柱(阅读顺序)
    pub spine: Spine,
}

/// 解析过程中当前所在的OPF区块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Metadata,
    Manifest,
    Spine,
}

/// metadata区块中等待文本内容的元素
enum Pending {
    DublinCore { name: String, attributes: BTreeMap<String, String> },
    Meta(Meta),
}

impl Package {
    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    /// * `package_path` - OPF文件在归档中的路径，用于解析相对href
    ///
    /// # 返回值
    /// * `Result<Package>` - 清单ID重复或脊柱引用不存在的清单项时返回 `EpubError::MalformedPackage`，
    ///   XML语法错误返回 `EpubError::Xml`
    pub fn parse_xml(xml_content: &str, package_path: &str) -> Result<Package> {
        // 不裁剪文本：元数据值内部可能夹带标签，标签两侧的空格需要保留
        let mut reader = Reader::from_str(xml_content);

        let base_dir = path::parent_dir(package_path).to_string();
        let mut package = Package {
            path: package_path.to_string(),
            base_dir,
            version: String::new(),
            unique_identifier_id: None,
            metadata: Metadata::new(),
            manifest: BTreeMap::new(),
            manifest_order: Vec::new(),
            spine: Spine::default(),
        };

        let mut buf = Vec::new();
        let mut section = Section::None;
        let mut pending: Option<Pending> = None;
        // pending元素内部嵌套标签（如 <dc:description> 中的 <b>）的深度
        let mut nested_depth = 0usize;
        let mut text_content = String::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(_) if pending.is_some() => nested_depth += 1,
                Event::Start(ref e) => {
                    match (section, e.local_name().as_ref()) {
                        (_, b"package") => package.read_package_attributes(e)?,
                        (_, b"metadata") => section = Section::Metadata,
                        (_, b"manifest") => section = Section::Manifest,
                        (_, b"spine") => {
                            section = Section::Spine;
                            package.read_spine_attributes(e)?;
                        }
                        (Section::Manifest, b"item") => package.add_manifest_item(e)?,
                        (Section::Spine, b"itemref") => package.add_spine_item(e)?,
                        (Section::Metadata, b"meta") => {
                            pending = Some(Pending::Meta(Self::parse_meta(e)?));
                            text_content.clear();
                        }
                        (Section::Metadata, _) => {
                            let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                            pending = Some(Pending::DublinCore { name, attributes: attributes(e)? });
                            text_content.clear();
                        }
                        _ => {}
                    }
                }
                Event::Empty(_) if pending.is_some() => {}
                Event::Empty(ref e) => match (section, e.local_name().as_ref()) {
                    (Section::Manifest, b"item") => package.add_manifest_item(e)?,
                    (Section::Spine, b"itemref") => package.add_spine_item(e)?,
                    (Section::Metadata, b"meta") => package.metadata.add_meta(Self::parse_meta(e)?),
                    (Section::Metadata, _) => {
                        // 没有内容的Dublin Core元素，如 <dc:title/>
                        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        package.metadata.add_dublin_core(name, String::new(), attributes(e)?);
                    }
                    (_, b"spine") => package.read_spine_attributes(e)?,
                    _ => {}
                },
                Event::End(_) if nested_depth > 0 => nested_depth -= 1,
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"metadata" | b"manifest" | b"spine" => section = Section::None,
                    _ if section == Section::Metadata => {
                        match pending.take() {
                            Some(Pending::DublinCore { name, attributes }) => {
                                package.metadata.add_dublin_core(name, text_content.trim().to_string(), attributes);
                            }
                            Some(Pending::Meta(mut meta)) => {
                                meta.value = text_content.trim().to_string();
                                package.metadata.add_meta(meta);
                            }
                            None => {}
                        }
                        text_content.clear();
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    if pending.is_some() {
                        text_content.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if pending.is_some() {
                        text_content.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        package.validate_spine()?;
        Ok(package)
    }

    /// 解析package元素的version与unique-identifier属性
    fn read_package_attributes(&mut self, e: &BytesStart) -> Result<()> {
        let attrs = attributes(e)?;
        self.version = attrs.get("version").cloned().unwrap_or_default();
        self.unique_identifier_id = attrs.get("unique-identifier").cloned();
        Ok(())
    }

    /// 解析spine元素的toc与page-progression-direction属性
    fn read_spine_attributes(&mut self, e: &BytesStart) -> Result<()> {
        let attrs = attributes(e)?;
        self.spine.toc = attrs.get("toc").cloned().filter(|t| !t.is_empty());
        self.spine.page_progression_direction = attrs.get("page-progression-direction").cloned();
        Ok(())
    }

    /// 解析meta标签的属性
    fn parse_meta(e: &BytesStart) -> Result<Meta> {
        let mut attrs = attributes(e)?;
        Ok(Meta {
            name: attrs.remove("name"),
            content: attrs.remove("content"),
            property: attrs.remove("property"),
            refines: attrs
                .remove("refines")
                .map(|r| r.strip_prefix('#').map(str::to_string).unwrap_or(r)),
            id: attrs.remove("id"),
            scheme: attrs.remove("scheme"),
            value: String::new(),
        })
    }

    /// 解析清单项
    fn add_manifest_item(&mut self, e: &BytesStart) -> Result<()> {
        let mut attrs = attributes(e)?;

        let id = attrs
            .remove("id")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EpubError::MalformedPackage("清单项缺少id属性".to_string()))?;
        let href = attrs
            .remove("href")
            .filter(|href| !href.is_empty())
            .ok_or_else(|| EpubError::MalformedPackage(format!("清单项 {} 缺少href属性", id)))?;
        let media_type = attrs.remove("media-type").unwrap_or_else(|| {
            warn!(id = %id, "清单项缺少media-type属性");
            String::new()
        });

        if self.manifest.contains_key(&id) {
            return Err(EpubError::MalformedPackage(format!("清单项ID重复: {}", id)));
        }

        let (href_path, _) = path::split_fragment(&href);
        let full_path = path::resolve(&self.base_dir, href_path);

        let entry = ManifestEntry {
            id: id.clone(),
            href,
            full_path,
            media_type,
            properties: attrs.remove("properties"),
            media_overlay: attrs.remove("media-overlay").filter(|id| !id.is_empty()),
        };
        self.manifest_order.push(id.clone());
        self.manifest.insert(id, entry);
        Ok(())
    }

    /// 解析脊柱项
    fn add_spine_item(&mut self, e: &BytesStart) -> Result<()> {
        let attrs = attributes(e)?;

        let idref = attrs
            .get("idref")
            .filter(|idref| !idref.is_empty())
            .cloned()
            .ok_or_else(|| EpubError::MalformedPackage("脊柱项缺少idref属性".to_string()))?;
        let linear = attrs.get("linear").is_none_or(|value| value.trim() != "no");

        self.spine.items.push(SpineItem::with_linear(idref, linear));
        Ok(())
    }

    /// 脊柱中的每一项都必须引用存在的清单项
    fn validate_spine(&self) -> Result<()> {
        if let Some(item) = self.spine.items.iter().find(|item| !self.manifest.contains_key(&item.idref)) {
            return Err(EpubError::MalformedPackage(format!(
                "脊柱引用了不存在的清单项: {}",
                item.idref
            )));
        }
        Ok(())
    }

    /// 按文档顺序遍历清单项
    pub fn manifest_entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.manifest_order.iter().filter_map(|id| self.manifest.get(id))
    }

    /// 根据ID获取清单项
    pub fn manifest_entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.get(id)
    }

    /// 获取书名，缺失时为空字符串
    pub fn title(&self) -> String {
        self.metadata.title().unwrap_or_default().to_string()
    }

    /// 获取第一个作者，缺失时为空字符串
    pub fn author(&self) -> String {
        self.metadata
            .creators()
            .into_iter()
            .next()
            .map(|creator| creator.name)
            .unwrap_or_default()
    }

    /// 获取unique-identifier指向的标识符值
    pub fn unique_identifier(&self) -> Option<String> {
        let id = self.unique_identifier_id.as_deref()?;
        self.metadata.identifier_by_id(id).map(|identifier| identifier.value)
    }

    /// 解析封面图片
    ///
    /// 优先级：
    /// 1. `<meta name="cover" content="ID">` 指向的清单项（content也可能直接是href）
    /// 2. 带有 `cover-image` 属性的清单项
    /// 3. ID符合配置中封面命名约定的图片清单项
    pub fn cover_image(&self, config: &ParserConfig) -> Option<CoverImage> {
        if let Some(cover) = self.metadata.find_meta_by_name("cover") {
            let found = self
                .manifest
                .get(cover)
                .or_else(|| self.manifest_entries().find(|entry| entry.href == cover));
            match found {
                Some(entry) => return Some(CoverImage::from(entry)),
                None => warn!(cover, "meta cover指向的清单项不存在"),
            }
        }

        if let Some(entry) = self.manifest_entries().find(|entry| entry.is_cover_image()) {
            return Some(CoverImage::from(entry));
        }

        self.manifest_entries()
            .find(|entry| entry.is_image() && config.is_cover_id(&entry.id))
            .map(CoverImage::from)
    }

    /// 定位目录导航文档
    ///
    /// 优先使用NCX：脊柱的 `toc` 属性、NCX媒体类型、`.ncx` 扩展名；
    /// 其次是带有 `nav` 属性的EPUB3导航文档。
    pub fn nav_document(&self) -> Option<NavDocument> {
        let ncx = |entry: &ManifestEntry| NavDocument {
            manifest_id: entry.id.clone(),
            full_path: entry.full_path.clone(),
            kind: NavKind::Ncx,
        };

        if let Some(toc_id) = self.spine.toc.as_deref() {
            match self.manifest.get(toc_id) {
                Some(entry) => return Some(ncx(entry)),
                None => warn!(toc_id, "spine的toc属性指向的清单项不存在"),
            }
        }

        if let Some(entry) = self.manifest_entries().find(|entry| entry.is_ncx()) {
            return Some(ncx(entry));
        }

        // 媒体类型写错的非标准书籍按扩展名兜底
        if let Some(entry) = self.manifest_entries().find(|entry| {
            MediaType::by_file_name(&entry.full_path).is_some_and(|t| t.name == media_type::NCX)
        }) {
            return Some(ncx(entry));
        }

        self.manifest_entries().find(|entry| entry.is_nav()).map(|entry| NavDocument {
            manifest_id: entry.id.clone(),
            full_path: entry.full_path.clone(),
            kind: NavKind::Xhtml,
        })
    }
}

/// 收集元素的全部属性，键为去掉命名空间前缀的本地名
pub(crate) fn attributes(e: &BytesStart) -> Result<BTreeMap<String, String>> {
    let mut attrs = BTreeMap::new();
    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// 从归档中读取并解析OPF包文档
///
/// XML语法错误映射为 `EpubError::MalformedPackage`；包文档本身缺失时返回 `EpubError::EntryNotFound`。
pub fn parse_package(archive: &mut Archive, root_path: &str) -> Result<Package> {
    let content = archive.read_entry_to_string(root_path)?;
    let package = Package::parse_xml(&content, root_path).map_err(|e| e.xml_into(EpubError::MalformedPackage))?;

    if package.metadata.title().is_none() {
        warn!(root_path, "包文档缺少dc:title");
    }
    if package.metadata.creators().is_empty() {
        warn!(root_path, "包文档缺少dc:creator");
    }

    debug!(
        root_path,
        version = %package.version,
        manifest = package.manifest.len(),
        spine = package.spine.len(),
        "解析OPF完成"
    );
    Ok(package)
}
