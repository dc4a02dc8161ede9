//! 测试用的EPUB构造工具
//!
//! 单元测试直接使用；`tests/common` 通过 `#[path]` 引入同一份文件。

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

pub const MINIMAL_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>测试书籍</dc:title>
        <dc:creator>测试作者</dc:creator>
        <dc:identifier id="BookId">urn:uuid:0000</dc:identifier>
    </metadata>
    <manifest>
        <item id="chapter1" href="text/chapter1.xhtml" media-type="application/xhtml+xml"/>
    </manifest>
    <spine>
        <itemref idref="chapter1"/>
    </spine>
</package>"#;

pub const CHAPTER_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>第一章</title></head>
<body><h1>第一章</h1></body></html>"#;

/// 以内存中的条目列表描述一个EPUB文件，按插入顺序写入ZIP
pub struct EpubFixture {
    mimetype: Option<String>,
    files: Vec<(String, Vec<u8>)>,
}

impl EpubFixture {
    /// 只有mimetype的空归档
    pub fn empty() -> Self {
        Self {
            mimetype: Some("application/epub+zip".to_string()),
            files: Vec::new(),
        }
    }

    /// 包含container.xml、OPF和一个章节的最小EPUB
    pub fn minimal() -> Self {
        Self::empty()
            .with_file("META-INF/container.xml", CONTAINER_XML)
            .with_file("OEBPS/content.opf", MINIMAL_OPF)
            .with_file("OEBPS/text/chapter1.xhtml", CHAPTER_XHTML)
    }

    pub fn with_mimetype(mut self, mimetype: &str) -> Self {
        self.mimetype = Some(mimetype.to_string());
        self
    }

    pub fn without_mimetype(mut self) -> Self {
        self.mimetype = None;
        self
    }

    /// 添加或替换条目
    pub fn with_file(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        match self.files.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = content,
            None => self.files.push((name.to_string(), content)),
        }
        self
    }

    pub fn without_file(mut self, name: &str) -> Self {
        self.files.retain(|(existing, _)| existing != name);
        self
    }

    /// 写入 `dir/name` 并返回完整路径
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        // OCF要求mimetype是第一个条目且不压缩
        if let Some(mimetype) = &self.mimetype {
            zip.start_file("mimetype", options.compression_method(CompressionMethod::Stored))
                .unwrap();
            zip.write_all(mimetype.as_bytes()).unwrap();
        }
        for (entry, content) in &self.files {
            zip.start_file(entry.as_str(), options).unwrap();
            zip.write_all(content).unwrap();
        }

        zip.finish().unwrap();
        path
    }
}
