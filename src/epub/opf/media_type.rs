//! 媒体类型模块
//!
//! EPUB中常见资源的媒体类型登记表，可按名称或文件扩展名查找。

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const XHTML: &str = "application/xhtml+xml";
pub const NCX: &str = "application/x-dtbncx+xml";
pub const OPF: &str = "application/oebps-package+xml";
pub const CSS: &str = "text/css";
pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";
pub const GIF: &str = "image/gif";
pub const SVG: &str = "image/svg+xml";
pub const SMIL: &str = "application/smil+xml";

/// 一种已知的媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaType {
    /// 媒体类型名称，如 `image/jpeg`
    pub name: &'static str,
    /// 默认扩展名
    pub default_extension: &'static str,
    /// 所有可识别的扩展名
    pub extensions: &'static [&'static str],
}

const fn media_type(
    name: &'static str,
    default_extension: &'static str,
    extensions: &'static [&'static str],
) -> MediaType {
    MediaType { name, default_extension, extensions }
}

static KNOWN_TYPES: &[MediaType] = &[
    media_type(XHTML, "xhtml", &["htm", "html", "xhtml", "xml"]),
    media_type("application/epub+zip", "epub", &["epub"]),
    media_type(NCX, "ncx", &["ncx"]),
    media_type(OPF, "opf", &["opf"]),
    media_type("text/javascript", "js", &["js"]),
    media_type(CSS, "css", &["css"]),
    media_type(JPEG, "jpg", &["jpg", "jpeg"]),
    media_type(PNG, "png", &["png"]),
    media_type(GIF, "gif", &["gif"]),
    media_type(SVG, "svg", &["svg"]),
    media_type("image/webp", "webp", &["webp"]),
    media_type("application/x-font-ttf", "ttf", &["ttf"]),
    media_type("application/vnd.ms-opentype", "otf", &["otf"]),
    media_type("application/font-woff", "woff", &["woff"]),
    media_type("audio/mpeg", "mp3", &["mp3"]),
    media_type("audio/mp4", "mp4", &["mp4", "m4a"]),
    media_type("audio/ogg", "ogg", &["ogg"]),
    media_type(SMIL, "smil", &["smil"]),
    media_type("application/adobe-page-template+xml", "xpgt", &["xpgt"]),
    media_type("application/pls+xml", "pls", &["pls"]),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static MediaType>> =
    Lazy::new(|| KNOWN_TYPES.iter().map(|t| (t.name, t)).collect());

static BY_EXTENSION: Lazy<HashMap<&'static str, &'static MediaType>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for known in KNOWN_TYPES {
        for ext in known.extensions {
            map.entry(*ext).or_insert(known);
        }
    }
    map
});

impl MediaType {
    /// 根据媒体类型名称查找
    pub fn by_name(name: &str) -> Option<&'static MediaType> {
        BY_NAME.get(name.trim()).copied()
    }

    /// 根据文件扩展名查找（不区分大小写）
    pub fn by_file_name(file_name: &str) -> Option<&'static MediaType> {
        let ext = extension(file_name)?.to_ascii_lowercase();
        BY_EXTENSION.get(ext.as_str()).copied()
    }
}

fn extension(file_name: &str) -> Option<&str> {
    let name = file_name.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

/// 判断媒体类型名称是否为图片
pub fn is_image(name: &str) -> bool {
    name.trim().starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        let ncx = MediaType::by_name(NCX).unwrap();
        assert_eq!(ncx.default_extension, "ncx");
        assert!(MediaType::by_name("application/x-unknown").is_none());
    }

    #[test]
    fn test_by_file_name() {
        assert_eq!(MediaType::by_file_name("images/Cover.JPEG").unwrap().name, JPEG);
        assert_eq!(MediaType::by_file_name("toc.ncx").unwrap().name, NCX);
        assert!(MediaType::by_file_name("README").is_none());
        assert!(MediaType::by_file_name("dir.d/README").is_none());
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(SVG));
        assert!(is_image(" image/png "));
        assert!(!is_image(SMIL));
    }
}
