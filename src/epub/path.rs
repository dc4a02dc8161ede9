//! 归档内路径处理
//!
//! EPUB中的href都是相对于引用它的文档所在目录的URL片段，
//! 这里负责把它们解析为ZIP归档中的条目路径。

use percent_encoding::percent_decode_str;

/// 获取文件所在目录（不含结尾的`/`），位于归档根目录时返回空字符串
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// 把href拆分为路径部分和可选的片段标识符
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((path, fragment)) if !fragment.is_empty() => (path, Some(fragment)),
        Some((path, _)) => (path, None),
        None => (href, None),
    }
}

/// 将相对href解析为归档内的完整路径
///
/// 处理 `.` 与 `..` 段并解码百分号转义；片段标识符必须事先去掉。
/// 超出归档根目录的 `..` 会被忽略。
pub fn resolve(base_dir: &str, href: &str) -> String {
    let decoded = percent_decode_str(href).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    let joined;
    let source: &str = if decoded.starts_with('/') {
        &decoded
    } else {
        joined = if base_dir.is_empty() {
            decoded.to_string()
        } else {
            format!("{}/{}", base_dir, decoded)
        };
        &joined
    };

    for segment in source.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// 判断href是否指向外部资源
pub fn is_external(href: &str) -> bool {
    href.contains("://") || href.starts_with("mailto:")
}
