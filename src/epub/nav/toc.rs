//! 目录树（Table of Contents Tree）模块
//!
//! 提供目录的树形表示、前序展平以及文本显示功能。

use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::epub::path;

/// 目录树显示样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TocTreeStyle {
    /// 使用树状符号（├── └──）
    #[default]
    TreeSymbols,
    /// 使用缩进和符号（• ）
    Indented,
}

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// 标题
    pub title: String,
    /// 解析后的归档内路径（不含片段），外部链接保持原样
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// 片段标识符（`#` 之后的部分）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    /// href对应的清单项ID，悬空引用时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_id: Option<String>,
    /// 子目录项
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    /// 根据导航文档中的链接目标创建目录项
    ///
    /// `target` 相对于 `doc_path` 所在目录解析；只有片段的链接指向导航文档自身。
    pub fn from_target(title: String, target: Option<&str>, doc_path: &str) -> Self {
        let (href, fragment) = match target.map(str::trim).filter(|t| !t.is_empty()) {
            Some(target) if path::is_external(target) => (Some(target.to_string()), None),
            Some(target) => {
                let (href_path, fragment) = path::split_fragment(target);
                let href = if href_path.is_empty() {
                    doc_path.to_string()
                } else {
                    path::resolve(path::parent_dir(doc_path), href_path)
                };
                (Some(href), fragment.map(str::to_string))
            }
            None => (None, None),
        };

        Self {
            title,
            href,
            fragment,
            manifest_id: None,
            children: Vec::new(),
        }
    }

    /// 获取节点及其所有子节点的数量
    pub fn total_nodes(&self) -> usize {
        1 + self.children.iter().map(TocEntry::total_nodes).sum::<usize>()
    }

    /// 以当前节点深度为0计算子树的最大深度
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.max_depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// 叶子节点数
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(TocEntry::leaf_count).sum()
        }
    }

    /// 根据路径数组获取子节点，`[]` 表示当前节点本身
    pub fn node_by_path(&self, path: &[usize]) -> Option<&TocEntry> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.children.get(*first)?.node_by_path(rest),
        }
    }

    fn flatten_into(&self, depth: usize, out: &mut Vec<FlatTocEntry>) {
        out.push(FlatTocEntry {
            title: self.title.clone(),
            href: self.href.clone(),
            fragment: self.fragment.clone(),
            manifest_id: self.manifest_id.clone(),
            depth,
        });
        for child in &self.children {
            child.flatten_into(depth + 1, out);
        }
    }
}

/// 展平后的目录项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatTocEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_id: Option<String>,
    /// 层级深度，顶层为0
    pub depth: usize,
}

/// 目录树结构
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TocTree {
    /// 导航文档标题（NCX的docTitle）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// 根节点列表
    pub roots: Vec<TocEntry>,
}

impl TocTree {
    pub fn new(roots: Vec<TocEntry>) -> Self {
        Self { title: None, roots }
    }

    /// 设置文档标题
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// 前序深度优先展平：先父节点，再依次展开每个子树
    pub fn flatten(&self) -> Vec<FlatTocEntry> {
        let mut flat = Vec::new();
        for root in &self.roots {
            root.flatten_into(0, &mut flat);
        }
        flat
    }

    /// 按前序遍历访问所有目录项
    pub fn entries(&self) -> Vec<&TocEntry> {
        fn walk<'a>(entry: &'a TocEntry, out: &mut Vec<&'a TocEntry>) {
            out.push(entry);
            for child in &entry.children {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, &mut out);
        }
        out
    }

    /// 按前序遍历可变地访问所有目录项
    pub(crate) fn for_each_mut(&mut self, mut visit: impl FnMut(&mut TocEntry)) {
        fn walk(entry: &mut TocEntry, visit: &mut impl FnMut(&mut TocEntry)) {
            visit(entry);
            for child in &mut entry.children {
                walk(child, visit);
            }
        }

        for root in &mut self.roots {
            walk(root, &mut visit);
        }
    }

    /// 根据路径数组获取节点
    ///
    /// - `[0]` 表示第一个根节点
    /// - `[1, 0, 2]` 表示第二个根节点的第一个子节点的第三个子节点
    pub fn node_by_path(&self, path: &[usize]) -> Option<&TocEntry> {
        let (first, rest) = path.split_first()?;
        self.roots.get(*first)?.node_by_path(rest)
    }

    /// 根据归档内路径查找第一个目录项
    pub fn find_by_href(&self, href: &str) -> Option<&TocEntry> {
        self.entries().into_iter().find(|entry| entry.href.as_deref() == Some(href))
    }

    /// 获取目录树的统计信息
    pub fn statistics(&self) -> TocStatistics {
        TocStatistics {
            total_nodes: self.roots.iter().map(TocEntry::total_nodes).sum(),
            max_depth: self.roots.iter().map(TocEntry::max_depth).max().unwrap_or(0),
            leaf_count: self.roots.iter().map(TocEntry::leaf_count).sum(),
            root_count: self.roots.len(),
        }
    }

    /// 创建可配置样式的显示视图
    pub fn display(&self) -> TocDisplay<'_> {
        TocDisplay {
            tree: self,
            style: TocTreeStyle::default(),
            show_paths: false,
            max_depth: None,
        }
    }
}

impl Display for TocTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.display(), f)
    }
}

/// 目录树的文本视图
#[derive(Debug, Clone, Copy)]
pub struct TocDisplay<'a> {
    tree: &'a TocTree,
    style: TocTreeStyle,
    show_paths: bool,
    max_depth: Option<usize>,
}

impl TocDisplay<'_> {
    /// 设置显示样式
    pub fn with_style(mut self, style: TocTreeStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示文件路径
    pub fn with_show_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// 设置最大显示深度（None表示显示所有）
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn label(&self, entry: &TocEntry) -> String {
        match (&entry.href, self.show_paths) {
            (Some(href), true) => match &entry.fragment {
                Some(fragment) => format!("{} → {}#{}", entry.title, href, fragment),
                None => format!("{} → {}", entry.title, href),
            },
            _ => entry.title.clone(),
        }
    }

    fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }

    /// 渲染树状符号风格
    fn render_tree_style(&self, entry: &TocEntry, depth: usize, is_last: bool, prefix: &str, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        let branch = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, branch, self.label(entry)));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        for (index, child) in entry.children.iter().enumerate() {
            let is_child_last = index == entry.children.len() - 1;
            self.render_tree_style(child, depth + 1, is_child_last, &child_prefix, result);
        }
    }

    /// 渲染缩进风格
    fn render_indent_style(&self, entry: &TocEntry, depth: usize, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        let indent = "  ".repeat(depth);
        result.push_str(&format!("{}• {}\n", indent, self.label(entry)));

        for child in &entry.children {
            self.render_indent_style(child, depth + 1, result);
        }
    }
}

impl Display for TocDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut result = String::new();

        if let Some(ref title) = self.tree.title {
            let depth_info = match self.max_depth {
                Some(max_depth) => format!(" (深度限制: {})", max_depth),
                None => String::new(),
            };
            result.push_str(&format!("📖 {}{}\n", title, depth_info));
            result.push_str("═══════════════════════════════════════\n");
        }

        let roots = &self.tree.roots;
        for (index, root) in roots.iter().enumerate() {
            match self.style {
                TocTreeStyle::TreeSymbols => {
                    self.render_tree_style(root, 0, index == roots.len() - 1, "", &mut result)
                }
                TocTreeStyle::Indented => self.render_indent_style(root, 0, &mut result),
            }
        }

        write!(f, "{}", result)
    }
}

/// 目录树统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocStatistics {
    /// 总节点数
    pub total_nodes: usize,
    /// 最大深度，顶层为0
    pub max_depth: usize,
    /// 叶子节点数
    pub leaf_count: usize,
    /// 根节点数
    pub root_count: usize,
}

impl Display for TocStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "目录统计: {} 个章节, {} 个根节点, {} 个叶子节点, 最大深度: {}",
            self.total_nodes, self.root_count, self.leaf_count, self.max_depth
        )
    }
}
