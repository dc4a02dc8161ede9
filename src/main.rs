use clap::Parser;
use epubcore::{Book, BookRenderer, EpubError, ParserConfig, TextSummary, TocTreeStyle, YamlDump};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// 命令行工具的错误：解析错误之外还包括写出封面时的失败
#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Epub(#[from] EpubError),

    #[error("这本书没有封面图片，无法写入 {0}")]
    NoCover(PathBuf),

    #[error("无法写入封面 {path}: {source}")]
    CoverWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 📚 epubcore - EPUB解析工具
#[derive(Parser)]
#[command(name = "epubcore")]
#[command(about = "解析EPUB文件的容器、包文档与目录")]
#[command(version)]
struct Args {
    /// EPUB文件路径
    #[arg(help = "要解析的EPUB文件路径")]
    epub_file: PathBuf,

    /// 详细输出模式
    #[arg(short, long, help = "输出调试日志")]
    verbose: bool,

    /// 显示元数据信息
    #[arg(short, long, help = "显示完整的Dublin Core元数据")]
    metadata: bool,

    /// 显示目录树
    #[arg(short, long, help = "显示层级目录树")]
    toc: bool,

    /// 显示展平目录
    #[arg(short, long, help = "显示前序展平的目录")]
    flat: bool,

    /// 目录树显示样式
    #[arg(long, value_enum, default_value = "tree", help = "目录树的显示样式")]
    style: StyleArg,

    /// 目录最大显示深度
    #[arg(long, help = "目录最大显示深度（不指定表示显示所有）")]
    max_depth: Option<usize>,

    /// 以YAML输出整本书
    #[arg(long, help = "以YAML格式输出解析结果")]
    yaml: bool,

    /// 封面输出路径
    #[arg(long, help = "把封面图片写入指定文件")]
    cover_out: Option<PathBuf>,

    /// 解析配置文件
    #[arg(long, help = "YAML格式的解析配置文件")]
    config: Option<PathBuf>,
}

/// 目录树显示样式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    /// 树状符号（├── └──）
    Tree,
    /// 缩进（• ）
    Indented,
}

impl From<StyleArg> for TocTreeStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Tree => TocTreeStyle::TreeSymbols,
            StyleArg::Indented => TocTreeStyle::Indented,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match process_epub(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn process_epub(args: &Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => ParserConfig::from_file(path)?,
        None => ParserConfig::default(),
    };

    let book = Book::assemble_with_config(&args.epub_file, &config)?;

    let output = if args.yaml {
        YamlDump.render(&book)
    } else {
        TextSummary {
            show_metadata: args.metadata,
            show_toc: args.toc,
            show_flat_toc: args.flat,
            style: args.style.into(),
            max_depth: args.max_depth,
        }
        .render(&book)
    };
    print!("{}", output);

    if let Some(cover_out) = &args.cover_out {
        let written = write_cover(book.cover_image_bytes(), cover_out)?;
        eprintln!("🖼️  封面已写入 {} ({} 字节)", cover_out.display(), written);
    }

    Ok(())
}

/// 把封面图片写入用户指定的文件，返回写入的字节数
fn write_cover(bytes: Option<&[u8]>, cover_out: &Path) -> Result<usize, CliError> {
    let bytes = bytes.ok_or_else(|| CliError::NoCover(cover_out.to_path_buf()))?;
    std::fs::write(cover_out, bytes).map_err(|source| CliError::CoverWrite {
        path: cover_out.to_path_buf(),
        source,
    })?;
    Ok(bytes.len())
}
