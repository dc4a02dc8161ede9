//! 集成测试用的EPUB构造工具

#![allow(dead_code)]

#[path = "../../src/epub/test_support.rs"]
mod test_support;

pub use test_support::{CONTAINER_XML, EpubFixture};

pub const SILVER_CHAIR_TITLE: &str = "The Silver Chair";
pub const SILVER_CHAIR_AUTHOR: &str = "C. S. Lewis";

pub const CHAPTER_TITLES: [&str; 16] = [
    "Behind the Gym",
    "Jill is Given a Task",
    "The Sailing of the King",
    "A Parliament of Owls",
    "Puddleglum",
    "The Wild Waste Lands of the North",
    "The Hill of the Strange Trenches",
    "The House of Harfang",
    "How They Discovered Something Worth Knowing",
    "Travels Without the Sun",
    "In the Dark Castle",
    "The Queen of Underland",
    "Underland Without the Queen",
    "The Bottom of the World",
    "The Disappearance of Jill",
    "The Healing of Harms",
];

/// 假的JPEG数据，只用于比对字节
pub const COVER_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0silver-chair-cover\xFF\xD9";

fn chapter_file(index: usize) -> String {
    format!("chapter{:02}.xhtml", index)
}

fn xhtml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{0}</title></head>
<body><h1>{0}</h1><p>…</p></body></html>"#,
        title
    )
}

fn silver_chair_opf() -> String {
    let mut items = String::new();
    let mut itemrefs = String::new();
    for index in 1..=CHAPTER_TITLES.len() {
        items.push_str(&format!(
            "    <item id=\"ch{0:02}\" href=\"{1}\" media-type=\"application/xhtml+xml\"/>\n",
            index,
            chapter_file(index)
        ));
        itemrefs.push_str(&format!("    <itemref idref=\"ch{:02}\"/>\n", index));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>{title}</dc:title>
    <dc:creator opf:role="aut" opf:file-as="Lewis, C. S.">{author}</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="BookId" opf:scheme="ISBN">9780064471091</dc:identifier>
    <dc:publisher>HarperCollins</dc:publisher>
    <meta name="cover" content="cvi"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="cvi" href="images/cover.jpg" media-type="image/jpeg"/>
    <item id="titlepage" href="title.xhtml" media-type="application/xhtml+xml"/>
{items}  </manifest>
  <spine toc="ncx">
    <itemref idref="titlepage" linear="no"/>
{itemrefs}  </spine>
</package>"#,
        title = SILVER_CHAIR_TITLE,
        author = SILVER_CHAIR_AUTHOR,
        items = items,
        itemrefs = itemrefs,
    )
}

fn silver_chair_ncx() -> String {
    let mut chapters = String::new();
    for (i, title) in CHAPTER_TITLES.iter().enumerate() {
        let index = i + 1;
        chapters.push_str(&format!(
            r#"      <navPoint id="np{0}" playOrder="{1}">
        <navLabel><text>{2}</text></navLabel>
        <content src="{3}"/>
      </navPoint>
"#,
            index,
            index + 1,
            title,
            chapter_file(index)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="9780064471091"/></head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
    <navPoint id="np0" playOrder="1">
      <navLabel><text>{title}</text></navLabel>
      <content src="title.xhtml"/>
{chapters}    </navPoint>
  </navMap>
</ncx>"#,
        title = SILVER_CHAIR_TITLE,
        chapters = chapters,
    )
}

/// 模拟《银椅》的EPUB2书籍：NCX目录有1个根节点和16个章节子节点，封面通过meta声明
pub fn silver_chair() -> EpubFixture {
    let mut fixture = EpubFixture::empty()
        .with_file("META-INF/container.xml", CONTAINER_XML)
        .with_file("OEBPS/content.opf", silver_chair_opf())
        .with_file("OEBPS/toc.ncx", silver_chair_ncx())
        .with_file("OEBPS/images/cover.jpg", COVER_BYTES.to_vec())
        .with_file("OEBPS/title.xhtml", xhtml(SILVER_CHAIR_TITLE));

    for (i, title) in CHAPTER_TITLES.iter().enumerate() {
        fixture = fixture.with_file(&format!("OEBPS/{}", chapter_file(i + 1)), xhtml(title));
    }
    fixture
}

/// 包文档模板：只替换manifest与spine，用于构造各种边界情况
pub fn package_with(metadata: &str, manifest: &str, spine: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:fixture</dc:identifier>
    {metadata}
  </metadata>
  <manifest>
    {manifest}
  </manifest>
  {spine}
</package>"#
    )
}

/// 只有一个章节的EPUB，包文档由调用方提供
pub fn single_chapter(opf: &str) -> EpubFixture {
    EpubFixture::empty()
        .with_file("META-INF/container.xml", CONTAINER_XML)
        .with_file("OEBPS/content.opf", opf)
        .with_file("OEBPS/ch1.xhtml", xhtml("Chapter 1"))
}

pub fn chapter_xhtml(title: &str) -> String {
    xhtml(title)
}
