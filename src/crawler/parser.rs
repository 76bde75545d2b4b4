use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::extractor::extract_between;

static CHAPTERS_START: &str = "vm.CHAPTERS = ";
static CHAPTERS_END: &str = ";";
static CDN_START: &str = "vm.CurPathName = \"";
static CDN_END: &str = "\";";

/// 章节描述：编号与页数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterDescriptor {
    pub number: u32,
    pub pages: u32,
}

#[derive(Debug, Clone)]
pub struct Metadata {
    pub images_cdn: String,
    /// 按章节编号升序排列
    pub chapters: Vec<ChapterDescriptor>,
}

impl Metadata {
    pub fn max_chapter(&self) -> Option<u32> {
        self.chapters.last().map(|c| c.number)
    }

    pub fn find(&self, number: u32) -> Option<&ChapterDescriptor> {
        self.chapters.iter().find(|c| c.number == number)
    }
}

#[derive(Deserialize)]
struct RawChapter {
    #[serde(rename = "Chapter")]
    chapter: String,
    #[serde(rename = "Page")]
    pages: NumOrStr,
}

// 站点返回的页数有时是数字有时是数字字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(u32),
    Str(String),
}

impl NumOrStr {
    fn value(&self) -> Result<u32> {
        match self {
            NumOrStr::Num(n) => Ok(*n),
            NumOrStr::Str(s) => s
                .trim()
                .parse()
                .with_context(|| format!("页数无法解析: {}", s)),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Parser;

impl Parser {
    /// 从阅读页面的原始文本中解析章节列表和图片CDN地址
    ///
    /// 章节列表缺失或JSON格式错误是致命错误，没有章节列表整个运行无法继续
    #[instrument(skip_all)]
    pub fn metadata(&self, page: &str) -> Result<Metadata> {
        let raw = extract_between(page, CHAPTERS_START, CHAPTERS_END);
        if raw.is_empty() {
            anyhow::bail!("无法从页面中提取章节列表");
        }
        let raw_chapters: Vec<RawChapter> =
            serde_json::from_str(raw).context("章节列表JSON解析失败")?;

        let mut chapters = Vec::with_capacity(raw_chapters.len());
        for raw_chapter in &raw_chapters {
            chapters.push(ChapterDescriptor {
                number: decorated_number(&raw_chapter.chapter)?,
                pages: raw_chapter.pages.value()?,
            });
        }
        chapters.sort_by_key(|c| c.number);

        let images_cdn = extract_between(page, CDN_START, CDN_END).to_owned();
        if images_cdn.is_empty() {
            warn!("未找到图片CDN地址");
        }

        info!("元数据解析完成，共 {} 个章节", chapters.len());
        Ok(Metadata {
            images_cdn,
            chapters,
        })
    }
}

// 章节编号是装饰过的字符串，去掉首尾各一个字符后才是数字
fn decorated_number(decorated: &str) -> Result<u32> {
    let mut chars = decorated.chars();
    chars.next();
    chars.next_back();
    chars
        .as_str()
        .parse()
        .with_context(|| format!("章节编号无法解析: {}", decorated))
}

#[cfg(test)]
mod tests {
    use super::*;

    static PAGE: &str = r#"
        <script>
        vm.CurPathName = "cdn.example.net";
        vm.CHAPTERS = [{"Chapter":"100030","Page":"12"},{"Chapter":"100010","Page":8},{"Chapter":"100020","Page":"5"}];
        </script>
    "#;

    #[test]
    fn chapters_are_sorted_ascending_with_decoration_stripped() {
        let metadata = Parser.metadata(PAGE).unwrap();
        assert_eq!(
            metadata.chapters,
            vec![
                ChapterDescriptor { number: 1, pages: 8 },
                ChapterDescriptor { number: 2, pages: 5 },
                ChapterDescriptor {
                    number: 3,
                    pages: 12
                },
            ]
        );
    }

    #[test]
    fn cdn_host_is_extracted() {
        let metadata = Parser.metadata(PAGE).unwrap();
        assert_eq!(metadata.images_cdn, "cdn.example.net");
    }

    #[test]
    fn missing_chapter_marker_is_fatal() {
        let result = Parser.metadata("<html>没有任何数据</html>");
        assert!(result.is_err());
    }

    #[test]
    fn malformed_chapter_json_is_fatal() {
        let page = r#"vm.CHAPTERS = [{"Chapter":}];"#;
        assert!(Parser.metadata(page).is_err());
    }

    #[test]
    fn pages_accept_number_or_string() {
        let page = r#"vm.CHAPTERS = [{"Chapter":"10017","Page":30},{"Chapter":"10027","Page":"31"}];"#;
        let metadata = Parser.metadata(page).unwrap();
        assert_eq!(metadata.chapters[0].pages, 30);
        assert_eq!(metadata.chapters[1].pages, 31);
    }

    #[test]
    fn unparsable_chapter_number_is_fatal() {
        let page = r#"vm.CHAPTERS = [{"Chapter":"x","Page":1}];"#;
        assert!(Parser.metadata(page).is_err());
    }
}
