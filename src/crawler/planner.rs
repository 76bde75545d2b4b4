use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::Settings;
use crate::crawler::parser::Metadata;

/// 一个批次：连续的章节区间和按顺序排列的图片地址
#[derive(Debug, Clone)]
pub struct Batch {
    pub start: u32,
    pub end: u32,
    pub urls: Vec<String>,
    pub output_path: PathBuf,
}

/// 第i个批次覆盖的章节区间（闭区间）
///
/// 命令行层已把章节和批次大小限制为正数，size为0时这里仍退化为
/// 单章区间而不是下溢
pub fn batch_bounds(chapter: u32, size: u32, index: u32) -> (u32, u32) {
    let start = chapter + index * size;
    (start, start + size.saturating_sub(1))
}

/// 纯函数：生成一个章节的全部图片地址，页码从1开始
/// 章节编号补零到4位，页码补零到3位
pub fn page_urls(template: &str, name: &str, cdn: &str, chapter: u32, pages: u32) -> Vec<String> {
    (1..=pages)
        .map(|page| {
            template
                .replace("{cdn}", cdn)
                .replace("{name}", name)
                .replace("{chapter}", &format!("{:04}", chapter))
                .replace("{page}", &format!("{:03}", page))
        })
        .collect()
}

/// 批次的输出文件路径，文件存在即视为该批次已完成
pub fn output_path(output_dir: &str, name: &str, start: u32, end: u32) -> PathBuf {
    Path::new(output_dir)
        .join(name)
        .join(format!("{}-Batch-{}-{}.pdf", name, start, end))
}

/// 规划一个批次
///
/// 结束章节超出元数据范围时收缩到最大可用章节；收缩后起始大于结束则
/// 放弃该批次返回None（运行继续）；区间内缺失的章节记录日志后跳过
pub fn plan_batch(
    settings: &Settings,
    name: &str,
    metadata: &Metadata,
    start: u32,
    mut end: u32,
) -> Option<Batch> {
    if let Some(max) = metadata.max_chapter() {
        if end > max {
            end = max;
        }
    }

    if start > end {
        warn!("起始章节不能大于结束章节: {} > {}", start, end);
        return None;
    }

    let mut urls = Vec::new();
    for number in start..=end {
        let Some(chapter) = metadata.find(number) else {
            warn!("章节未找到: {}", number);
            continue;
        };
        urls.extend(page_urls(
            &settings.image_url,
            name,
            &metadata.images_cdn,
            number,
            chapter.pages,
        ));
    }

    Some(Batch {
        start,
        end,
        urls,
        output_path: output_path(&settings.output_dir, name, start, end),
    })
}
