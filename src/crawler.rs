pub mod downloader;
pub mod parser;
pub mod planner;

pub use downloader::Downloader;
pub use parser::{ChapterDescriptor, Metadata, Parser};
pub use planner::Batch;

use anyhow::Result;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::config::Settings;
use crate::pdf::PdfAssembler;

pub struct MangaCrawler {
    settings: Settings,
    downloader: Downloader,
    parser: Parser,
    assembler: PdfAssembler,
}

impl MangaCrawler {
    pub fn new(settings: Settings) -> Self {
        let downloader = Downloader::new(settings.retry);
        Self {
            settings,
            downloader,
            parser: Parser,
            assembler: PdfAssembler::new(),
        }
    }

    /// 按批次顺序下载并生成PDF，批次之间严格串行
    ///
    /// 单个批次失败只放弃该批次，元数据获取失败则终止整个运行。
    /// dry_run为true时只打印每个批次的计划范围，不发起任何请求
    #[instrument(skip_all, fields(manga = name))]
    pub async fn run(
        &self,
        name: &str,
        chapter: u32,
        size: u32,
        amount: Option<u32>,
        dry_run: bool,
    ) -> Result<()> {
        let batch_count = amount.unwrap_or(chapter);
        let mut metadata: Option<Metadata> = None;

        for index in 0..batch_count {
            let (start, end) = planner::batch_bounds(chapter, size, index);

            if dry_run {
                info!("计划批次: name={} start={} end={}", name, start, end);
                continue;
            }

            // 输出文件已存在时直接跳过，不再请求元数据和图片
            let requested = planner::output_path(&self.settings.output_dir, name, start, end);
            if requested.exists() {
                info!("跳过已存在的批次: {}", requested.display());
                continue;
            }

            // 元数据整个运行只获取一次
            let metadata = match &mut metadata {
                Some(metadata) => &*metadata,
                slot => slot.insert(self.fetch_metadata(name).await?),
            };

            let Some(batch) = planner::plan_batch(&self.settings, name, metadata, start, end)
            else {
                continue;
            };
            // 结束章节收缩后可能对应另一个已生成的文件
            if batch.output_path != requested && batch.output_path.exists() {
                info!("跳过已存在的批次: {}", batch.output_path.display());
                continue;
            }

            if let Some(dir) = batch.output_path.parent() {
                fs::create_dir_all(dir).await?;
            }

            if let Err(e) = self.assembler.assemble(&self.downloader, &batch).await {
                error!("批次 {}-{} 生成失败: {:#}", batch.start, batch.end, e);
            }
        }

        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn fetch_metadata(&self, name: &str) -> Result<Metadata> {
        let url = self.settings.page_url.replace("{name}", name);
        info!("正在获取元数据页面: {}", url);
        let page = self.downloader.fetch_text(&url).await?;
        self.parser.metadata(&page)
    }
}
