use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use mangasee_fetch::config::Settings;
use mangasee_fetch::{MangaCrawler, logger, utils};

/// 漫画批量下载器：按章节区间抓取图片并按批次生成PDF
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// 漫画标识（站点URL中的名称）
    #[arg(long)]
    name: String,

    /// 起始章节
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    chapter: u32,

    /// 每个批次包含的章节数
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    size: u32,

    /// 批次数量，缺省时取起始章节数
    #[arg(long)]
    amount: Option<u32>,

    /// 只打印计划的批次范围，不下载
    #[arg(long)]
    log: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();

    let args = Args::parse();
    let settings = Settings::load()?;
    let crawler = MangaCrawler::new(settings);

    let start = Instant::now();
    crawler
        .run(&args.name, args.chapter, args.size, args.amount, args.log)
        .await?;
    utils::display_elapsed_time(start.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_chapter_or_size_is_rejected() {
        assert!(Args::try_parse_from(["mangasee-fetch", "--name", "Test", "--chapter", "0"]).is_err());
        assert!(Args::try_parse_from(["mangasee-fetch", "--name", "Test", "--size", "0"]).is_err());
        assert!(Args::try_parse_from(["mangasee-fetch", "--name", "Test"]).is_ok());
    }

    #[test]
    fn name_is_required() {
        assert!(Args::try_parse_from(["mangasee-fetch"]).is_err());
    }
}
