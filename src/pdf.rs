use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use printpdf::image_crate::DynamicImage;
use printpdf::{Image, ImageTransform, Mm, PdfDocument, PdfDocumentReference};
use tokio::fs;
use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::crawler::downloader::Downloader;
use crate::crawler::planner::Batch;

// B4纸张尺寸（毫米）
const PAGE_WIDTH_MM: f32 = 250.0;
const PAGE_HEIGHT_MM: f32 = 353.0;
// printpdf按该DPI把像素换算成物理尺寸
const IMAGE_DPI: f32 = 300.0;
// 失败后等待文件系统操作完成再继续下一个批次
const SETTLE_DELAY: Duration = Duration::from_millis(300);

pub struct PdfAssembler;

impl PdfAssembler {
    pub fn new() -> Self {
        Self
    }

    /// 按顺序下载批次内全部图片并生成PDF，每张图片占一页
    ///
    /// 任何一步失败都会删除写了一半的输出文件，该批次整体放弃，
    /// 没有断点续传
    #[instrument(skip_all, fields(output = %batch.output_path.display()))]
    pub async fn assemble(&self, downloader: &Downloader, batch: &Batch) -> Result<()> {
        match self.build(downloader, batch).await {
            Ok(()) => {
                info!("PDF已生成: {}", batch.output_path.display());
                Ok(())
            }
            Err(e) => {
                remove_partial(&batch.output_path).await;
                sleep(SETTLE_DELAY).await;
                Err(e)
            }
        }
    }

    async fn build(&self, downloader: &Downloader, batch: &Batch) -> Result<()> {
        let doc = PdfDocument::empty(format!("Batch-{}-{}", batch.start, batch.end));

        let total = batch.urls.len();
        for (index, url) in batch.urls.iter().enumerate() {
            info!("正在下载图片 {}/{}: {}", index + 1, total, url);
            let bytes = downloader.fetch_bytes(url).await?;
            let image = printpdf::image_crate::load_from_memory(&bytes)
                .with_context(|| format!("图片解码失败: {}", url))?;
            add_image_page(&doc, image);
        }

        let file = File::create(&batch.output_path)
            .with_context(|| format!("无法创建输出文件: {}", batch.output_path.display()))?;
        doc.save(&mut BufWriter::new(file)).context("PDF写入失败")?;
        Ok(())
    }
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

// 新建一页B4，图片缩放到页面宽度，顶部对齐，保持宽高比
fn add_image_page(doc: &PdfDocumentReference, image: DynamicImage) {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "image");
    let layer = doc.get_page(page).get_layer(layer);

    // 带透明通道的图片会让printpdf输出损坏的内容，统一转成RGB
    let buffer = image.to_rgb8();
    let (width, height) = buffer.dimensions();
    let rgb = DynamicImage::ImageRgb8(buffer);
    let transform = page_transform(width, height);
    Image::from_dynamic_image(&rgb).add_to_layer(layer, transform);
}

fn page_transform(width_px: u32, height_px: u32) -> ImageTransform {
    let scale = PAGE_WIDTH_MM / px_to_mm(width_px);
    ImageTransform {
        translate_x: Some(Mm(0.0)),
        translate_y: Some(Mm(PAGE_HEIGHT_MM - px_to_mm(height_px) * scale)),
        scale_x: Some(scale),
        scale_y: Some(scale),
        dpi: Some(IMAGE_DPI),
        ..Default::default()
    }
}

fn px_to_mm(px: u32) -> f32 {
    px as f32 * 25.4 / IMAGE_DPI
}

// 流程可能在输出文件创建之前就失败，删除前需确认文件存在
async fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path).await {
            error!("删除残留文件失败: {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_is_scaled_to_page_width() {
        // 300dpi下2953px约等于250mm页宽
        let transform = page_transform(2953, 4000);
        let scale = transform.scale_x.unwrap();
        assert!((scale - 1.0).abs() < 0.01);
        assert_eq!(transform.scale_x, transform.scale_y);
    }

    #[test]
    fn image_is_anchored_to_top_of_page() {
        let transform = page_transform(1000, 1000);
        // 正方形图片缩放后高度等于页宽，顶部对齐后下边距为页高减页宽
        let translate_y = transform.translate_y.unwrap();
        assert!((translate_y.0 - (PAGE_HEIGHT_MM - PAGE_WIDTH_MM)).abs() < 1e-3);
        assert_eq!(transform.translate_x, Some(Mm(0.0)));
    }

    #[tokio::test]
    async fn failed_fetch_mid_assembly_leaves_no_output_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output_path = dir.path().join("Test-Batch-1-1.pdf");
        // 模拟上一次运行留下的残留文件
        std::fs::write(&output_path, b"%PDF-").expect("write");

        let batch = Batch {
            start: 1,
            end: 1,
            urls: (1..=5)
                .map(|page| format!("http://127.0.0.1:0/manga/Test/0001-{:03}.png", page))
                .collect(),
            output_path: output_path.clone(),
        };
        // 地址不可达，下载必然失败
        let downloader = Downloader::new(crate::config::RetrySettings {
            max_attempts: 1,
            base_delay_ms: 0,
        });

        let result = PdfAssembler::new().assemble(&downloader, &batch).await;
        assert!(result.is_err());
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn remove_partial_deletes_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.pdf");
        std::fs::write(&path, b"%PDF-").expect("write");

        remove_partial(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn remove_partial_ignores_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        remove_partial(&dir.path().join("never-created.pdf")).await;
    }
}
