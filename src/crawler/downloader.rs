use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;
use tokio::time::sleep;
use tracing::warn;

use crate::config::RetrySettings;

pub struct Downloader {
    client: Client,
    retry: RetrySettings,
}

impl Downloader {
    pub fn new(retry: RetrySettings) -> Self {
        Self {
            client: Client::new(),
            retry,
        }
    }

    /// 带重试的GET请求，返回原始字节
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        self.fetch(url)
            .await
            .with_context(|| format!("下载失败: {}", url))
    }

    /// 带重试的GET请求，返回文本
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self
            .fetch(url)
            .await
            .with_context(|| format!("页面获取失败: {}", url))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    // 线性退避：第n次失败后等待 n * base_delay 再重试
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_fetch(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.retry.max_attempts => {
                    warn!(
                        "请求失败({}/{}): {}: {}",
                        attempt, self.retry.max_attempts, url, e
                    );
                    sleep(retry_delay(attempt, self.retry.base_delay_ms)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> reqwest::Result<Bytes> {
        // 错误状态码也算失败，与超时、断连一样走重试
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.bytes().await
    }
}

fn retry_delay(attempt: u32, base_delay_ms: u64) -> Duration {
    Duration::from_millis(u64::from(attempt) * base_delay_ms)
}
