use anyhow::Result;
use serde::Deserialize;

static CONFIG_FILE: &str = "config";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// 元数据页面地址模板，{name}会被替换为漫画标识
    #[serde(default = "default_page_url")]
    pub page_url: String,
    /// 图片地址模板，{cdn}/{name}/{chapter}/{page}会被替换
    #[serde(default = "default_image_url")]
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry: RetrySettings::default(),
            output_dir: default_output_dir(),
            page_url: default_page_url(),
            image_url: default_image_url(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Settings {
    /// 读取工作目录下的config.toml，不存在时全部使用默认值
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(
                config::File::with_name(CONFIG_FILE)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("配置文件反序列化失败: {}", e))
    }
}

fn default_output_dir() -> String {
    "mangas".to_owned()
}

fn default_page_url() -> String {
    "https://mangasee123.com/read-online/{name}-chapter-1-page-1.html".to_owned()
}

fn default_image_url() -> String {
    "https://{cdn}/manga/{name}/{chapter}-{page}.png".to_owned()
}

fn default_max_attempts() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    300
}
