use config::Config;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::{env, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptLimits {
    pub rate_limit_per_sec: usize,
    pub refill_interval_ms: usize,
    pub refill_amount: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub key: String,
    pub endpoint: String,
    pub prompt_limits: PromptLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    pub min_batch_size: usize,
    pub poll_interval_ms: u64,
    pub worker_join_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub sub_batch_size: usize,
    pub concurrency: usize,
    pub run_item_cap: usize,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
    model: ModelConfig,
    ingest: IngestConfig,
    pipeline: PipelineConfig,
    categories: Vec<Category>,
}

#[derive(Debug)]
pub struct ServerConfig {
    pub api: ApiConfig,
    pub model: ModelConfig,
    pub ingest: IngestConfig,
    pub pipeline: PipelineConfig,
    pub categories: Vec<Category>,
}

impl std::fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Server Config:\nEndpoint: {}\n\nModel Config: {:?}\n\nIngest Config: {:?}\n\nPipeline Config: {:?}\n\nCategories:\n{}",
            self.api.endpoint,
            self.model,
            self.ingest,
            self.pipeline,
            self.categories
                .iter()
                .map(|c| format!("{} -> {}", c.name, c.description))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

lazy_static! {
    pub static ref cfg: ServerConfig = {
        let root = env::var("APP_DIR").unwrap_or_else(|_| {
            let dir =
                env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR or APP_DIR is required");
            let dir = Path::new(&dir).parent().unwrap().display().to_string();
            format!("{}/config", dir)
        });
        let path = format!("{root}/config.toml");
        let cfg_file: ConfigFile = Config::builder()
            .add_source(config::File::with_name(&path))
            .build()
            .expect("config.toml is required")
            .try_deserialize()
            .expect("config.toml is invalid");

        let ConfigFile {
            mut api,
            model,
            ingest,
            pipeline,
            categories,
        } = cfg_file;

        // The key in config.toml is a placeholder; the real one comes from env
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            api.key = key;
        }

        ServerConfig {
            api,
            model,
            ingest,
            pipeline,
            categories,
        }
    };
}
