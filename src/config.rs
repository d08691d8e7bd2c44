use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub supplier: SupplierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许跨域的前端地址
    pub cors_origin: String,
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// 分区文件目录
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierConfig {
    /// 按路径上传时，清单文件只能位于此目录内
    pub dir: PathBuf,
    /// 供应商清单表头所在行 (从 1 开始)
    pub header_row: usize,
    /// 单号别名列，按顺序取第一个非空值
    pub reference_columns: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                cors_origin: "http://localhost:3000".to_string(),
                body_limit_mb: 50,
            },
            store: StoreConfig {
                dir: PathBuf::from("saved_excels"),
            },
            supplier: SupplierConfig {
                dir: PathBuf::from("supplier_uploads"),
                header_row: 6,
                reference_columns: vec![
                    "DOCKET_NUMBER".to_string(),
                    "REFERENCE_NUMBER".to_string(),
                ],
            },
        }
    }
}

impl AppConfig {
    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.cors_origin", "http://localhost:3000")?
            .set_default("server.body_limit_mb", 50)?
            .set_default("store.dir", "saved_excels")?
            .set_default("supplier.dir", "supplier_uploads")?
            .set_default("supplier.header_row", 6)?
            .set_default("supplier.reference_columns", vec!["DOCKET_NUMBER", "REFERENCE_NUMBER"])
    }

    /// 默认值 < 配置文件 (`RECON_CONFIG`，缺省 `recon.toml`) < `RECON__*` 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("RECON_CONFIG").unwrap_or_else(|_| "recon".to_string());
        Self::builder()?
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("RECON").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
