//! 服务配置
//!
//! 加载顺序：配置文件（可选）→ 环境变量覆盖 → 校验。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "PRODUCT_SERVICE_CONFIG";

/// 产品服务配置结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP 服务配置
    pub http: HttpConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 各端点的限流配置
    pub rate_limits: RateLimitConfig,
    /// 产品目录配置
    pub catalog: CatalogConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 绑定地址
    pub bind_address: String,
    /// HTTP 服务端口
    pub port: u16,
    /// 请求超时时间（秒）
    pub timeout_seconds: u64,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

/// 限流配置，数值为每个窗口内每个客户端允许的请求数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// 窗口长度（秒）
    pub window_seconds: u64,
    pub list_products: u32,
    pub get_product: u32,
    pub create_product: u32,
    pub update_product: u32,
    pub delete_product: u32,
    pub adjust_stock: u32,
}

/// 产品目录配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 启动时是否载入示例产品
    pub seed_sample_data: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_seconds: 60,
            list_products: 100,
            get_product: 200,
            create_product: 10,
            update_product: 20,
            delete_product: 5,
            adjust_stock: 50,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            seed_sample_data: true,
        }
    }
}

impl ServiceConfig {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::FileWrite(e.to_string()))?;
        }

        fs::write(path.as_ref(), content).map_err(|e| ConfigError::FileWrite(e.to_string()))
    }

    /// 用环境变量覆盖配置，`lookup` 便于测试时注入
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.http.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("无效的 PORT: {}", port)))?;
        }
        if let Some(address) = lookup("BIND_ADDRESS") {
            self.http.bind_address = address;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Validation("HTTP端口必须大于0".to_string()));
        }
        if self.http.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }
        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Validation("请求超时时间必须大于0".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let limits = &self.rate_limits;
        if limits.window_seconds == 0 {
            return Err(ConfigError::Validation("限流窗口必须大于0".to_string()));
        }
        let per_endpoint = [
            ("list_products", limits.list_products),
            ("get_product", limits.get_product),
            ("create_product", limits.create_product),
            ("update_product", limits.update_product),
            ("delete_product", limits.delete_product),
            ("adjust_stock", limits.adjust_stock),
        ];
        if let Some((name, _)) = per_endpoint.iter().find(|(_, limit)| *limit == 0) {
            return Err(ConfigError::Validation(format!(
                "限流配置 {} 必须大于0",
                name
            )));
        }

        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.http.bind_address, self.http.port)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("文件写入错误: {0}")]
    FileWrite(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置序列化错误: {0}")]
    Serialize(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 从文件或默认值加载配置，再叠加环境变量并校验
pub fn load_config() -> Result<ServiceConfig, ConfigError> {
    let mut config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => ServiceConfig::load_from_file(path)?,
        Err(_) => {
            let config_paths = ["config.toml", "./config/config.toml"];
            match config_paths.iter().find(|p| Path::new(p).exists()) {
                Some(path) => ServiceConfig::load_from_file(path)?,
                None => ServiceConfig::default(),
            }
        }
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.http.port, 5000);
        assert_eq!(config.rate_limits.create_product, 10);
        assert_eq!(config.rate_limits.delete_product, 5);
        assert!(config.catalog.seed_sample_data);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServiceConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.rate_limits.adjust_stock = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.http.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("PORT", "8081"), ("LOG_LEVEL", "DEBUG")].into();
        let mut config = ServiceConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.http.port, 8081);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.listen_address(), "0.0.0.0:8081");
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = ServiceConfig::default();
        let result = config.apply_env_overrides(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config").join("service.toml");

        let mut config = ServiceConfig::default();
        config.rate_limits.list_products = 3;
        config.save_to_file(&config_path).unwrap();

        let loaded = ServiceConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("partial.toml");
        std::fs::write(&config_path, "[http]\nport = 9000\n").unwrap();

        let loaded = ServiceConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.http.port, 9000);
        assert_eq!(loaded.http.bind_address, "0.0.0.0");
        assert_eq!(loaded.rate_limits, RateLimitConfig::default());
    }
}
