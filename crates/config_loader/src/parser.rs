//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, DispatcherConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<DispatcherConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<DispatcherConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 按格式解析
pub fn parse(content: &str, format: ConfigFormat) -> Result<DispatcherConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
project_id = "abc123"
write_key = "secret"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.project_id, "abc123");
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.flush_threshold, 90);
        assert_eq!(config.base_url, contracts::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_parse_json_full() {
        let content = r#"{
            "project_id": "abc123",
            "write_key": "secret",
            "base_url": "http://localhost:9999/",
            "queue_capacity": 16,
            "flush_threshold": 8,
            "request_timeout_ms": 5000
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.flush_threshold, 8);
        assert_eq!(config.request_timeout_ms, Some(5000));
    }

    #[test]
    fn test_parse_toml_missing_write_key() {
        let err = parse_toml("project_id = \"abc\"").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
