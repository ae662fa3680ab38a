//! 配置校验模块
//!
//! 校验规则：
//! - project_id / write_key / base_url 非空 (derive 规则)
//! - queue_capacity >= 1, flush_threshold >= 1 (derive 规则)
//! - base_url 为 http(s) 地址
//! - request_timeout_ms 若设置则必须 > 0

use contracts::{ContractError, DispatcherConfig};

/// 校验 DispatcherConfig
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &DispatcherConfig) -> Result<(), ContractError> {
    config.validate_fields()?;
    validate_base_url(config)?;
    validate_timeout(config)?;
    Ok(())
}

/// 校验 base_url 协议
fn validate_base_url(config: &DispatcherConfig) -> Result<(), ContractError> {
    let url = config.base_url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "base_url",
            format!("base_url must start with http:// or https://, got '{url}'"),
        ));
    }
    Ok(())
}

/// 校验请求超时
fn validate_timeout(config: &DispatcherConfig) -> Result<(), ContractError> {
    if config.request_timeout_ms == Some(0) {
        return Err(ContractError::config_validation(
            "request_timeout_ms",
            "request_timeout_ms must be > 0 (omit it to disable the timeout)",
        ));
    }
    Ok(())
}
