//! 版本历史配置

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::models::{HistoryError, HistoryResult};

/// checkout 摘要模板中的时间戳占位符
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// 版本历史配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// redo 栈最大深度，超出后丢弃最早的记录
    pub redo_limit: usize,

    /// 根节点摘要
    pub initial_summary: String,

    /// checkout 生成新节点时的摘要模板，必须包含 `{timestamp}`
    pub checkout_summary: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            redo_limit: 100,
            initial_summary: "initial version".to_string(),
            checkout_summary: format!("Checkout to version from {TIMESTAMP_PLACEHOLDER}"),
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> HistoryResult<()> {
        if self.redo_limit == 0 {
            return Err(HistoryError::InvalidConfig(
                "redoLimit must be greater than 0".to_string(),
            ));
        }

        if !self.checkout_summary.contains(TIMESTAMP_PLACEHOLDER) {
            return Err(HistoryError::InvalidConfig(format!(
                "checkoutSummary must contain {}",
                TIMESTAMP_PLACEHOLDER
            )));
        }

        Ok(())
    }

    /// 从 JSON 解析并校验，缺省字段使用默认值
    pub fn from_json_str(content: &str) -> HistoryResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| HistoryError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn render_checkout_summary(&self, target_timestamp: &DateTime<Utc>) -> String {
        let timestamp = target_timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.checkout_summary.replace(TIMESTAMP_PLACEHOLDER, &timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_config_is_valid() {
        let config = HistoryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.redo_limit, 100);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HistoryConfig::from_json_str(r#"{ "redoLimit": 5 }"#).unwrap();

        assert_eq!(config.redo_limit, 5);
        assert_eq!(config.initial_summary, "initial version");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = HistoryConfig::from_json_str(r#"{ "redoLimit": 0 }"#);
        assert!(matches!(result, Err(HistoryError::InvalidConfig(_))));

        let result = HistoryConfig::from_json_str(r#"{ "checkoutSummary": "revert" }"#);
        assert!(matches!(result, Err(HistoryError::InvalidConfig(_))));

        let result = HistoryConfig::from_json_str("not json");
        assert!(matches!(result, Err(HistoryError::InvalidConfig(_))));
    }

    #[test]
    fn test_render_checkout_summary() {
        let config = HistoryConfig::default();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        assert_eq!(
            config.render_checkout_summary(&ts),
            "Checkout to version from 2024-03-01T12:30:00Z"
        );
    }
}
