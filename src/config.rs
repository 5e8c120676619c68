use crate::error::{Error, Result};
use crate::parameters::RequestParameters;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 明示指定がない場合に探す設定ファイル
pub const CONFIG_PATHS: [&str; 2] = ["anomaly-client.toml", "config/anomaly-client.toml"];

/// 環境変数のプレフィックス (例: ANOMALY_SERVICE__URL)
pub const ENV_PREFIX: &str = "ANOMALY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
    pub parameters: RequestParameters,
    /// 実際に読み込んだ設定ファイル
    #[serde(skip)]
    pub source_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// スコアリングエンドポイントのURL
    pub url: Option<String>,
    /// Bearer認証キー（ログ・シリアライズ対象外）
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,
    /// 未設定ならトランスポートの既定（タイムアウトなし）
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// 指定時のみファイルにも出力
    pub directory: Option<PathBuf>,
    /// daily / hourly / never
    pub rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            rotation: "daily".to_string(),
        }
    }
}

/// コマンドライン（および ANOMALY_DETECTION_* 環境変数）からの上書き
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub file: Option<PathBuf>,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// 検証済みの接続先
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: url::Url,
    pub api_key: SecretString,
    pub timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            api_key: Some(SecretString::new(api_key.into().into_boxed_str())),
            timeout_secs: None,
        }
    }

    /// URLとキーが揃っていることを確認
    pub fn validate(&self) -> Result<Endpoint> {
        let raw_url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("scoring service URL is not set".to_string()))?;

        let url = url::Url::parse(raw_url)
            .map_err(|e| Error::Config(format!("invalid scoring service URL {raw_url:?}: {e}")))?;

        let api_key = self
            .api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .cloned()
            .ok_or_else(|| Error::Config("scoring service API key is not set".to_string()))?;

        Ok(Endpoint {
            url,
            api_key,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

impl ClientConfig {
    /// デフォルト → 設定ファイル → 環境変数 → コマンドラインの順に読み込む
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&ClientConfig::default())?);

        let source_file = match &overrides.file {
            Some(path) => Some(path.clone()),
            None => CONFIG_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|path| path.exists()),
        };

        if let Some(path) = &source_file {
            settings = settings.add_source(config::File::from(path.as_path()).required(true));
        }

        settings = settings
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("service.url", overrides.url.clone())?
            .set_override_option("service.api_key", overrides.api_key.clone())?
            .set_override_option(
                "service.timeout_secs",
                overrides.timeout_secs.map(|t| t as i64),
            )?;

        let mut config: ClientConfig = settings.build()?.try_deserialize()?;
        config.source_file = source_file;
        Ok(config)
    }

    /// サンプル設定ファイルを生成
    pub fn generate_sample_config(path: &Path) -> Result<()> {
        let parameters = toml::to_string_pretty(&RequestParameters::default())
            .map_err(|e| Error::Config(e.to_string()))?;

        let sample_content = format!(
            r#"# anomaly-client configuration
#
# Save as anomaly-client.toml (or pass --config PATH).
# Every key can be overridden with an environment variable,
# e.g. ANOMALY_SERVICE__URL or ANOMALY_PARAMETERS__ALPHA.
# ANOMALY_DETECTION_URL / ANOMALY_DETECTION_API_KEY are honoured too.

[service]
url = "https://example.invalid/workspaces/<id>/services/<id>/execute?api-version=2.0"
api_key = "<your api key>"
# timeout_secs = 120

[logging]
level = "info"
# directory = "logs"
rotation = "daily"

# Defaults sent to the scoring service; command-line flags win.
# longterm = true / log_scaling = true are left unset unless given.
[parameters]
{parameters}"#
        );

        std::fs::write(path, sample_content).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Direction;
    use std::io::Write;

    #[test]
    fn test_validate_requires_url_and_key() {
        let missing_url = ServiceConfig {
            url: None,
            ..ServiceConfig::new("https://example.invalid/score", "key")
        };
        assert!(matches!(missing_url.validate(), Err(Error::Config(_))));

        let blank_key = ServiceConfig::new("https://example.invalid/score", "   ");
        assert!(matches!(blank_key.validate(), Err(Error::Config(_))));

        let bad_url = ServiceConfig::new("not a url", "key");
        assert!(matches!(bad_url.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_ok() {
        let mut service = ServiceConfig::new("https://example.invalid/score", "secret");
        service.timeout_secs = Some(30);
        let endpoint = service.validate().unwrap();
        assert_eq!(endpoint.url.as_str(), "https://example.invalid/score");
        assert_eq!(endpoint.api_key.expose_secret(), "secret");
        assert_eq!(endpoint.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let service = ServiceConfig::new("https://example.invalid/score", "super-secret");
        assert!(!format!("{service:?}").contains("super-secret"));
    }

    #[test]
    fn test_load_from_file_with_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[service]
url = "https://from-file.invalid/score"
api_key = "file-key"

[parameters]
direction = "pos"
alpha = 0.01
"#
        )
        .unwrap();

        let overrides = ConfigOverrides {
            file: Some(file.path().to_path_buf()),
            url: Some("https://from-cli.invalid/score".to_string()),
            ..Default::default()
        };
        let config = ClientConfig::load(&overrides).unwrap();

        assert_eq!(
            config.service.url.as_deref(),
            Some("https://from-cli.invalid/score")
        );
        assert_eq!(config.parameters.direction, Direction::Pos);
        assert_eq!(config.parameters.alpha, 0.01);
        assert_eq!(config.parameters.title, "Anomalies");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.source_file.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let overrides = ConfigOverrides {
            file: Some(PathBuf::from("no/such/anomaly-client.toml")),
            ..Default::default()
        };
        assert!(matches!(
            ClientConfig::load(&overrides),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_generate_sample_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomaly-client.toml");
        ClientConfig::generate_sample_config(&path).unwrap();

        let overrides = ConfigOverrides {
            file: Some(path),
            ..Default::default()
        };
        let config = ClientConfig::load(&overrides).unwrap();
        assert_eq!(config.parameters, RequestParameters::default());
        assert_eq!(config.logging.rotation, "daily");
    }
}
