use crate::error::{AppError, AppResult, SetupError};
use crate::infrastructure::ExternalCommand;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 工作目录下默认读取的配置文件名
pub const CONFIG_FILE_NAME: &str = "badge_batch.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 名单文件（CSV，无表头）
    pub data_file: String,
    /// SVG 模板文件
    pub template_file: String,
    /// 处理记录文件
    pub ledger_file: String,
    /// 每个批次目录下的名单文件
    pub listing_file: String,
    /// 每个批次目录下的打印拼版文件
    pub sheet_file: String,
    /// 模板变量名，按位置对应记录的字段
    pub template_fields: Vec<String>,
    /// 同时运行的转换进程上限，不设置则不限制
    pub max_concurrent_conversions: Option<usize>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 拼版参数
    pub tiling: TilingConfig,
    /// SVG → PDF 转换程序
    pub converter: ExternalCommand,
    /// 拼版程序
    pub layout: ExternalCommand,
}

/// 拼版参数
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TilingConfig {
    pub tile_columns: usize,
    pub tile_rows: usize,
    pub paper_size: String,
    pub autoscale: bool,
    pub frame: bool,
}

impl TilingConfig {
    /// 每张打印纸上的徽章数量
    pub fn multiple(&self) -> usize {
        self.tile_columns * self.tile_rows
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_columns: 2,
            tile_rows: 4,
            paper_size: "a4paper".to_string(),
            autoscale: false,
            frame: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: "data.csv".to_string(),
            template_file: "template.svg".to_string(),
            ledger_file: "generated_status.txt".to_string(),
            listing_file: "listing.txt".to_string(),
            sheet_file: "to_print.pdf".to_string(),
            template_fields: vec!["nome".to_string(), "empresa".to_string()],
            max_concurrent_conversions: None,
            verbose_logging: false,
            tiling: TilingConfig::default(),
            converter: ExternalCommand::new(
                "inkscape",
                ["--export-type=pdf", "--export-filename={output}", "{input}"],
            ),
            layout: ExternalCommand::new(
                "pdfjam",
                [
                    "--nup",
                    "{columns}x{rows}",
                    "--paper",
                    "{paper}",
                    "--frame",
                    "{frame}",
                    "--noautoscale",
                    "{noautoscale}",
                    "--outfile",
                    "{output}",
                    "{inputs}",
                ],
            ),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件 → 环境变量
    ///
    /// # 参数
    /// - `working_dir`: 工作目录，未指定配置文件时在其中查找 `badge_batch.toml`
    /// - `explicit`: 命令行指定的配置文件，必须存在
    pub async fn load(working_dir: &Path, explicit: Option<&Path>) -> AppResult<Self> {
        let path: Option<PathBuf> = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let candidate = working_dir.join(CONFIG_FILE_NAME);
                let found = fs::metadata(&candidate)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                found.then_some(candidate)
            }
        };

        let config = match path {
            Some(path) => Self::from_toml_file(&path).await?,
            None => Self::default(),
        };

        let config = config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub async fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::read_failed(path, e))?;
        Self::from_toml_str(&content).map_err(|source| {
            AppError::Setup(SetupError::ConfigParseFailed {
                path: path.to_path_buf(),
                source,
            })
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖配置，解析失败的值保留原配置
    pub fn apply_env(self) -> Self {
        let env = |name: &str| std::env::var(name).ok();
        let mut converter = self.converter;
        if let Some(program) = env("BADGE_CONVERTER") {
            converter.program = program;
        }
        let mut layout = self.layout;
        if let Some(program) = env("BADGE_LAYOUT") {
            layout.program = program;
        }

        Self {
            data_file: env("BADGE_DATA_FILE").unwrap_or(self.data_file),
            template_file: env("BADGE_TEMPLATE_FILE").unwrap_or(self.template_file),
            ledger_file: env("BADGE_LEDGER_FILE").unwrap_or(self.ledger_file),
            max_concurrent_conversions: env("BADGE_MAX_CONCURRENT")
                .and_then(|v| v.parse().ok())
                .or(self.max_concurrent_conversions),
            verbose_logging: env("BADGE_VERBOSE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.verbose_logging),
            tiling: TilingConfig {
                tile_columns: env("BADGE_TILE_COLUMNS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(self.tiling.tile_columns),
                tile_rows: env("BADGE_TILE_ROWS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(self.tiling.tile_rows),
                paper_size: env("BADGE_PAPER_SIZE").unwrap_or(self.tiling.paper_size),
                ..self.tiling
            },
            converter,
            layout,
            ..self
        }
    }

    /// 校验配置值
    pub fn validate(&self) -> AppResult<()> {
        if self.tiling.tile_columns == 0 || self.tiling.tile_rows == 0 {
            return Err(AppError::invalid_config(
                "tiling",
                "tile_columns 和 tile_rows 必须大于 0",
            ));
        }
        if self.max_concurrent_conversions == Some(0) {
            return Err(AppError::invalid_config(
                "max_concurrent_conversions",
                "并发上限必须大于 0",
            ));
        }
        if self.template_fields.is_empty() {
            return Err(AppError::invalid_config(
                "template_fields",
                "至少需要一个模板变量",
            ));
        }
        if self.converter.program.is_empty() || self.layout.program.is_empty() {
            return Err(AppError::invalid_config("converter/layout", "程序名不能为空"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiling_is_two_by_four() {
        let config = Config::default();
        assert_eq!(config.tiling.multiple(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            max_concurrent_conversions = 4

            [tiling]
            tile_columns = 3

            [converter]
            program = "rsvg-convert"
            args = ["-f", "pdf", "-o", "{output}", "{input}"]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrent_conversions, Some(4));
        assert_eq!(config.tiling.tile_columns, 3);
        assert_eq!(config.tiling.tile_rows, 4);
        assert_eq!(config.tiling.multiple(), 12);
        assert_eq!(config.converter.program, "rsvg-convert");
        assert_eq!(config.layout.program, "pdfjam");
        assert_eq!(config.data_file, "data.csv");
    }

    #[test]
    fn zero_tile_dimension_is_rejected() {
        let mut config = Config::default();
        config.tiling.tile_rows = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_bound_is_rejected() {
        let config = Config {
            max_concurrent_conversions: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(dir.path(), Some(&missing)).await.unwrap_err();
        assert!(matches!(err, AppError::Setup(SetupError::ReadFailed { .. })));
    }

    #[tokio::test]
    async fn config_file_in_working_dir_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "data_file = \"people.csv\"\n",
        )
        .unwrap();
        let config = Config::load(dir.path(), None).await.unwrap();
        assert_eq!(config.data_file, "people.csv");
    }

    #[tokio::test]
    async fn broken_toml_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "tiling = [").unwrap();
        let err = Config::load(dir.path(), Some(&path)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Setup(SetupError::ConfigParseFailed { .. })
        ));
    }
}
