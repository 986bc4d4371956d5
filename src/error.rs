use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
///
/// 按失败来源分为四类，除外部进程的退出码外全部是致命错误
#[derive(Debug, Error)]
pub enum AppError {
    /// 启动阶段错误（工作目录、输入文件、模板、配置）
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// 处理记录损坏
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// 批次规划冲突
    #[error(transparent)]
    Planning(#[from] PlanningError),
    /// 外部进程错误
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// 启动阶段错误
#[derive(Debug, Error)]
pub enum SetupError {
    /// 工作目录不存在
    #[error("工作目录不存在: {}", .path.display())]
    WorkingDirNotFound { path: PathBuf },
    /// 读取文件失败
    #[error("读取文件失败 ({})", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({})", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 输入数据格式错误
    #[error("输入数据格式错误 ({}:{line}): {reason}", .path.display())]
    MalformedInput {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({})", .path.display())]
    ConfigParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值无效
    #[error("配置值无效 ({field}): {reason}")]
    InvalidConfig { field: String, reason: String },
}

/// 处理记录解析错误
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 批次编号不是整数
    #[error("第 {line} 行: 批次编号无效 '{value}'")]
    InvalidBatchNumber { line: usize, value: String },
    /// 批次编号没有严格递增
    #[error("第 {line} 行: 批次 {number} 不大于前一个批次 {previous}")]
    NonIncreasingBatch {
        line: usize,
        number: u32,
        previous: u32,
    },
    /// 记录行出现在任何批次之外
    #[error("第 {line} 行: 记录不属于任何批次")]
    RecordOutsideBatch { line: usize },
    /// 批次下没有记录
    #[error("第 {line} 行: 批次 {number} 没有任何记录")]
    EmptyBatch { line: usize, number: u32 },
    /// 记录行格式错误
    #[error("第 {line} 行: 记录格式错误: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

/// 批次规划冲突
#[derive(Debug, Error)]
pub enum PlanningError {
    /// 批次编号已到上限
    #[error("批次编号 {last} 已是最大值，无法创建新批次")]
    BatchNumberExhausted { last: u32 },
    /// 批次目录已经存在
    #[error("批次目录已存在: {}（上次运行可能中途失败，或目录被手动创建）", .path.display())]
    BatchDirExists { path: PathBuf },
    /// 创建批次目录失败
    #[error("创建批次目录失败 ({})", .path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 外部进程错误
#[derive(Debug, Error)]
pub enum ProcessError {
    /// 启动外部程序失败（通常是程序不存在）
    #[error("无法启动外部程序 '{program}'")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// 并发许可已关闭
    #[error("并发许可已关闭")]
    SemaphoreClosed,
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Setup(SetupError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Setup(SetupError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建外部程序启动错误
    pub fn launch_failed(program: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Process(ProcessError::LaunchFailed {
            program: program.into(),
            source,
        })
    }

    /// 创建配置值错误
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Setup(SetupError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
