//! 错误类型（对外暴露）
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 扫描过程中的致命错误
///
/// 本库没有任何重试逻辑：所有 I/O 失败立即上抛并终止整次扫描，
/// 已入桶的部分结果不会自动写出（需要尽力输出的调用方自行捕获后
/// 显式 prune + flush）。
#[derive(Debug, Error)]
pub enum ScanError {
    /// 扫描根路径不存在（在任何扫描开始前抛出）
    #[error("scan root {path} does not exist")]
    PathNotFound { path: PathBuf },

    /// 扫描途中某个文件无法打开或读取
    #[error("failed to read {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 词条文件无法读取（启动期）
    #[error("failed to read terms file {path}")]
    TermsFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 配置文件无法读取
    #[error("failed to read config file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 配置文件解析失败
    #[error("failed to parse config file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 词条匹配器构建失败
    #[error("failed to build term filter")]
    TermSet {
        #[source]
        source: aho_corasick::BuildError,
    },

    /// 输出写入失败
    #[error("failed to write output")]
    OutputWrite {
        #[source]
        source: io::Error,
    },
}
