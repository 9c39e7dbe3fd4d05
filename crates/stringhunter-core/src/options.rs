//! 扫描选项与统计信息（模块）
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ScanError;

/// 扫描选项
///
/// 全部可调参数集中于此，由调用方显式传给 Scanner / Bucket 构造器，
/// 不存在进程级可变默认值。可从 TOML 配置文件整体加载，未出现的字段
/// 取默认值（与命令行参数的覆盖关系由 CLI 决定）。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// 分块大小（字节）；文件按该粒度读取
    pub chunk_size: usize,
    /// 最大分块数；Some(n) 时超过 n 块的文件整体跳过（计入 files_skipped，绝不静默）
    pub max_chunks: Option<u64>,
    /// 最小串长；trim 后长度必须严格大于该值才保留（等于即拒绝）
    pub min_len: usize,
    /// 最大串长；None 表示不限制
    pub max_len: Option<usize>,
    /// 分区键长度：1 → 26+1 个分区，2 → 26*26+1，依此类推
    pub key_len: usize,
    /// 距上次 prune 新增元素超过该值时触发自动 prune
    pub prune_interval: usize,
    /// 忽略的文件扩展名（不含点，大小写不敏感）
    pub ignore_exts: Vec<String>,
    /// 是否去重
    pub dedupe: bool,
    /// 是否按字典序排序
    pub order: bool,
    /// 词条匹配是否忽略大小写
    pub ignore_case: bool,
    /// 是否合并内置“常见信息”词条集（地址/姓名/电话/邮箱/域名）
    pub common: bool,
    /// 词条文件路径（每行一条）；None 且未启用 common 时不过滤
    pub terms_path: Option<PathBuf>,
    /// 线程数：1 走串行（默认，参考设计）；0 表示自动（CPU 核数）；>1 并行扫描
    pub threads: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            max_chunks: None,
            min_len: 3,
            max_len: None,
            key_len: 1,
            prune_interval: 10_000,
            ignore_exts: Vec::new(),
            dedupe: true,
            order: true,
            ignore_case: false,
            common: false,
            terms_path: None,
            threads: 1,
        }
    }
}

impl ScanOptions {
    /// 从 TOML 配置文件加载
    pub fn from_file(path: &Path) -> Result<Self, ScanError> {
        let txt = std::fs::read_to_string(path).map_err(|e| ScanError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&txt).map_err(|e| ScanError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub strings_found: usize,
    pub outputs_written: usize,
}
