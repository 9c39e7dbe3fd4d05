//! 核心提取库
//!
//! 设计要点：
//! - 采用“字节级”分块扫描：可见 ASCII 字节延长当前串，其余一律视为边界，
//!   跨块未完结的串以显式 carry 值传递，保证分块扫描与整读结果完全一致。
//! - 提取结果进入分区桶（Bucket）：插入只追加，去重/排序由周期性 prune
//!   批量完成，摊销大结果集的维护成本。
//! - 词条过滤为子串包含（aho-corasick 多模式匹配），不做正则。
//! - 输出为逐行文本；终末 flush 前恰好做一次全桶 prune（与阈值无关）。

mod bucket;
mod errors;
mod options;
mod scan;
mod scanner;
mod sink;
mod terms;

// 对外暴露的 API
pub use bucket::Bucket;
pub use errors::ScanError;
pub use options::{ScanOptions, ScanStats};
pub use scan::scan_and_write;
pub use scanner::{Carry, Scanner, StringSink};
pub use sink::{OutputSink, WriteMode};
pub use terms::{load_terms, TermFilter, COMMON_TERMS};
