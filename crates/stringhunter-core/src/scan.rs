//! 扫描主流程与并行调度
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::bucket::Bucket;
use crate::errors::ScanError;
use crate::options::{ScanOptions, ScanStats};
use crate::scanner::Scanner;
use crate::terms::{load_terms, TermFilter, COMMON_TERMS};

/// 扫描目录树并把最终结果逐行写入 `out`
///
/// 顺序保证：
/// - 文件级：先收集再按路径排序，跨运行输出可复现
/// - 结果级：flush 前恰好做一次全桶 prune（与阈值无关），输出按分区键序、区内序
///
/// 任何文件读取失败都致命：整次扫描终止，桶内已有结果不写出。
pub fn scan_and_write(
    root: &Path,
    out: &mut dyn Write,
    opts: &ScanOptions,
) -> Result<ScanStats, ScanError> {
    if !root.exists() {
        return Err(ScanError::PathNotFound {
            path: root.to_path_buf(),
        });
    }

    // 词条：文件词条 + 可选的内置常见词条集；最终为空则不过滤
    let mut terms = match &opts.terms_path {
        Some(p) => load_terms(p)?,
        None => Vec::new(),
    };
    if opts.common {
        terms.extend(COMMON_TERMS.iter().map(|s| s.to_string()));
    }
    let filter = TermFilter::build(&terms, opts.ignore_case)?;

    let scanner = Arc::new(Scanner::new(opts, filter));
    let mut bucket = Bucket::new(opts);
    let mut stats = ScanStats::default();

    info!(root = %root.display(), "scanning tree");

    // 收集文件并排序
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| root.to_path_buf());
            match e.into_io_error() {
                Some(io) => ScanError::FileRead { path, source: io },
                None => ScanError::PathNotFound { path },
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();

    // 过滤：扩展名忽略表 + 可选的 max_chunks 大文件截断；跳过必记数、必留痕
    let mut kept: Vec<PathBuf> = Vec::new();
    for path in files {
        if ignored_ext(&path, &opts.ignore_exts) {
            debug!(file = %path.display(), "ignored extension, skipping");
            stats.files_skipped += 1;
            continue;
        }
        if let Some(max) = opts.max_chunks {
            let len = std::fs::metadata(&path)
                .map_err(|e| ScanError::FileRead {
                    path: path.clone(),
                    source: e,
                })?
                .len();
            if len.div_ceil(opts.chunk_size as u64) > max {
                warn!(file = %path.display(), bytes = len, "file exceeds max_chunks, skipping");
                stats.files_skipped += 1;
                continue;
            }
        }
        kept.push(path);
    }

    // threads=1 串行（参考设计）；0 自动；>1 并行扫描、单线程入桶
    let threads = if opts.threads == 0 {
        num_cpus::get()
    } else {
        opts.threads
    };
    if threads > 1 && kept.len() > 1 {
        scan_parallel(&kept, &scanner, &mut bucket, &mut stats, threads)?;
    } else {
        for path in &kept {
            let found = scanner.scan_file(path, &mut bucket)?;
            stats.files_scanned += 1;
            stats.strings_found += found;
        }
    }

    // 终末：恰好一次全桶 prune，然后一次性 flush（桶被消费，会话结束）
    bucket.prune();
    let written = bucket
        .flush(out)
        .map_err(|e| ScanError::OutputWrite { source: e })?;
    stats.outputs_written = written;

    info!(
        files = stats.files_scanned,
        skipped = stats.files_skipped,
        found = stats.strings_found,
        written = stats.outputs_written,
        "scan finished"
    );
    Ok(stats)
}

/// 文件扩展名是否在忽略表内（大小写不敏感）
fn ignored_ext(path: &Path, ignore: &[String]) -> bool {
    if ignore.is_empty() {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ignore.iter().any(|i| i.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// 并行调度：
/// - Rayon 线程池并行扫描各文件，单文件结果收集为 Vec 后经有界通道送回
/// - 调用线程按文件索引重排（BTreeMap 缓冲）后逐条入桶 ——
///   桶的全部变更仍发生在单线程上，prune 触发点与串行路径完全一致
/// - 任一文件失败即为致命：按序遇到第一个错误时终止并上抛
fn scan_parallel(
    files: &[PathBuf],
    scanner: &Arc<Scanner>,
    bucket: &mut Bucket,
    stats: &mut ScanStats,
    threads: usize,
) -> Result<(), ScanError> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    type Msg = (usize /*idx*/, Result<Vec<String>, ScanError>);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let indexed: Vec<(usize, PathBuf)> = files.iter().cloned().enumerate().collect();
    let scanner = Arc::clone(scanner);

    let scan_thread = std::thread::spawn(move || {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("build rayon pool");
        pool.install(|| {
            indexed.par_iter().for_each(|(idx, path)| {
                let mut local: Vec<String> = Vec::new();
                let res = scanner.scan_file(path, &mut local).map(|_| local);
                let _ = tx.send((*idx, res));
            });
        });
        // worker 全部结束后 Sender 随之丢弃，接收端收到关闭信号
    });

    // 按 idx 顺序冲刷，保证入桶顺序与串行一致
    let mut next_idx = 0usize;
    let mut buffer: BTreeMap<usize, Result<Vec<String>, ScanError>> = BTreeMap::new();
    let mut failure: Option<ScanError> = None;

    'recv: while let Ok((idx, res)) = rx.recv() {
        buffer.insert(idx, res);
        while let Some(res) = buffer.remove(&next_idx) {
            next_idx += 1;
            match res {
                Ok(values) => {
                    stats.files_scanned += 1;
                    stats.strings_found += values.len();
                    for v in values {
                        bucket.add(v);
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break 'recv;
                }
            }
        }
    }

    // 提前退出时丢弃接收端，让剩余 worker 的 send 直接失败返回
    drop(rx);
    let _ = scan_thread.join();

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
