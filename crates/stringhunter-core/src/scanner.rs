//! 字节流扫描器：分块读取，跨块边界重建可打印串
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::errors::ScanError;
use crate::options::ScanOptions;
use crate::terms::TermFilter;

/// 接收通过过滤的字符串（扫描与聚合之间的接缝）
pub trait StringSink {
    fn accept(&mut self, value: String);
}

/// 并行路径与测试用：先收集，之后再统一入桶
impl StringSink for Vec<String> {
    fn accept(&mut self, value: String) {
        self.push(value);
    }
}

/// 字符集成员：ASCII 字母 + 数字 + 标点，恰好是全部可见 ASCII（0x21..=0x7E）。
/// 空白、控制字节以及 >= 0x80 的字节一律视为串边界。
#[inline]
fn in_charset(b: u8) -> bool {
    b.is_ascii_graphic()
}

/// 跨块携带状态：恰好是尚未完结的当前串（可能为空）。
///
/// 作为值在 `scan_chunk` 调用之间显式传递，而非对象内部字段，
/// 这样边界重建逻辑可以脱离文件 I/O 单独测试。
#[derive(Debug, Default, Clone)]
pub struct Carry {
    frag: String,
}

impl Carry {
    pub fn is_empty(&self) -> bool {
        self.frag.is_empty()
    }
}

/// 扫描器：持有长度与词条过滤参数，自身没有跨文件状态
pub struct Scanner {
    chunk_size: usize,
    min_len: usize,
    max_len: Option<usize>,
    filter: Option<TermFilter>,
}

impl Scanner {
    pub fn new(opts: &ScanOptions, filter: Option<TermFilter>) -> Self {
        Self {
            chunk_size: opts.chunk_size,
            min_len: opts.min_len,
            max_len: opts.max_len,
            filter,
        }
    }

    /// 处理一个分块，返回（本块接受数，新的携带状态）。
    ///
    /// 字符集内的字节延长当前串；边界字节完结当前串并送去过滤；
    /// 分块恰好在串中间结束时不完结，而是把部分串携带给下一块 ——
    /// 分 N 块扫描得到的串边界必须与整读一次完全相同。
    pub fn scan_chunk(
        &self,
        chunk: &[u8],
        carry: Carry,
        sink: &mut dyn StringSink,
    ) -> (usize, Carry) {
        let mut frag = carry.frag;
        let mut cnt = 0usize;

        for &b in chunk {
            if in_charset(b) {
                frag.push(b as char);
            } else if !frag.is_empty() {
                cnt += self.finalize(&mut frag, sink);
            }
        }
        (cnt, Carry { frag })
    }

    /// 完结仍在携带中的部分串（文件末尾等价于跟随一个边界字节）
    pub fn finish(&self, carry: Carry, sink: &mut dyn StringSink) -> usize {
        let mut frag = carry.frag;
        if frag.is_empty() {
            return 0;
        }
        self.finalize(&mut frag, sink)
    }

    /// 完结一个串：trim ASCII 空白；长度必须严格大于 min_len（恰好等于即拒绝），
    /// 配置了 max_len 则不得超过；再过词条；通过的交给 sink 并计数。
    fn finalize(&self, frag: &mut String, sink: &mut dyn StringSink) -> usize {
        let trimmed = frag.trim_matches(|c: char| c.is_ascii_whitespace());
        let accepted = trimmed.len() > self.min_len
            && self.max_len.map_or(true, |m| trimmed.len() <= m)
            && self.filter.as_ref().map_or(true, |f| f.matches(trimmed));

        let n = if accepted {
            sink.accept(trimmed.to_string());
            1
        } else {
            0
        };
        frag.clear();
        n
    }

    /// 按 chunk_size 分块读完整个文件，携带状态贯穿各块，末尾对未完结的
    /// 串做最终完结。空文件零分块返回 0；读取失败原样上抛，不吞错。
    /// 每 1000 块经 tracing 发一次进度（块号单调递增 + 总块数）。
    pub fn scan_file(&self, path: &Path, sink: &mut dyn StringSink) -> Result<usize, ScanError> {
        let file = File::open(path).map_err(|e| ScanError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let total = file
            .metadata()
            .map_err(|e| ScanError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?
            .len()
            .div_ceil(self.chunk_size as u64);
        let mut reader = BufReader::new(file);

        let mut buf = vec![0u8; self.chunk_size];
        let mut carry = Carry::default();
        let mut cnt = 0usize;
        let mut cur_chunk = 0u64;

        loop {
            let n = reader.read(&mut buf).map_err(|e| ScanError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            if n == 0 {
                break;
            }
            cur_chunk += 1;
            if cur_chunk % 1000 == 0 {
                debug!(file = %path.display(), chunk = cur_chunk, total, "scanning");
            }
            let (accepted, next) = self.scan_chunk(&buf[..n], carry, sink);
            cnt += accepted;
            carry = next;
        }
        cnt += self.finish(carry, sink);

        debug!(file = %path.display(), found = cnt, "file done");
        Ok(cnt)
    }
}
