//! 分区桶：可去重、可排序的字符串聚合器
//!
//! 逐条插入时去重排序太慢，这里采用周期性 prune 的摊销策略：
//! `add` 只负责追加与计数，距上次 prune 新增超过阈值时批量整理一次。
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Instant;

use tracing::info;

use crate::options::ScanOptions;
use crate::scanner::StringSink;

/// 分区字典：分区键 → 值序列。
///
/// BTreeMap 使 flush 天然按分区键字典序输出；区内顺序在 prune 前为
/// 插入序，prune 后由 order 策略决定。桶拥有其中全部字符串，外部不持有别名。
#[derive(Debug)]
pub struct Bucket {
    dedupe: bool,
    order: bool,
    key_len: usize,
    prune_interval: usize,
    parts: BTreeMap<String, Vec<String>>,
    size: usize,
    last_pruning: usize,
}

impl Bucket {
    pub fn new(opts: &ScanOptions) -> Self {
        Self {
            dedupe: opts.dedupe,
            order: opts.order,
            key_len: opts.key_len,
            prune_interval: opts.prune_interval,
            parts: BTreeMap::new(),
            size: 0,
            last_pruning: 0,
        }
    }

    pub fn dedupe(&self) -> bool {
        self.dedupe
    }

    pub fn order(&self) -> bool {
        self.order
    }

    /// 当前存储元素总数（最近一次变更后的精确值，而非估计）
    pub fn size(&self) -> usize {
        self.size
    }

    /// 给字符串定键：取其前 key_len 个字母（统一小写，跳过非字母），
    /// 一个字母都没有时回退 "_"
    fn part_key(&self, s: &str) -> String {
        let mut pk = String::with_capacity(self.key_len);
        for c in s.chars() {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() {
                pk.push(c);
                if pk.len() == self.key_len {
                    break;
                }
            }
        }
        if pk.is_empty() {
            pk.push('_');
        }
        pk
    }

    // dedupe 可能使 size 降到水位之下，饱和减法避免回绕
    fn needs_pruning(&self) -> bool {
        self.size.saturating_sub(self.last_pruning) > self.prune_interval
    }

    /// 添加一个值：定键、无条件追加（允许重复累积）、计数，
    /// 距上次 prune 新增超过阈值时在返回前触发一次 prune。
    pub fn add(&mut self, val: String) {
        let pk = self.part_key(&val);
        self.parts.entry(pk).or_default().push(val);
        self.size += 1;

        if self.needs_pruning() {
            self.prune();
        }
    }

    /// 批量整理：各分区去重（排序 + dedup）与排序，重算总数。
    ///
    /// 水位记录的是触发本次 prune 的计数值。幂等：对已整理且无新增的
    /// 桶再次调用不改变任何分区内容。
    pub fn prune(&mut self) {
        let st = Instant::now();
        let triggered_at = self.size;
        let mut new_size = 0usize;

        for vals in self.parts.values_mut() {
            if self.dedupe {
                vals.sort_unstable();
                vals.dedup();
            } else if self.order {
                vals.sort_unstable();
            }
            new_size += vals.len();
        }

        info!(
            was = triggered_at,
            now = new_size,
            elapsed_ms = st.elapsed().as_millis() as u64,
            "pruned bucket"
        );
        self.last_pruning = triggered_at;
        self.size = new_size;
    }

    /// 按分区键序惰性拼接各分区序列（消费桶）
    pub fn drain(self) -> impl Iterator<Item = String> {
        self.parts.into_iter().flat_map(|(_, vals)| vals)
    }

    /// 把全部内容逐行写出，恰好一次；桶随之被消费（终态，之后无法再 add）。
    /// 不隐式 prune：需要去重/排序输出的调用方必须先行 prune。
    pub fn flush(self, out: &mut dyn Write) -> io::Result<usize> {
        let mut written = 0usize;
        for s in self.drain() {
            writeln!(out, "{s}")?;
            written += 1;
        }
        out.flush()?;
        Ok(written)
    }
}

impl StringSink for Bucket {
    fn accept(&mut self, value: String) {
        self.add(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_with(dedupe: bool, order: bool) -> Bucket {
        let opts = ScanOptions {
            dedupe,
            order,
            ..ScanOptions::default()
        };
        Bucket::new(&opts)
    }

    #[test]
    fn part_key_takes_leading_letters() {
        let b = bucket_with(true, true);
        assert_eq!(b.part_key("hello"), "h");
        assert_eq!(b.part_key("Zulu"), "z");
    }

    #[test]
    fn part_key_skips_non_letters() {
        let opts = ScanOptions {
            key_len: 2,
            ..ScanOptions::default()
        };
        let b = Bucket::new(&opts);
        assert_eq!(b.part_key("7x.9y!"), "xy");
        assert_eq!(b.part_key("--Ab"), "ab");
    }

    #[test]
    fn part_key_falls_back_without_letters() {
        let b = bucket_with(true, true);
        assert_eq!(b.part_key("1234!"), "_");
        assert_eq!(b.part_key(""), "_");
    }

    #[test]
    fn size_matches_partition_sum() {
        let mut b = bucket_with(true, true);
        for v in ["alpha", "alpha", "beta", "42", "alpha"] {
            b.add(v.to_string());
        }
        assert_eq!(b.size(), 5);

        b.prune();
        let expect: usize = b.parts.values().map(Vec::len).sum();
        assert_eq!(b.size(), expect);
        assert_eq!(b.size(), 3); // alpha, beta, 42
    }

    #[test]
    fn prune_is_idempotent() {
        let mut b = bucket_with(true, true);
        for v in ["cc", "ca", "cb", "ca", "x1"] {
            b.add(v.to_string());
        }
        b.prune();
        let snapshot = b.parts.clone();
        let size = b.size();

        b.prune();
        assert_eq!(b.parts, snapshot);
        assert_eq!(b.size(), size);
    }

    #[test]
    fn prune_orders_partitions() {
        let mut b = bucket_with(false, true);
        for v in ["bananas", "bar", "baz", "apple", "azure"] {
            b.add(v.to_string());
        }
        b.prune();
        for vals in b.parts.values() {
            assert!(vals.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn auto_prune_triggers_past_interval() {
        let opts = ScanOptions {
            prune_interval: 5,
            ..ScanOptions::default()
        };
        let mut b = Bucket::new(&opts);
        // 第 6 次 add 使新增超过阈值，自动 prune 把重复收缩为 1
        for _ in 0..6 {
            b.add("dup".to_string());
        }
        assert_eq!(b.size(), 1);
        b.add("dup".to_string());
        assert_eq!(b.size(), 2);
    }

    #[test]
    fn flush_in_partition_key_order() {
        let mut b = bucket_with(true, true);
        for v in ["zeta", "beta", "42!"] {
            b.add(v.to_string());
        }
        b.prune();

        let mut out: Vec<u8> = Vec::new();
        let written = b.flush(&mut out).unwrap();
        assert_eq!(written, 3);
        let lines: Vec<&str> = std::str::from_utf8(&out).unwrap().lines().collect();
        // "_" (0x5F) 排在所有字母分区之前
        assert_eq!(lines, vec!["42!", "beta", "zeta"]);
    }

    #[test]
    fn unpruned_partition_keeps_insertion_order() {
        let mut b = bucket_with(false, false);
        b.add("bb".to_string());
        b.add("ba".to_string());
        b.prune(); // dedupe/order 均关闭时 prune 只重算计数
        let collected: Vec<String> = b.drain().collect();
        assert_eq!(collected, vec!["bb".to_string(), "ba".to_string()]);
    }
}
