//! 词条过滤与词条文件加载
use std::path::Path;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};

use crate::errors::ScanError;

/// 内置“常见信息”词条集：地址、姓名、电话、邮箱、域名类标记。
///
/// 不属于核心契约：仅作为 `common` 开关的默认词表，与词条文件合并使用，
/// 也可以被词条文件完全替代。
pub const COMMON_TERMS: &[&str] = &[
    "@",
    "http://",
    "https://",
    "www.",
    ".com",
    ".net",
    ".org",
    "mailto:",
    "tel:",
    "phone",
    "mobile",
    "email",
    "address",
    "street",
    "avenue",
    "name",
    "user",
    "passw",
];

/// 读取词条文件：每行一条，trim 后丢弃空行，顺序保留。
/// 路径给了但读不了是启动期致命错误。
pub fn load_terms(path: &Path) -> Result<Vec<String>, ScanError> {
    let txt = std::fs::read_to_string(path).map_err(|e| ScanError::TermsFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(txt
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// 多词条子串匹配器：一次构建，逐候选查询
pub struct TermFilter {
    ac: AhoCorasick,
}

impl TermFilter {
    /// 词表为空返回 None —— 未配置词条等于“全部接受”，不构建过滤器。
    /// ignore_case 时按 ASCII 大小写不敏感匹配。
    pub fn build(terms: &[String], ignore_case: bool) -> Result<Option<Self>, ScanError> {
        if terms.is_empty() {
            return Ok(None);
        }
        let ac = AhoCorasickBuilder::new()
            .ascii_case_insensitive(ignore_case)
            .build(terms)
            .map_err(|e| ScanError::TermSet { source: e })?;
        Ok(Some(Self { ac }))
    }

    /// 候选是否包含任一词条
    pub fn matches(&self, candidate: &str) -> bool {
        self.ac.is_match(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn terms(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_term_list_builds_nothing() {
        assert!(TermFilter::build(&[], true).unwrap().is_none());
    }

    #[test]
    fn case_insensitive_containment() {
        let f = TermFilter::build(&terms(&["foo", "bar"]), true)
            .unwrap()
            .unwrap();
        assert!(f.matches("FOOBAZ"));
        assert!(!f.matches("bazqux"));
    }

    #[test]
    fn case_sensitive_by_default() {
        let f = TermFilter::build(&terms(&["foo"]), false).unwrap().unwrap();
        assert!(f.matches("xfoox"));
        assert!(!f.matches("FOO"));
    }

    #[test]
    fn loads_trimmed_non_empty_lines() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "foo\n\n  bar  \n\t\nbaz").unwrap();
        let loaded = load_terms(tmp.path()).unwrap();
        assert_eq!(loaded, terms(&["foo", "bar", "baz"]));
    }

    #[test]
    fn missing_terms_file_is_fatal() {
        let err = load_terms(Path::new("/no/such/terms.txt")).unwrap_err();
        assert!(matches!(err, ScanError::TermsFileRead { .. }));
    }
}
