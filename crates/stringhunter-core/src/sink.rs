//! 输出落地：stdout、文件或两者
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// 目标文件的打开方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// 逐行文本输出的汇点。
///
/// 没有目标文件时固定回显 stdout；给了目标文件则按 mode 打开，
/// echo 决定写文件的同时是否仍回显。
pub struct OutputSink {
    file: Option<BufWriter<File>>,
    echo: bool,
}

impl OutputSink {
    pub fn open(path: Option<&Path>, mode: WriteMode, echo: bool) -> io::Result<Self> {
        let file = match path {
            Some(p) => {
                let f = match mode {
                    WriteMode::Truncate => File::create(p)?,
                    WriteMode::Append => OpenOptions::new().create(true).append(true).open(p)?,
                };
                Some(BufWriter::new(f))
            }
            None => None,
        };
        let echo = echo || path.is_none();
        Ok(Self { file, echo })
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(f) = self.file.as_mut() {
            f.write_all(buf)?;
        }
        if self.echo {
            io::stdout().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(f) = self.file.as_mut() {
            f.flush()?;
        }
        if self.echo {
            io::stdout().flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut s = OutputSink::open(Some(&path), WriteMode::Truncate, false).unwrap();
        s.write_all(b"one\n").unwrap();
        s.flush().unwrap();
        drop(s);

        let mut s = OutputSink::open(Some(&path), WriteMode::Truncate, false).unwrap();
        s.write_all(b"two\n").unwrap();
        s.flush().unwrap();
        drop(s);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two\n");
    }

    #[test]
    fn append_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut s = OutputSink::open(Some(&path), WriteMode::Truncate, false).unwrap();
        s.write_all(b"one\n").unwrap();
        s.flush().unwrap();
        drop(s);

        let mut s = OutputSink::open(Some(&path), WriteMode::Append, false).unwrap();
        s.write_all(b"two\n").unwrap();
        s.flush().unwrap();
        drop(s);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
