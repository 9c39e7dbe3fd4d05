use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stringhunter_core::{scan_and_write, OutputSink, ScanOptions, WriteMode};
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "stringhunter", version, about = "从目录树的混合内容里提取可读字符串（strings + 检索 + 聚合）")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描目录树并输出提取到的字符串
    Scan {
        /// 扫描根路径
        #[arg(long)]
        input: PathBuf,

        /// 输出文件；缺省打印到 stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// 输出文件以追加方式打开（默认覆盖重写）
        #[arg(long)]
        append: bool,

        /// 写文件的同时回显到 stdout
        #[arg(long)]
        echo: bool,

        /// 词条文件（每行一条，按子串包含过滤）
        #[arg(long)]
        terms: Option<PathBuf>,

        /// TOML 配置文件作为参数基线；命令行参数逐项覆盖
        #[arg(long)]
        config: Option<PathBuf>,

        /// 最小串长（严格大于才保留）
        #[arg(long)]
        min_len: Option<usize>,

        /// 最大串长
        #[arg(long)]
        max_len: Option<usize>,

        /// 分块大小（字节）
        #[arg(long)]
        chunk_size: Option<usize>,

        /// 最大分块数；超过的文件跳过
        #[arg(long)]
        max_chunks: Option<u64>,

        /// 词条匹配忽略大小写
        #[arg(long)]
        ignore_case: bool,

        /// 合并内置常见信息词条集（地址/姓名/电话/邮箱/域名）
        #[arg(long)]
        common: bool,

        /// 关闭去重
        #[arg(long)]
        no_dedupe: bool,

        /// 关闭排序
        #[arg(long)]
        no_order: bool,

        /// 忽略的扩展名，可重复（如 --ignore-ext mov --ignore-ext mp4）
        #[arg(long = "ignore-ext")]
        ignore_exts: Vec<String>,

        /// 线程数："auto"=CPU 核数；1 串行（默认）
        #[arg(long, default_value = "1")]
        threads: String,

        /// 详细日志（未设置 RUST_LOG 时等价 debug）
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            input,
            output,
            append,
            echo,
            terms,
            config,
            min_len,
            max_len,
            chunk_size,
            max_chunks,
            ignore_case,
            common,
            no_dedupe,
            no_order,
            ignore_exts,
            threads,
            verbose,
        } => {
            init_tracing(verbose);
            info!(?input, ?output, "starting scan");

            // 配置基线：文件或默认值；命令行参数逐项覆盖
            let mut opts = match &config {
                Some(p) => ScanOptions::from_file(p).context("load config file")?,
                None => ScanOptions::default(),
            };
            if let Some(v) = min_len {
                opts.min_len = v;
            }
            if let Some(v) = max_len {
                opts.max_len = Some(v);
            }
            if let Some(v) = chunk_size {
                opts.chunk_size = v;
            }
            if let Some(v) = max_chunks {
                opts.max_chunks = Some(v);
            }
            if !ignore_exts.is_empty() {
                opts.ignore_exts = ignore_exts;
            }
            if terms.is_some() {
                opts.terms_path = terms;
            }
            if ignore_case {
                opts.ignore_case = true;
            }
            if common {
                opts.common = true;
            }
            if no_dedupe {
                opts.dedupe = false;
            }
            if no_order {
                opts.order = false;
            }
            opts.threads = parse_threads(&threads);

            let mode = if append {
                WriteMode::Append
            } else {
                WriteMode::Truncate
            };
            let mut out =
                OutputSink::open(output.as_deref(), mode, echo).context("open output")?;

            let stats = scan_and_write(&input, &mut out, &opts)?;

            info!(
                files_scanned = stats.files_scanned,
                files_skipped = stats.files_skipped,
                strings_found = stats.strings_found,
                outputs_written = stats.outputs_written,
                "scan finished"
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // RUST_LOG 优先；未设置时由 -v 决定缺省等级
    let fallback = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数："auto" → 0（自动）；其余按数值，非法值退回串行
fn parse_threads(s: &str) -> usize {
    if s.eq_ignore_ascii_case("auto") {
        return 0;
    }
    s.parse::<usize>().unwrap_or(1).max(1)
}
