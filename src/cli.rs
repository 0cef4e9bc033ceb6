use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "quiz_dashboard")]
#[command(about = "上传教材、跟踪出题进度并导出题目 CSV")]
pub struct Cli {
    /// TOML 配置文件路径（默认读取当前目录的 quiz_dashboard.toml）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 显示书籍、处理状态和统计
    Dashboard {
        /// 每 N 秒刷新一次，Ctrl-C 退出
        #[arg(long)]
        watch: Option<u64>,
    },
    /// 上传 PDF 并触发元数据提取
    Upload {
        file: PathBuf,
        /// 只上传，不触发提取
        #[arg(long)]
        no_extract: bool,
    },
    /// 扫描存储中尚未登记的 PDF
    Scan,
    /// 对已存储的文件触发元数据提取
    Extract { path: String },
    /// 对已存储的文件触发题目生成
    Generate { path: String },
    /// 将文件的处理状态重置为 not_started
    Cancel { path: String },
    /// 将一本书的题目导出为 CSV
    Export {
        book_id: String,
        /// 同时把 CSV 写入该目录
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 创建缺失的后端数据表
    Migrate,
}
