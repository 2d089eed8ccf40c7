// 该文件是 Haiyan （海眼） 项目的一部分。
// src/args.rs - 项目参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use url::Url;

/// Haiyan 舰船检测工作台
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub session: SessionArgs,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(ClapArgs, Debug)]
pub struct SessionArgs {
  /// 检测器
  /// 支持格式:
  /// - 模拟检测: mock://?delay_ms=800&seed=42
  #[arg(long, global = true, default_value = "mock://", value_name = "DETECTOR")]
  pub detector: Url,

  /// 输出目标，可重复指定
  /// 支持格式:
  /// - 终端: term://
  /// - HTML 报告: html:///path/to/dir
  /// - JSON 记录: json:///path/to/session.json[?history]
  #[arg(long, global = true, default_value = "term://", value_name = "OUTPUT")]
  pub output: Vec<Url>,

  /// 训练结果图像所在目录（results.png, confusion_matrix.png, labels.jpg）
  #[arg(long, global = true, value_name = "DIR")]
  pub assets: Option<PathBuf>,

  /// YOLO 训练输出的 results.csv
  #[arg(long, global = true, value_name = "FILE")]
  pub metrics: Option<PathBuf>,

  /// 读取时解码校验图像，无法解码的文件会被跳过
  #[arg(long, global = true)]
  pub verify: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 上传图像并运行一次检测
  Run {
    /// 图像文件，按给定顺序选择，最多保留 10 张
    #[arg(long, num_args = 1.., value_name = "FILE")]
    input: Vec<PathBuf>,

    /// 图像目录，按文件名排序后追加到选择中
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,
  },
  /// 交互模式：upload / run / clear / show / quit
  Shell,
}
