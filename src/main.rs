// 该文件是 Haiyan （海眼） 项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use haiyan::{
  FromUrl,
  gallery::Gallery,
  input::ImageFileInput,
  metrics::MetricsPanel,
  model::DetectorWrapper,
  output::OutputWrapper,
  task::{InteractiveTask, OneShotTask, Session, Task},
  workbench::Workbench,
};

use args::{Args, Command};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  info!("检测器: {}", args.session.detector);
  for output in &args.session.output {
    info!("输出目标: {}", output);
  }

  let detector = DetectorWrapper::from_url(&args.session.detector)?;
  let outputs = args
    .session
    .output
    .iter()
    .map(OutputWrapper::from_url)
    .collect::<Result<Vec<_>, _>>()?;

  let mut gallery = Gallery::new();
  if let Some(dir) = &args.session.assets {
    gallery = gallery.with_assets_dir(dir);
    for item in gallery.missing_assets() {
      warn!("训练结果图像缺失: {}", item.path);
    }
  }

  let metrics = MetricsPanel::load(args.session.metrics.as_deref())?;
  if metrics == MetricsPanel::Unavailable {
    info!("未找到训练指标或缺少必要的列");
  }

  let mut session = Session::new(Workbench::new(detector), outputs)
    .with_metrics(metrics)
    .with_gallery(gallery)
    .with_verify(args.session.verify);

  match args.command {
    Command::Run { input, input_dir } => {
      let mut selection = ImageFileInput::from_paths(input).verify(args.session.verify);
      if let Some(dir) = input_dir {
        selection.extend(ImageFileInput::from_dir(&dir)?.paths().iter().cloned());
      }
      let blobs = selection.read_blobs()?;
      OneShotTask::new(blobs).run_task(&mut session)?;
    }
    Command::Shell => {
      InteractiveTask::from_stdin()?.run_task(&mut session)?;
    }
  }

  Ok(())
}
