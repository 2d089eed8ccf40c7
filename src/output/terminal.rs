// 该文件是 Haiyan （海眼） 项目的一部分。
// src/output/terminal.rs - 终端输出
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  metrics::MetricsPanel,
  model::WithLabel,
  output::{
    CLEAR_LABEL, DETECTIONS_HEADING, METRICS_HEADING, METRICS_UNAVAILABLE_TEXT, NO_IMAGES_TEXT,
    NO_RESULTS_TEXT, PAGE_SUBTITLE, PAGE_TITLE, Page, Render, TRAINING_HEADING, UPLOADED_HEADING,
  },
};

const CLASS_COLUMN_WIDTH: usize = 14;

#[derive(Error, Debug)]
pub enum TerminalOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 把两个面板和图集打印到标准输出
#[derive(Debug, Default)]
pub struct TerminalOutput;

impl FromUrlWithScheme for TerminalOutput {
  const SCHEME: &'static str = "term";
}

impl FromUrl for TerminalOutput {
  type Error = TerminalOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(TerminalOutputError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(TerminalOutput)
  }
}

fn human_size(bytes: usize) -> String {
  const KIB: f64 = 1024.0;
  let bytes = bytes as f64;
  if bytes < KIB {
    format!("{} B", bytes)
  } else if bytes < KIB * KIB {
    format!("{:.1} KiB", bytes / KIB)
  } else {
    format!("{:.2} MiB", bytes / (KIB * KIB))
  }
}

impl TerminalOutput {
  pub fn write_page<W: Write>(&self, out: &mut W, page: &Page<'_>) -> std::io::Result<()> {
    let state = page.state;

    writeln!(out, "{}", PAGE_TITLE)?;
    writeln!(out, "{}", PAGE_SUBTITLE)?;
    writeln!(out)?;
    writeln!(out, "[{}]  [{}]", page.trigger_label(), CLEAR_LABEL)?;
    if let Some(error) = state.error_message() {
      writeln!(out, "{}", error)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", UPLOADED_HEADING)?;
    if state.images().is_empty() {
      writeln!(out, "  {}", NO_IMAGES_TEXT)?;
    }
    for (i, image) in state.images().iter().enumerate() {
      writeln!(
        out,
        "  {:>2}. {}  ({})  {}",
        i + 1,
        image.name(),
        human_size(image.blob().len()),
        image.preview_url()
      )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", DETECTIONS_HEADING)?;
    match state.results() {
      None => writeln!(out, "  {}", NO_RESULTS_TEXT)?,
      Some(results) => {
        for result in results {
          writeln!(out, "  {}", result.file_name)?;
          writeln!(out, "    {:<width$}{}", "Class", "Confidence", width = CLASS_COLUMN_WIDTH)?;
          for detection in &result.detections {
            writeln!(
              out,
              "    {:<width$}{}",
              detection.label.to_label_str(),
              detection.confidence_text(),
              width = CLASS_COLUMN_WIDTH
            )?;
          }
        }
      }
    }

    match page.metrics {
      MetricsPanel::Hidden => {}
      MetricsPanel::Unavailable => {
        writeln!(out)?;
        writeln!(out, "{}", METRICS_HEADING)?;
        writeln!(out, "  {}", METRICS_UNAVAILABLE_TEXT)?;
      }
      MetricsPanel::Loaded(metrics) => {
        writeln!(out)?;
        writeln!(out, "{}", METRICS_HEADING)?;
        for (name, value) in metrics.entries() {
          writeln!(out, "  {}: {}", name, value)?;
        }
      }
    }

    writeln!(out)?;
    writeln!(out, "{}", TRAINING_HEADING)?;
    for item in page.gallery.items() {
      writeln!(out, "  {}  {}", item.title, item.path)?;
    }
    Ok(())
  }
}

impl Render for TerminalOutput {
  type Error = TerminalOutputError;

  fn render_page(&self, page: &Page<'_>) -> Result<(), Self::Error> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    self.write_page(&mut out, page)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
  }
}
