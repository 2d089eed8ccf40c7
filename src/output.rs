// 该文件是 Haiyan （海眼） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, gallery::Gallery, metrics::MetricsPanel, workbench::SessionState,
};

pub const PAGE_TITLE: &str = "🚢 Ship Detection";
pub const PAGE_SUBTITLE: &str =
  "Upload images, run mock detection, and view YOLO training results.";
pub const UPLOADED_HEADING: &str = "📤 Uploaded Images";
pub const DETECTIONS_HEADING: &str = "🔍 Detections";
pub const TRAINING_HEADING: &str = "📊 YOLO Training Results";
pub const METRICS_HEADING: &str = "📈 Model Performance";
pub const METRICS_UNAVAILABLE_TEXT: &str = "Metrics CSV not found or columns missing.";
pub const NO_IMAGES_TEXT: &str = "No images yet.";
pub const NO_RESULTS_TEXT: &str = "No results yet. Click \"Run Detection\".";
pub const RUN_LABEL: &str = "▶ Run Detection";
pub const RUNNING_LABEL: &str = "Running...";
pub const CLEAR_LABEL: &str = "❌ Clear";
pub const FOOTER_TEXT: &str = "Built with Rust | Naval — Ship Detection";

/// 一次渲染所需的全部内容
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
  pub state: &'a SessionState,
  pub metrics: &'a MetricsPanel,
  pub gallery: &'a Gallery,
}

impl Page<'_> {
  /// 检测按钮的文字，运行中时按钮处于禁用状态
  pub fn trigger_label(&self) -> &'static str {
    if self.state.is_running() {
      RUNNING_LABEL
    } else {
      RUN_LABEL
    }
  }
}

pub trait Render {
  type Error;
  fn render_page(&self, page: &Page<'_>) -> Result<(), Self::Error>;
}

mod terminal;
pub use self::terminal::{TerminalOutput, TerminalOutputError};

#[cfg(feature = "html_report")]
mod html_report;
#[cfg(feature = "html_report")]
pub use self::html_report::{HtmlReportError, HtmlReportOutput};

#[cfg(feature = "json_record")]
mod json_record;
#[cfg(feature = "json_record")]
pub use self::json_record::{JsonRecordError, JsonRecordOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("终端输出错误: {0}")]
  TerminalOutputError(#[from] TerminalOutputError),
  #[cfg(feature = "html_report")]
  #[error("HTML 报告输出错误: {0}")]
  HtmlReportError(#[from] HtmlReportError),
  #[cfg(feature = "json_record")]
  #[error("JSON 记录输出错误: {0}")]
  JsonRecordError(#[from] JsonRecordError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  Terminal(TerminalOutput),
  #[cfg(feature = "html_report")]
  HtmlReport(HtmlReportOutput),
  #[cfg(feature = "json_record")]
  JsonRecord(JsonRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      TerminalOutput::SCHEME => Ok(OutputWrapper::Terminal(TerminalOutput::from_url(url)?)),
      #[cfg(feature = "html_report")]
      HtmlReportOutput::SCHEME => Ok(OutputWrapper::HtmlReport(HtmlReportOutput::from_url(url)?)),
      #[cfg(feature = "json_record")]
      JsonRecordOutput::SCHEME => Ok(OutputWrapper::JsonRecord(JsonRecordOutput::from_url(url)?)),
      scheme => Err(OutputError::SchemeMismatch(scheme.to_string())),
    }
  }
}

impl Render for OutputWrapper {
  type Error = OutputError;

  fn render_page(&self, page: &Page<'_>) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Terminal(output) => output.render_page(page).map_err(OutputError::from),
      #[cfg(feature = "html_report")]
      OutputWrapper::HtmlReport(output) => output.render_page(page).map_err(OutputError::from),
      #[cfg(feature = "json_record")]
      OutputWrapper::JsonRecord(output) => output.render_page(page).map_err(OutputError::from),
    }
  }
}
