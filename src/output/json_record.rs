// 该文件是 Haiyan （海眼） 项目的一部分。
// src/output/json_record.rs - JSON 记录输出
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

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  metrics::TrainingMetrics,
  model::DetectionResult,
  output::{Page, Render},
};

#[derive(Error, Debug)]
pub enum JsonRecordError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("路径解码错误: {0}")]
  PathDecodeError(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRecord<'a> {
  file_name: &'a str,
  preview_url: &'a str,
  size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRecord<'a> {
  rendered_at: String,
  images: Vec<ImageRecord<'a>>,
  results: Option<&'a [DetectionResult]>,
  is_running: bool,
  error_message: Option<&'a str>,
  metrics: Option<&'a TrainingMetrics>,
  gallery: Vec<&'static str>,
}

impl<'a> PageRecord<'a> {
  fn new(page: &Page<'a>) -> Self {
    let state = page.state;
    Self {
      rendered_at: Utc::now().to_rfc3339(),
      images: state
        .images()
        .iter()
        .map(|image| ImageRecord {
          file_name: image.name(),
          preview_url: image.preview_url(),
          size: image.blob().len(),
        })
        .collect(),
      results: state.results(),
      is_running: state.is_running(),
      error_message: state.error_message(),
      metrics: page.metrics.metrics(),
      gallery: page.gallery.items().iter().map(|item| item.path).collect(),
    }
  }
}

/// 把会话状态写成 JSON；`?history` 时每次渲染单独保存一个带时间的文件
#[derive(Debug)]
pub struct JsonRecordOutput {
  path: PathBuf,
  history: bool,
  counter: Mutex<u16>,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonRecordError::SchemeMismatch(url.scheme().to_string()));
    }

    let history = url.query_pairs().any(|(k, _)| k == "history");
    Ok(JsonRecordOutput::new(crate::url_to_path(url)?).with_history(history))
  }
}

impl JsonRecordOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      history: false,
      counter: Mutex::new(0),
    }
  }

  pub fn with_history(mut self, history: bool) -> Self {
    self.history = history;
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn record_id(&self) -> u16 {
    let mut counter = self.counter.lock().unwrap_or_else(PoisonError::into_inner);
    *counter = counter.wrapping_add(1);
    *counter
  }

  fn record_path(&self) -> PathBuf {
    if !self.history {
      return self.path.clone();
    }

    let stem = self
      .path
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| "session".to_string());
    let file_name = format!(
      "{}-{}-{:04X}.json",
      stem,
      Utc::now().format("%H-%M-%S"),
      self.record_id()
    );
    self.path.with_file_name(file_name)
  }
}

impl Render for JsonRecordOutput {
  type Error = JsonRecordError;

  fn render_page(&self, page: &Page<'_>) -> Result<(), Self::Error> {
    let path = self.record_path();
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }

    let record = PageRecord::new(page);
    std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
    debug!("会话记录已写入: {}", path.display());
    Ok(())
  }
}

#[cfg(all(test, feature = "model_mock"))]
mod tests {
  use std::time::Duration;

  use serde_json::Value;

  use super::*;
  use crate::{
    gallery::Gallery,
    input::ImageBlob,
    metrics::MetricsPanel,
    model::MockDetector,
    workbench::{EMPTY_INPUT_MESSAGE, Workbench},
  };

  fn workbench() -> Workbench<MockDetector> {
    Workbench::new(MockDetector::new().with_delay(Duration::ZERO))
  }

  fn render(output: &JsonRecordOutput, bench: &Workbench<MockDetector>) {
    let gallery = Gallery::new();
    let page = Page {
      state: bench.state(),
      metrics: &MetricsPanel::Hidden,
      gallery: &gallery,
    };
    output.render_page(&page).unwrap();
  }

  fn read(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
  }

  #[test]
  fn records_session_state() {
    let dir = tempfile::tempdir().unwrap();
    let output = JsonRecordOutput::new(dir.path().join("nested/session.json"));
    let mut bench = workbench();
    bench.upload([
      ImageBlob::new("a.png", vec![0u8; 3]),
      ImageBlob::new("b.png", vec![0u8; 5]),
    ]);
    bench.run_detection().unwrap();
    render(&output, &bench);

    let json = read(output.path());
    assert_eq!(json["images"].as_array().unwrap().len(), 2);
    assert_eq!(json["images"][1]["fileName"], "b.png");
    assert_eq!(json["images"][1]["size"], 5);
    assert!(json["images"][0]["previewUrl"].as_str().unwrap().starts_with("preview://"));
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    assert_eq!(json["results"][0]["detections"][1]["className"], "Motorboat");
    assert_eq!(json["isRunning"], false);
    assert!(json["errorMessage"].is_null());
    assert_eq!(json["gallery"][0], "/results.png");
  }

  #[test]
  fn records_error_without_results() {
    let dir = tempfile::tempdir().unwrap();
    let output = JsonRecordOutput::new(dir.path().join("session.json"));
    let mut bench = workbench();
    let _ = bench.run_detection();
    render(&output, &bench);

    let json = read(output.path());
    assert!(json["results"].is_null());
    assert_eq!(json["errorMessage"], EMPTY_INPUT_MESSAGE);
  }

  #[test]
  fn history_mode_writes_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!(
      "json://{}/session.json?history",
      dir.path().display()
    ))
    .unwrap();
    let output = JsonRecordOutput::from_url(&url).unwrap();
    let bench = workbench();
    render(&output, &bench);
    render(&output, &bench);
    render(&output, &bench);

    let mut names: Vec<_> = std::fs::read_dir(dir.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    names.sort();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| n.starts_with("session-") && n.ends_with(".json")));
    assert!(names.iter().any(|n| n.ends_with("-0003.json")));
  }
}
