// 该文件是 Haiyan （海眼） 项目的一部分。
// src/metrics.rs - 训练指标
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

//! 读取 YOLO 训练输出的 `results.csv`，取最后一轮的指标。

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

const EPOCH_COLUMN: &str = "epoch";
const PRECISION_COLUMN: &str = "metrics/precision";
const RECALL_COLUMN: &str = "metrics/recall";
const MAP50_COLUMN: &str = "metrics/mAP_0.5";
const MAP50_95_COLUMN: &str = "metrics/mAP_0.5:0.95";

#[derive(Error, Debug)]
pub enum MetricsError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("CSV 错误: {0}")]
  CsvError(#[from] csv::Error),
  #[error("列 {column} 的值无效: {value}")]
  InvalidValue { column: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingMetrics {
  pub epoch: u32,
  pub precision: f64,
  pub recall: f64,
  #[serde(rename = "mAP50")]
  pub map50: f64,
  #[serde(rename = "mAP50_95")]
  pub map50_95: f64,
}

impl TrainingMetrics {
  /// 展示用的 (名称, 值) 列表
  pub fn entries(&self) -> [(&'static str, String); 5] {
    [
      ("Epoch", self.epoch.to_string()),
      ("Precision", self.precision.to_string()),
      ("Recall", self.recall.to_string()),
      ("mAP@0.5", self.map50.to_string()),
      ("mAP@0.5:0.95", self.map50_95.to_string()),
    ]
  }
}

/// 页面上的指标面板：未指定 `--metrics` 时不显示，指定了但读不到时显示提示
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MetricsPanel {
  #[default]
  Hidden,
  Unavailable,
  Loaded(TrainingMetrics),
}

impl MetricsPanel {
  pub fn load(path: Option<&Path>) -> Result<Self, MetricsError> {
    let Some(path) = path else {
      return Ok(MetricsPanel::Hidden);
    };
    Ok(match load_metrics(path)? {
      Some(metrics) => MetricsPanel::Loaded(metrics),
      None => MetricsPanel::Unavailable,
    })
  }

  pub fn metrics(&self) -> Option<&TrainingMetrics> {
    match self {
      MetricsPanel::Loaded(metrics) => Some(metrics),
      _ => None,
    }
  }
}

fn round3(value: f64) -> f64 {
  (value * 1000.0).round() / 1000.0
}

/// 文件不存在时返回 `Ok(None)`
pub fn load_metrics(path: &Path) -> Result<Option<TrainingMetrics>, MetricsError> {
  if !path.is_file() {
    info!("训练指标文件不存在: {}", path.display());
    return Ok(None);
  }
  let file = std::fs::File::open(path)?;
  parse_metrics(file)
}

/// 缺少任一指标列或没有数据行时返回 `Ok(None)`
pub fn parse_metrics<R: Read>(reader: R) -> Result<Option<TrainingMetrics>, MetricsError> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(reader);

  let headers = reader.headers()?.clone();
  let column = |name: &str| headers.iter().position(|h| h == name);
  let (Some(epoch), Some(precision), Some(recall), Some(map50), Some(map50_95)) = (
    column(EPOCH_COLUMN),
    column(PRECISION_COLUMN),
    column(RECALL_COLUMN),
    column(MAP50_COLUMN),
    column(MAP50_95_COLUMN),
  ) else {
    debug!("训练指标缺少必要的列");
    return Ok(None);
  };

  let mut last = None;
  for record in reader.records() {
    last = Some(record?);
  }
  let Some(last) = last else {
    debug!("训练指标没有数据行");
    return Ok(None);
  };

  let invalid = |name: &'static str, raw: &str| MetricsError::InvalidValue {
    column: name,
    value: raw.to_string(),
  };
  let value = |index: usize, name: &'static str| -> Result<f64, MetricsError> {
    let raw = last.get(index).unwrap_or_default();
    raw.parse::<f64>().map_err(|_| invalid(name, raw))
  };
  let raw_epoch = last.get(epoch).unwrap_or_default();
  let epoch = raw_epoch
    .parse::<u32>()
    .map_err(|_| invalid(EPOCH_COLUMN, raw_epoch))?;

  let metrics = TrainingMetrics {
    epoch,
    precision: round3(value(precision, PRECISION_COLUMN)?),
    recall: round3(value(recall, RECALL_COLUMN)?),
    map50: round3(value(map50, MAP50_COLUMN)?),
    map50_95: round3(value(map50_95, MAP50_95_COLUMN)?),
  };
  info!("训练指标: 第 {} 轮", metrics.epoch);
  Ok(Some(metrics))
}
