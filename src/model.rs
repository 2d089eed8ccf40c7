// 该文件是 Haiyan （海眼） 项目的一部分。
// src/model.rs - 检测模型
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

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{FromUrl, input::ImageBlob};

/// 检测器：输入一组图像，按相同顺序输出每张图像的检测结果
pub trait Detector {
  type Error: std::error::Error + Send + Sync + 'static;

  fn detect(&self, images: &[ImageBlob]) -> Result<Vec<DetectionResult>, Self::Error>;
}

pub trait WithLabel: fmt::Debug {
  fn to_label_str(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShipLabel {
  #[serde(rename = "Cargo Ship")]
  CargoShip,
  #[serde(rename = "Motorboat")]
  Motorboat,
}

impl WithLabel for ShipLabel {
  fn to_label_str(&self) -> &'static str {
    match self {
      ShipLabel::CargoShip => "Cargo Ship",
      ShipLabel::Motorboat => "Motorboat",
    }
  }
}

impl fmt::Display for ShipLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.to_label_str())
  }
}

/// 保留两位小数
pub fn round_confidence(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
  #[serde(rename = "className")]
  pub label: ShipLabel,
  pub confidence: f64,
}

impl Detection {
  /// 置信度会被截断到 [0, 1] 并保留两位小数
  pub fn new(label: ShipLabel, confidence: f64) -> Self {
    Self {
      label,
      confidence: round_confidence(confidence.clamp(0.0, 1.0)),
    }
  }

  /// 两位小数的展示文本
  pub fn confidence_text(&self) -> String {
    format!("{:.2}", self.confidence)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
  pub file_name: String,
  pub detections: Vec<Detection>,
}

#[cfg(feature = "model_mock")]
mod mock;
#[cfg(feature = "model_mock")]
pub use self::mock::{
  CARGO_SHIP_RANGE, MOCK_DELAY, MOTORBOAT_RANGE, MockDetector, MockDetectorError,
};

#[derive(Error, Debug)]
pub enum DetectorError {
  #[cfg(feature = "model_mock")]
  #[error("模拟检测器错误: {0}")]
  MockDetectorError(#[from] MockDetectorError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 按 URL 方案选择的检测器
pub enum DetectorWrapper {
  #[cfg(feature = "model_mock")]
  Mock(MockDetector),
}

impl FromUrl for DetectorWrapper {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "model_mock")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == MockDetector::SCHEME {
        return Ok(DetectorWrapper::Mock(MockDetector::from_url(url)?));
      }
    }
    Err(DetectorError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl Detector for DetectorWrapper {
  type Error = DetectorError;

  fn detect(&self, images: &[ImageBlob]) -> Result<Vec<DetectionResult>, Self::Error> {
    // 未启用任何检测器时该枚举为空
    match *self {
      #[cfg(feature = "model_mock")]
      DetectorWrapper::Mock(ref detector) => detector.detect(images).map_err(DetectorError::from),
    }
  }
}
