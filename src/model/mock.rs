// 该文件是 Haiyan （海眼） 项目的一部分。
// src/model/mock.rs - 模拟检测器
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

use std::ops::RangeInclusive;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::ImageBlob,
  model::{Detection, DetectionResult, Detector, ShipLabel},
};

/// 模拟推理耗时
pub const MOCK_DELAY: Duration = Duration::from_millis(800);
pub const CARGO_SHIP_RANGE: RangeInclusive<f64> = 0.5..=0.9;
pub const MOTORBOAT_RANGE: RangeInclusive<f64> = 0.4..=0.8;

#[derive(Error, Debug)]
pub enum MockDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("参数 {key} 无效: {value}")]
  InvalidParameter { key: String, value: String },
}

/// 不加载任何模型，等待固定时长后为每张图像生成两条随机检测结果
pub struct MockDetector {
  delay: Duration,
  rng: Mutex<StdRng>,
}

impl Default for MockDetector {
  fn default() -> Self {
    Self {
      delay: MOCK_DELAY,
      rng: Mutex::new(StdRng::from_entropy()),
    }
  }
}

impl FromUrlWithScheme for MockDetector {
  const SCHEME: &'static str = "mock";
}

impl FromUrl for MockDetector {
  type Error = MockDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(MockDetectorError::SchemeMismatch(url.scheme().to_string()));
    }

    let mut detector = MockDetector::default();
    for (key, value) in url.query_pairs() {
      let invalid = || MockDetectorError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
      };
      match key.as_ref() {
        "delay_ms" => {
          let ms: u64 = value.parse().map_err(|_| invalid())?;
          detector = detector.with_delay(Duration::from_millis(ms));
        }
        "seed" => {
          let seed: u64 = value.parse().map_err(|_| invalid())?;
          detector = detector.with_seed(seed);
        }
        _ => return Err(invalid()),
      }
    }

    info!("模拟检测器: 延迟 {:?}", detector.delay);
    Ok(detector)
  }
}

impl MockDetector {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  /// 固定随机种子，便于复现
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.rng = Mutex::new(StdRng::seed_from_u64(seed));
    self
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }
}

impl Detector for MockDetector {
  type Error = MockDetectorError;

  fn detect(&self, images: &[ImageBlob]) -> Result<Vec<DetectionResult>, Self::Error> {
    debug!("模拟推理 {} 张图像，等待 {:?}", images.len(), self.delay);
    std::thread::sleep(self.delay);

    let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
    let results = images
      .iter()
      .map(|image| DetectionResult {
        file_name: image.name().to_string(),
        detections: vec![
          Detection::new(ShipLabel::CargoShip, rng.gen_range(CARGO_SHIP_RANGE)),
          Detection::new(ShipLabel::Motorboat, rng.gen_range(MOTORBOAT_RANGE)),
        ],
      })
      .collect();

    Ok(results)
  }
}
