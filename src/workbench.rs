// 该文件是 Haiyan （海眼） 项目的一部分。
// src/workbench.rs - 检测工作台
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

//! 检测工作台：持有上传的图像、运行检测并保存结果。
//!
//! 所有状态迁移都在调用者线程上完成。`run_detection` 需要 `&mut self`，
//! 因此同一时刻不会有两次检测在进行；运行期间渲染器会看到
//! `is_running == true`，之后一次性看到全部结果。

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  input::ImageBlob,
  model::{DetectionResult, Detector},
  preview::{PreviewHandle, PreviewStore},
};

/// 单次上传最多保留的图像数量
pub const MAX_IMAGES: usize = 10;

pub const EMPTY_INPUT_MESSAGE: &str = "⚠️ Please upload at least one image.";

#[derive(Error, Debug)]
pub enum WorkbenchError {
  #[error("{}", EMPTY_INPUT_MESSAGE)]
  EmptyInput,
  #[error("检测失败: {0}")]
  Detector(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
  #[error("检测结果数量不匹配: 期望 {expected}, 实际 {actual}")]
  ResultCountMismatch { expected: usize, actual: usize },
}

/// 已上传的图像，持有其预览句柄
#[derive(Debug)]
pub struct UploadedImage {
  blob: ImageBlob,
  preview: PreviewHandle,
}

impl UploadedImage {
  pub fn new(blob: ImageBlob, previews: &PreviewStore) -> Self {
    let preview = previews.acquire(blob.name());
    Self { blob, preview }
  }

  pub fn blob(&self) -> &ImageBlob {
    &self.blob
  }

  pub fn name(&self) -> &str {
    self.blob.name()
  }

  pub fn preview(&self) -> &PreviewHandle {
    &self.preview
  }

  pub fn preview_url(&self) -> &str {
    self.preview.url()
  }
}

#[derive(Debug, Default)]
pub struct SessionState {
  images: Vec<UploadedImage>,
  results: Option<Vec<DetectionResult>>,
  is_running: bool,
  error_message: Option<String>,
}

impl SessionState {
  pub fn images(&self) -> &[UploadedImage] {
    &self.images
  }

  pub fn results(&self) -> Option<&[DetectionResult]> {
    self.results.as_deref()
  }

  pub fn is_running(&self) -> bool {
    self.is_running
  }

  pub fn error_message(&self) -> Option<&str> {
    self.error_message.as_deref()
  }

  pub fn is_empty(&self) -> bool {
    self.images.is_empty() && self.results.is_none() && self.error_message.is_none()
  }
}

pub struct Workbench<D> {
  state: SessionState,
  previews: PreviewStore,
  detector: D,
}

impl<D: Detector> Workbench<D> {
  pub fn new(detector: D) -> Self {
    Self::with_preview_store(detector, PreviewStore::new())
  }

  pub fn with_preview_store(detector: D, previews: PreviewStore) -> Self {
    Self {
      state: SessionState::default(),
      previews,
      detector,
    }
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn previews(&self) -> &PreviewStore {
    &self.previews
  }

  /// 上传图像：只保留前 [`MAX_IMAGES`] 个，替换当前图像并清空结果与错误。
  ///
  /// 被替换的图像随旧列表一起 drop，其预览句柄同时释放。
  pub fn upload<I>(&mut self, files: I)
  where
    I: IntoIterator<Item = ImageBlob>,
  {
    let mut files = files.into_iter();
    let images: Vec<UploadedImage> = files
      .by_ref()
      .take(MAX_IMAGES)
      .map(|blob| UploadedImage::new(blob, &self.previews))
      .collect();
    let dropped = files.count();
    if dropped > 0 {
      debug!("超出上限的 {} 个文件已忽略", dropped);
    }

    info!("上传图像 {} 张", images.len());
    self.state.images = images;
    self.state.results = None;
    self.state.error_message = None;
  }

  pub fn run_detection(&mut self) -> Result<(), WorkbenchError> {
    self.run_detection_with(|_| {})
  }

  /// 运行检测，`observe` 在进入运行状态和得到最终状态时各被调用一次。
  ///
  /// 没有图像时只设置错误信息，`observe` 不会被调用。
  pub fn run_detection_with<F>(&mut self, mut observe: F) -> Result<(), WorkbenchError>
  where
    F: FnMut(&SessionState),
  {
    self.state.error_message = None;
    if self.state.images.is_empty() {
      warn!("没有可检测的图像");
      self.state.error_message = Some(EMPTY_INPUT_MESSAGE.to_string());
      return Err(WorkbenchError::EmptyInput);
    }

    self.state.is_running = true;
    observe(&self.state);

    let blobs: Vec<ImageBlob> = self.state.images.iter().map(|i| i.blob.clone()).collect();
    let now = std::time::Instant::now();
    let outcome = match self.detector.detect(&blobs) {
      Ok(results) if results.len() == blobs.len() => Ok(results),
      Ok(results) => Err(WorkbenchError::ResultCountMismatch {
        expected: blobs.len(),
        actual: results.len(),
      }),
      Err(e) => Err(WorkbenchError::Detector(Box::new(e))),
    };
    self.state.is_running = false;

    let outcome = match outcome {
      Ok(results) => {
        info!("检测完成，耗时: {:.2?}", now.elapsed());
        self.state.results = Some(results);
        Ok(())
      }
      Err(e) => {
        warn!("检测失败: {}", e);
        self.state.error_message = Some(e.to_string());
        Err(e)
      }
    };
    observe(&self.state);
    outcome
  }

  /// 释放所有预览句柄并回到空状态，可重复调用
  pub fn clear_all(&mut self) {
    let released = self.state.images.len();
    self.state.images.clear();
    self.state.results = None;
    self.state.error_message = None;
    debug!("清空会话，释放 {} 个预览句柄", released);
  }
}
