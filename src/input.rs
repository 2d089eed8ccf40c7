// 该文件是 Haiyan （海眼） 项目的一部分。
// src/input.rs - 图像输入
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

use std::sync::Arc;

/// 用户选择的一个图像文件（名称 + 原始字节）
#[derive(Debug, Clone)]
pub struct ImageBlob {
  name: String,
  bytes: Arc<[u8]>,
}

impl ImageBlob {
  pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
    Self {
      name: name.into(),
      bytes: bytes.into(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// 文件扩展名（小写），没有扩展名时返回 None
  pub fn extension(&self) -> Option<String> {
    std::path::Path::new(&self.name)
      .extension()
      .map(|ext| ext.to_string_lossy().to_lowercase())
  }
}

#[cfg(feature = "read_image_file")]
mod read_image_file;

#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError, is_image_path};
