// 该文件是 Haiyan （海眼） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::ImageFormat;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::ImageBlob, workbench::MAX_IMAGES};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("路径解码错误: {0}")]
  PathDecodeError(std::string::FromUtf8Error),
}

impl From<std::io::Error> for ImageFileInputError {
  fn from(err: std::io::Error) -> Self {
    ImageFileInputError::IoError(err)
  }
}

impl From<std::string::FromUtf8Error> for ImageFileInputError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ImageFileInputError::PathDecodeError(err)
  }
}

/// 按扩展名判断是否为图像文件，相当于文件选择框的 `accept="image/*"`
pub fn is_image_path(path: &Path) -> bool {
  ImageFormat::from_path(path).is_ok()
}

/// 从文件系统读取的图像选择，保持选择顺序
#[derive(Debug, Clone, Default)]
pub struct ImageFileInput {
  paths: Vec<PathBuf>,
  verify: bool,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch(url.scheme().to_string()));
    }

    let path = crate::url_to_path(url)?;
    let verify = url.query_pairs().any(|(k, _)| k == "verify");

    let input = if path.is_dir() {
      Self::from_dir(&path)?
    } else {
      Self::from_paths([path])
    };
    Ok(input.verify(verify))
  }
}

impl ImageFileInput {
  pub fn from_paths<I, P>(paths: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    Self {
      paths: paths.into_iter().map(Into::into).collect(),
      verify: false,
    }
  }

  /// 目录中的文件按文件名排序，作为选择顺序
  pub fn from_dir(dir: &Path) -> Result<Self, ImageFileInputError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
      let path = entry?.path();
      if path.is_file() {
        paths.push(path);
      }
    }
    paths.sort();
    debug!("目录 {} 中找到 {} 个文件", dir.display(), paths.len());
    Ok(Self::from_paths(paths))
  }

  /// 读取时解码校验图像内容，无法解码的文件会被跳过
  pub fn verify(mut self, verify: bool) -> Self {
    self.verify = verify;
    self
  }

  pub fn paths(&self) -> &[PathBuf] {
    &self.paths
  }

  pub fn extend<I, P>(&mut self, paths: I)
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.paths.extend(paths.into_iter().map(Into::into));
  }

  /// 按选择顺序读取，凑满 [`MAX_IMAGES`] 张后停止，其余文件不会被打开
  pub fn read_blobs(&self) -> Result<Vec<ImageBlob>, ImageFileInputError> {
    let mut blobs = Vec::with_capacity(self.paths.len().min(MAX_IMAGES));
    for (index, path) in self.paths.iter().enumerate() {
      if blobs.len() == MAX_IMAGES {
        debug!("已达到 {} 张上限，忽略其余 {} 个文件", MAX_IMAGES, self.paths.len() - index);
        break;
      }
      if !is_image_path(path) {
        debug!("跳过非图像文件: {}", path.display());
        continue;
      }

      let bytes = std::fs::read(path)?;
      if self.verify {
        if let Err(e) = image::load_from_memory(&bytes) {
          warn!("图像解码失败，已跳过 {}: {}", path.display(), e);
          continue;
        }
      }

      let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
      blobs.push(ImageBlob::new(name, bytes));
    }

    info!("读取图像文件 {} 个", blobs.len());
    Ok(blobs)
  }
}
