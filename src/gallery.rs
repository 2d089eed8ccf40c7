// 该文件是 Haiyan （海眼） 项目的一部分。
// src/gallery.rs - 训练结果图集
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

use tracing::{debug, warn};

/// 图集中的一张静态图像，`path` 相对于页面根目录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryItem {
  pub title: &'static str,
  pub path: &'static str,
  pub alt: &'static str,
}

impl GalleryItem {
  pub fn file_name(&self) -> &'static str {
    self.path.trim_start_matches('/')
  }
}

/// YOLO 训练输出（`runs/train/`）中的三张图，页面只按固定路径引用
pub const TRAINING_GALLERY: [GalleryItem; 3] = [
  GalleryItem {
    title: "📈 Training Performance",
    path: "/results.png",
    alt: "Training Results",
  },
  GalleryItem {
    title: "🎯 Confusion Matrix",
    path: "/confusion_matrix.png",
    alt: "Confusion Matrix",
  },
  GalleryItem {
    title: "🏷 Labels Distribution",
    path: "/labels.jpg",
    alt: "Labels",
  },
];

#[derive(Debug, Clone, Default)]
pub struct Gallery {
  assets_dir: Option<PathBuf>,
}

impl Gallery {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.assets_dir = Some(dir.into());
    self
  }

  pub fn items(&self) -> &'static [GalleryItem] {
    &TRAINING_GALLERY
  }

  pub fn assets_dir(&self) -> Option<&Path> {
    self.assets_dir.as_deref()
  }

  /// 资源目录中缺失的图像；未配置资源目录时返回空
  pub fn missing_assets(&self) -> Vec<GalleryItem> {
    let Some(dir) = self.assets_dir() else {
      return Vec::new();
    };
    self
      .items()
      .iter()
      .filter(|item| !dir.join(item.file_name()).is_file())
      .copied()
      .collect()
  }

  /// 把资源目录中的图像复制到 `root` 下的固定路径，返回复制的数量
  pub fn copy_into(&self, root: &Path) -> std::io::Result<usize> {
    let Some(dir) = self.assets_dir() else {
      return Ok(0);
    };

    let mut copied = 0;
    for item in self.items() {
      let source = dir.join(item.file_name());
      if !source.is_file() {
        warn!("训练结果图像缺失: {}", source.display());
        continue;
      }
      let target = root.join(item.file_name());
      std::fs::copy(&source, &target)?;
      debug!("复制 {} -> {}", source.display(), target.display());
      copied += 1;
    }
    Ok(copied)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fixed_paths_are_preserved() {
    let paths: Vec<_> = TRAINING_GALLERY.iter().map(|i| i.path).collect();
    assert_eq!(paths, ["/results.png", "/confusion_matrix.png", "/labels.jpg"]);
    assert_eq!(TRAINING_GALLERY[2].file_name(), "labels.jpg");
  }

  #[test]
  fn without_assets_nothing_is_copied_or_missing() {
    let root = tempfile::tempdir().unwrap();
    let gallery = Gallery::new();
    assert!(gallery.missing_assets().is_empty());
    assert_eq!(gallery.copy_into(root.path()).unwrap(), 0);
  }

  #[test]
  fn copies_present_assets_and_reports_missing() {
    let assets = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("results.png"), b"png").unwrap();
    std::fs::write(assets.path().join("labels.jpg"), b"jpg").unwrap();

    let gallery = Gallery::new().with_assets_dir(assets.path());
    let missing = gallery.missing_assets();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].path, "/confusion_matrix.png");

    assert_eq!(gallery.copy_into(root.path()).unwrap(), 2);
    assert_eq!(std::fs::read(root.path().join("results.png")).unwrap(), b"png");
    assert!(!root.path().join("confusion_matrix.png").exists());
  }
}
