// 该文件是 Haiyan （海眼） 项目的一部分。
// src/preview.rs - 预览句柄管理
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

//! 预览句柄：上传时申请，图像离开会话时释放。
//!
//! 每个 [`PreviewHandle`] 在 [`PreviewStore`] 中登记一条记录，句柄被 drop 时
//! 自动注销，因此替换、清空或结束会话都不会遗留句柄。

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

pub const PREVIEW_SCHEME: &str = "preview";

type Registry = HashSet<Uuid>;

/// 预览句柄登记表，可在多个持有者之间共享
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
  registry: Arc<Mutex<Registry>>,
}

impl PreviewStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Registry> {
    self.registry.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// 为名为 `name` 的图像申请一个预览句柄
  pub fn acquire(&self, name: &str) -> PreviewHandle {
    let id = Uuid::new_v4();
    let url = format!("{}://{}/{}", PREVIEW_SCHEME, id, urlencoding::encode(name));
    self.lock().insert(id);
    debug!("申请预览句柄: {}", url);

    PreviewHandle {
      id,
      url,
      registry: Arc::clone(&self.registry),
    }
  }

  /// 当前未释放的句柄数量
  pub fn live_count(&self) -> usize {
    self.lock().len()
  }

  pub fn is_live(&self, handle_id: Uuid) -> bool {
    self.lock().contains(&handle_id)
  }
}

/// 预览句柄，不可克隆，drop 时释放
#[derive(Debug)]
pub struct PreviewHandle {
  id: Uuid,
  url: String,
  registry: Arc<Mutex<Registry>>,
}

impl PreviewHandle {
  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn url(&self) -> &str {
    &self.url
  }
}

impl Drop for PreviewHandle {
  fn drop(&mut self) {
    let removed = self
      .registry
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.id);
    if removed {
      debug!("释放预览句柄: {}", self.url);
    }
  }
}
