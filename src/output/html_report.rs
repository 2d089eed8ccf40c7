// 该文件是 Haiyan （海眼） 项目的一部分。
// src/output/html_report.rs - HTML 报告输出
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

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  metrics::MetricsPanel,
  model::WithLabel,
  output::{
    CLEAR_LABEL, DETECTIONS_HEADING, FOOTER_TEXT, METRICS_HEADING, METRICS_UNAVAILABLE_TEXT,
    NO_IMAGES_TEXT, NO_RESULTS_TEXT, PAGE_SUBTITLE, PAGE_TITLE, Page, Render, TRAINING_HEADING, UPLOADED_HEADING,
  },
  workbench::UploadedImage,
};

const INDEX_FILE: &str = "index.html";
const PREVIEW_DIR: &str = "previews";

#[derive(Error, Debug)]
pub enum HtmlReportError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("路径解码错误: {0}")]
  PathDecodeError(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 把页面写成静态 HTML：`index.html`、`previews/` 以及图集的固定路径
#[derive(Debug)]
pub struct HtmlReportOutput {
  directory: PathBuf,
}

impl FromUrlWithScheme for HtmlReportOutput {
  const SCHEME: &'static str = "html";
}

impl FromUrl for HtmlReportOutput {
  type Error = HtmlReportError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(HtmlReportError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(HtmlReportOutput {
      directory: crate::url_to_path(url)?,
    })
  }
}

fn escape_html(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(c),
    }
  }
  escaped
}

/// 预览文件名取自句柄 id，句柄释放后对应文件会在下次渲染时删除
fn preview_file_name(image: &UploadedImage) -> String {
  let ext = image.blob().extension().unwrap_or_else(|| "img".to_string());
  format!("{}.{}", image.preview().id(), ext)
}

impl HtmlReportOutput {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn index_path(&self) -> PathBuf {
    self.directory.join(INDEX_FILE)
  }

  fn sync_previews(&self, images: &[UploadedImage]) -> Result<(), HtmlReportError> {
    let preview_dir = self.directory.join(PREVIEW_DIR);
    std::fs::create_dir_all(&preview_dir)?;

    let mut live = HashSet::with_capacity(images.len());
    for image in images {
      let name = preview_file_name(image);
      let path = preview_dir.join(&name);
      if !path.exists() {
        std::fs::write(&path, image.blob().bytes())?;
      }
      live.insert(name);
    }

    for entry in std::fs::read_dir(&preview_dir)? {
      let entry = entry?;
      let name = entry.file_name().to_string_lossy().into_owned();
      if !live.contains(&name) {
        std::fs::remove_file(entry.path())?;
        debug!("删除过期预览文件: {}", name);
      }
    }
    Ok(())
  }

  pub fn render_html(&self, page: &Page<'_>) -> String {
    let state = page.state;

    let disabled = if state.is_running() { " disabled" } else { "" };
    let error = state
      .error_message()
      .map(|e| format!(r#"  <div class="error">{}</div>"#, escape_html(e)))
      .unwrap_or_default();

    let images = if state.images().is_empty() {
      format!("      <p>{}</p>", NO_IMAGES_TEXT)
    } else {
      let cards: String = state
        .images()
        .iter()
        .map(|image| {
          format!(
            r#"
        <div class="img-card">
          <img src="{}/{}" alt="upload" data-preview="{}">
          <p>{}</p>
        </div>"#,
            PREVIEW_DIR,
            urlencoding::encode(&preview_file_name(image)),
            escape_html(image.preview_url()),
            escape_html(image.name())
          )
        })
        .collect();
      format!(r#"      <div class="img-grid">{}
      </div>"#, cards)
    };

    let results = match state.results() {
      None => format!("      <p>{}</p>", escape_html(NO_RESULTS_TEXT)),
      Some(results) => results
        .iter()
        .map(|result| {
          let rows: String = result
            .detections
            .iter()
            .map(|d| {
              format!(
                r#"
              <tr>
                <td>{}</td>
                <td>{}</td>
              </tr>"#,
                d.label.to_label_str(),
                d.confidence_text()
              )
            })
            .collect();
          format!(
            r#"
      <div class="result-card">
        <strong>{}</strong>
        <table>
          <thead>
            <tr>
              <th>Class</th>
              <th>Confidence</th>
            </tr>
          </thead>
          <tbody>{}
          </tbody>
        </table>
      </div>"#,
            escape_html(&result.file_name),
            rows
          )
        })
        .collect::<String>(),
    };

    let metrics = match page.metrics {
      MetricsPanel::Hidden => String::new(),
      MetricsPanel::Unavailable => format!(
        r#"  <div class="metrics">
    <h2>{}</h2>
    <p class="info">{}</p>
  </div>"#,
        METRICS_HEADING, METRICS_UNAVAILABLE_TEXT
      ),
      MetricsPanel::Loaded(metrics) => {
        let items: String = metrics
          .entries()
          .iter()
          .map(|(name, value)| format!("\n      <li><strong>{}:</strong> {}</li>", name, value))
          .collect();
        format!(
          r#"  <div class="metrics">
    <h2>{}</h2>
    <ul>{}
    </ul>
  </div>"#,
          METRICS_HEADING, items
        )
      }
    };

    let gallery: String = page
      .gallery
      .items()
      .iter()
      .map(|item| {
        format!(
          r#"
      <div class="result-img">
        <h4>{}</h4>
        <img src=".{}" alt="{}">
      </div>"#,
          item.title, item.path, item.alt
        )
      })
      .collect();

    format!(
      r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Ship Detection</title>
</head>
<body>
<div class="container">
  <h1>{title}</h1>
  <p class="subtitle">{subtitle}</p>
  <div class="upload-section">
    <div class="buttons">
      <button{disabled}>{trigger}</button>
      <button>{clear}</button>
    </div>
  </div>
{error}
  <div class="grid">
    <div class="card">
      <h3>{uploaded}</h3>
{images}
    </div>
    <div class="card">
      <h3>{detections}</h3>
{results}
    </div>
  </div>
{metrics}
  <div class="training-results">
    <h2>{training}</h2>
    <p>These images are taken directly from your <code>runs/train/</code> output folder.</p>
    <div class="results-grid">{gallery}
    </div>
  </div>
  <footer>{footer} | {generated}</footer>
</div>
</body>
</html>
"#,
      title = PAGE_TITLE,
      subtitle = PAGE_SUBTITLE,
      disabled = disabled,
      trigger = page.trigger_label(),
      clear = CLEAR_LABEL,
      error = error,
      uploaded = UPLOADED_HEADING,
      images = images,
      detections = DETECTIONS_HEADING,
      results = results,
      metrics = metrics,
      training = TRAINING_HEADING,
      gallery = gallery,
      footer = FOOTER_TEXT,
      generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    )
  }
}

impl Render for HtmlReportOutput {
  type Error = HtmlReportError;

  fn render_page(&self, page: &Page<'_>) -> Result<(), Self::Error> {
    std::fs::create_dir_all(&self.directory)?;
    self.sync_previews(page.state.images())?;
    page.gallery.copy_into(&self.directory)?;

    let index = self.index_path();
    std::fs::write(&index, self.render_html(page))?;
    info!("HTML 报告已写入: {}", index.display());
    Ok(())
  }
}
