// 该文件是 Haiyan （海眼） 项目的一部分。
// src/task.rs - 工作台任务
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

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::{info, warn};

use crate::{
  gallery::Gallery,
  input::ImageBlob,
  metrics::MetricsPanel,
  model::Detector,
  output::{OutputWrapper, Page, Render},
  workbench::{Workbench, WorkbenchError},
};

/// 工作台与它的渲染目标
pub struct Session<D> {
  workbench: Workbench<D>,
  outputs: Vec<OutputWrapper>,
  metrics: MetricsPanel,
  gallery: Gallery,
  verify: bool,
}

/// 某个输出失败只记录警告，其余输出照常渲染，会话继续
fn render_all(outputs: &[OutputWrapper], page: &Page<'_>) {
  for output in outputs {
    if let Err(e) = output.render_page(page) {
      warn!("渲染失败: {}", e);
    }
  }
}

impl<D: Detector> Session<D> {
  pub fn new(workbench: Workbench<D>, outputs: Vec<OutputWrapper>) -> Self {
    Self {
      workbench,
      outputs,
      metrics: MetricsPanel::Hidden,
      gallery: Gallery::new(),
      verify: false,
    }
  }

  pub fn with_metrics(mut self, metrics: MetricsPanel) -> Self {
    self.metrics = metrics;
    self
  }

  pub fn with_gallery(mut self, gallery: Gallery) -> Self {
    self.gallery = gallery;
    self
  }

  /// 交互模式下读取文件时是否解码校验
  pub fn with_verify(mut self, verify: bool) -> Self {
    self.verify = verify;
    self
  }

  pub fn workbench(&self) -> &Workbench<D> {
    &self.workbench
  }

  pub fn render(&self) {
    render_all(
      &self.outputs,
      &Page {
        state: self.workbench.state(),
        metrics: &self.metrics,
        gallery: &self.gallery,
      },
    );
  }

  pub fn upload(&mut self, blobs: Vec<ImageBlob>) {
    self.workbench.upload(blobs);
    self.render();
  }

  /// 运行检测并渲染。空输入只体现在页面上的错误信息里，不作为失败返回
  pub fn run_detection(&mut self) -> anyhow::Result<()> {
    let Session {
      workbench,
      outputs,
      metrics,
      gallery,
      ..
    } = &mut *self;
    let (outputs, metrics, gallery) = (&*outputs, &*metrics, &*gallery);

    let outcome = workbench.run_detection_with(|state| {
      let page = Page {
        state,
        metrics,
        gallery,
      };
      render_all(outputs, &page);
    });

    match outcome {
      Ok(()) => Ok(()),
      Err(WorkbenchError::EmptyInput) => {
        self.render();
        Ok(())
      }
      Err(e) => Err(e.into()),
    }
  }

  pub fn clear_all(&mut self) {
    self.workbench.clear_all();
    self.render();
  }
}

pub trait Task<D>: Sized {
  type Error;
  fn run_task(self, session: &mut Session<D>) -> Result<(), Self::Error>;
}

/// 上传一次、检测一次
pub struct OneShotTask {
  blobs: Vec<ImageBlob>,
}

impl OneShotTask {
  pub fn new(blobs: Vec<ImageBlob>) -> Self {
    Self { blobs }
  }
}

impl<D: Detector> Task<D> for OneShotTask {
  type Error = anyhow::Error;

  fn run_task(self, session: &mut Session<D>) -> Result<(), Self::Error> {
    info!("开始任务...");
    session.upload(self.blobs);
    session.run_detection()?;
    info!("任务完成");
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
  Upload(Vec<PathBuf>),
  Run,
  Clear,
  Show,
  Help,
  Quit,
}

pub const SHELL_HELP: &str = "\
commands:
  upload <path>...   选择图像（最多 10 张，替换当前选择）
  run                运行检测
  clear              清空图像与结果
  show               重新渲染页面
  help               显示本帮助
  quit               退出";

impl ShellCommand {
  pub fn parse(line: &str) -> Result<Option<Self>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
      return Ok(None);
    };
    let command = match command {
      "upload" | "u" => ShellCommand::Upload(words.map(PathBuf::from).collect()),
      "run" | "r" => ShellCommand::Run,
      "clear" | "c" => ShellCommand::Clear,
      "show" | "s" => ShellCommand::Show,
      "help" | "h" | "?" => ShellCommand::Help,
      "quit" | "exit" | "q" => ShellCommand::Quit,
      other => return Err(format!("未知命令: {}", other)),
    };
    Ok(Some(command))
  }
}

#[derive(Debug)]
pub enum ShellEvent {
  Line(String),
  Interrupt,
  Eof,
}

/// 逐行读取命令驱动同一个工作台，收到中断或输入结束时退出
pub struct InteractiveTask {
  events: Receiver<ShellEvent>,
}

impl InteractiveTask {
  pub fn new(events: Receiver<ShellEvent>) -> Self {
    Self { events }
  }

  /// 从标准输入读取命令，并把 Ctrl-C 转为退出事件
  pub fn from_stdin() -> anyhow::Result<Self> {
    let (tx, rx) = mpsc::channel();

    let interrupt = tx.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = interrupt.send(ShellEvent::Interrupt);
    })?;

    thread::spawn(move || {
      let stdin = std::io::stdin();
      for line in stdin.lock().lines() {
        match line {
          Ok(line) => {
            if tx.send(ShellEvent::Line(line)).is_err() {
              return;
            }
          }
          Err(e) => {
            warn!("读取标准输入失败: {}", e);
            break;
          }
        }
      }
      let _ = tx.send(ShellEvent::Eof);
    });

    Ok(Self::new(rx))
  }

  pub fn from_lines<I, S>(lines: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let (tx, rx) = mpsc::channel();
    for line in lines {
      let _ = tx.send(ShellEvent::Line(line.into()));
    }
    let _ = tx.send(ShellEvent::Eof);
    Self::new(rx)
  }
}

#[cfg(feature = "read_image_file")]
fn read_selection(paths: Vec<PathBuf>, verify: bool) -> anyhow::Result<Vec<ImageBlob>> {
  Ok(
    crate::input::ImageFileInput::from_paths(paths)
      .verify(verify)
      .read_blobs()?,
  )
}

#[cfg(not(feature = "read_image_file"))]
fn read_selection(_paths: Vec<PathBuf>, _verify: bool) -> anyhow::Result<Vec<ImageBlob>> {
  anyhow::bail!("未启用图像文件输入 (read_image_file)")
}

impl<D: Detector> Task<D> for InteractiveTask {
  type Error = anyhow::Error;

  fn run_task(self, session: &mut Session<D>) -> Result<(), Self::Error> {
    info!("进入交互模式，输入 help 查看命令");
    session.render();

    loop {
      let line = match self.events.recv() {
        Ok(ShellEvent::Line(line)) => line,
        Ok(ShellEvent::Interrupt) => {
          warn!("中断信号接收，退出交互模式");
          break;
        }
        Ok(ShellEvent::Eof) | Err(_) => break,
      };

      let command = match ShellCommand::parse(&line) {
        Ok(Some(command)) => command,
        Ok(None) => continue,
        Err(e) => {
          warn!("{}", e);
          continue;
        }
      };

      match command {
        ShellCommand::Upload(paths) => match read_selection(paths, session.verify) {
          Ok(blobs) => session.upload(blobs),
          Err(e) => warn!("读取图像失败: {}", e),
        },
        ShellCommand::Run => session.run_detection()?,
        ShellCommand::Clear => session.clear_all(),
        ShellCommand::Show => session.render(),
        ShellCommand::Help => println!("{}", SHELL_HELP),
        ShellCommand::Quit => break,
      }
    }

    session.clear_all();
    info!("会话结束");
    Ok(())
  }
}

#[cfg(all(test, feature = "model_mock"))]
mod tests {
  use std::time::Duration;

  use super::*;
  #[cfg(feature = "json_record")]
  use crate::output::JsonRecordOutput;
  use crate::{model::MockDetector, preview::PreviewStore, workbench::EMPTY_INPUT_MESSAGE};

  fn session(outputs: Vec<OutputWrapper>) -> (Session<MockDetector>, PreviewStore) {
    let store = PreviewStore::new();
    let workbench = Workbench::with_preview_store(
      MockDetector::new().with_delay(Duration::ZERO),
      store.clone(),
    );
    (Session::new(workbench, outputs), store)
  }

  fn blobs(n: usize) -> Vec<ImageBlob> {
    (0..n)
      .map(|i| ImageBlob::new(format!("{i}.png"), vec![i as u8]))
      .collect()
  }

  #[test]
  fn parses_commands() {
    assert_eq!(ShellCommand::parse("   "), Ok(None));
    assert_eq!(ShellCommand::parse("run"), Ok(Some(ShellCommand::Run)));
    assert_eq!(ShellCommand::parse(" q "), Ok(Some(ShellCommand::Quit)));
    assert_eq!(
      ShellCommand::parse("upload a.png  b.jpg"),
      Ok(Some(ShellCommand::Upload(vec![
        PathBuf::from("a.png"),
        PathBuf::from("b.jpg")
      ])))
    );
    assert!(ShellCommand::parse("detonate").is_err());
  }

  #[test]
  fn one_shot_runs_detection() {
    let (mut session, store) = session(Vec::new());
    OneShotTask::new(blobs(12)).run_task(&mut session).unwrap();

    let state = session.workbench().state();
    assert_eq!(state.images().len(), 10);
    assert_eq!(state.results().map(|r| r.len()), Some(10));
    assert!(!state.is_running());
    assert_eq!(store.live_count(), 10);
  }

  #[test]
  fn one_shot_with_no_images_reports_warning() {
    let (mut session, _) = session(Vec::new());
    OneShotTask::new(Vec::new()).run_task(&mut session).unwrap();
    let state = session.workbench().state();
    assert_eq!(state.error_message(), Some(EMPTY_INPUT_MESSAGE));
    assert!(state.results().is_none());
  }

  #[cfg(feature = "json_record")]
  #[test]
  fn one_shot_renders_final_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let outputs = vec![OutputWrapper::JsonRecord(JsonRecordOutput::new(&path))];
    let (mut session, _) = session(outputs);
    OneShotTask::new(blobs(3)).run_task(&mut session).unwrap();

    let json: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(json["isRunning"], false);
    assert_eq!(json["results"].as_array().unwrap().len(), 3);
  }

  #[cfg(feature = "read_image_file")]
  #[test]
  fn interactive_session_releases_everything_on_exit() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("ship.png");
    image::RgbImage::new(2, 2).save(&image).unwrap();

    let (mut session, store) = session(Vec::new());
    let task = InteractiveTask::from_lines([
      format!("upload {}", image.display()),
      "run".to_string(),
      "bogus".to_string(),
      "show".to_string(),
    ]);
    task.run_task(&mut session).unwrap();

    assert!(session.workbench().state().is_empty());
    assert_eq!(store.live_count(), 0);
  }

  #[test]
  fn interrupt_ends_the_session() {
    let (mut session, _) = session(Vec::new());
    let (tx, rx) = mpsc::channel();
    tx.send(ShellEvent::Line("run".to_string())).unwrap();
    tx.send(ShellEvent::Interrupt).unwrap();
    tx.send(ShellEvent::Line("upload never-read.png".to_string())).unwrap();

    // 中断后的命令不再执行，会话在退出时被清空
    InteractiveTask::new(rx).run_task(&mut session).unwrap();
    assert!(session.workbench().state().is_empty());
  }

  #[cfg(feature = "json_record")]
  #[test]
  fn failing_output_does_not_end_the_session() {
    let dir = tempfile::tempdir().unwrap();
    // 目标路径是目录，每次写入都会失败
    let outputs = vec![OutputWrapper::JsonRecord(JsonRecordOutput::new(dir.path()))];
    let (mut session, store) = session(outputs);
    session.upload(blobs(2));

    let task = InteractiveTask::from_lines(["run", "show", "clear", "run", "quit"]);
    task.run_task(&mut session).unwrap();
    assert!(session.workbench().state().is_empty());
    assert_eq!(store.live_count(), 0);

    OneShotTask::new(blobs(3)).run_task(&mut session).unwrap();
    assert_eq!(session.workbench().state().results().map(|r| r.len()), Some(3));
  }

  #[test]
  fn missing_file_selection_is_an_error() {
    assert!(read_selection(vec![PathBuf::from("/no/such/file.png")], false).is_err());
  }

  #[test]
  fn failed_upload_does_not_end_the_session() {
    let (mut session, store) = session(Vec::new());
    session.upload(blobs(2));

    let task = InteractiveTask::from_lines(["upload /no/such/file.png", "run", "quit"]);
    task.run_task(&mut session).unwrap();
    assert_eq!(store.live_count(), 0);
  }
}
