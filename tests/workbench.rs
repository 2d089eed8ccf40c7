// 该文件是 Haiyan （海眼） 项目的一部分。
// tests/workbench.rs - 工作台集成测试
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

use std::time::{Duration, Instant};

use url::Url;

use haiyan::{
  FromUrl,
  input::{ImageBlob, ImageFileInput},
  model::{CARGO_SHIP_RANGE, DetectorWrapper, MOTORBOAT_RANGE, MockDetector, ShipLabel},
  output::OutputWrapper,
  preview::PreviewStore,
  task::{OneShotTask, Session, Task},
  workbench::{EMPTY_INPUT_MESSAGE, MAX_IMAGES, Workbench, WorkbenchError},
};

fn blobs(n: usize) -> Vec<ImageBlob> {
  (0..n)
    .map(|i| ImageBlob::new(format!("frame-{i:02}.jpg"), vec![i as u8; 32]))
    .collect()
}

fn fast_workbench(store: &PreviewStore) -> Workbench<MockDetector> {
  Workbench::with_preview_store(
    MockDetector::new().with_delay(Duration::ZERO),
    store.clone(),
  )
}

#[test]
fn three_images_give_three_results() {
  let store = PreviewStore::new();
  let mut bench = fast_workbench(&store);

  bench.upload(blobs(3));
  assert_eq!(bench.state().images().len(), 3);

  bench.run_detection().unwrap();
  let results = bench.state().results().unwrap();
  assert_eq!(results.len(), 3);
  assert!(!bench.state().is_running());

  for result in results {
    assert_eq!(result.detections.len(), 2);
    let cargo = &result.detections[0];
    let boat = &result.detections[1];
    assert_eq!(cargo.label, ShipLabel::CargoShip);
    assert_eq!(boat.label, ShipLabel::Motorboat);
    assert!(CARGO_SHIP_RANGE.contains(&cargo.confidence));
    assert!(MOTORBOAT_RANGE.contains(&boat.confidence));
    assert_eq!(cargo.confidence_text().len(), 4);
  }
}

#[test]
fn zero_images_give_the_fixed_warning() {
  let store = PreviewStore::new();
  let mut bench = fast_workbench(&store);

  bench.upload(Vec::new());
  assert!(matches!(
    bench.run_detection(),
    Err(WorkbenchError::EmptyInput)
  ));
  assert_eq!(
    bench.state().error_message(),
    Some("⚠️ Please upload at least one image.")
  );
  assert_eq!(bench.state().error_message(), Some(EMPTY_INPUT_MESSAGE));
  assert!(bench.state().results().is_none());
}

#[test]
fn twelve_images_are_capped_at_ten() {
  let store = PreviewStore::new();
  let mut bench = fast_workbench(&store);

  bench.upload(blobs(12));
  assert_eq!(bench.state().images().len(), MAX_IMAGES);
  assert_eq!(bench.state().images()[9].name(), "frame-09.jpg");
  assert_eq!(store.live_count(), MAX_IMAGES);
}

#[test]
fn clear_all_is_total_and_idempotent() {
  let store = PreviewStore::new();
  let mut bench = fast_workbench(&store);

  bench.clear_all();
  assert!(bench.state().is_empty());

  bench.upload(blobs(4));
  bench.run_detection().unwrap();
  bench.clear_all();
  bench.clear_all();
  assert!(bench.state().images().is_empty());
  assert!(bench.state().results().is_none());
  assert!(bench.state().error_message().is_none());
  assert_eq!(store.live_count(), 0);
}

#[test]
fn repeated_uploads_never_leak_previews() {
  let store = PreviewStore::new();
  let mut bench = fast_workbench(&store);

  for n in [7, 12, 2, 0, 5] {
    bench.upload(blobs(n));
    assert_eq!(store.live_count(), n.min(MAX_IMAGES));
  }
  drop(bench);
  assert_eq!(store.live_count(), 0);
}

#[test]
fn mock_detection_waits_for_the_delay() {
  let store = PreviewStore::new();
  let mut bench = Workbench::with_preview_store(
    MockDetector::new().with_delay(Duration::from_millis(50)),
    store.clone(),
  );
  bench.upload(blobs(1));

  let start = Instant::now();
  bench.run_detection().unwrap();
  assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn detector_and_outputs_from_urls() {
  let dir = tempfile::tempdir().unwrap();
  let detector =
    DetectorWrapper::from_url(&Url::parse("mock://?delay_ms=0&seed=9").unwrap()).unwrap();
  let report = Url::parse(&format!("html://{}/report", dir.path().display())).unwrap();
  let record = Url::parse(&format!("json://{}/session.json", dir.path().display())).unwrap();
  let outputs = vec![
    OutputWrapper::from_url(&report).unwrap(),
    OutputWrapper::from_url(&record).unwrap(),
  ];

  let mut session = Session::new(Workbench::new(detector), outputs);
  OneShotTask::new(blobs(2)).run_task(&mut session).unwrap();

  let html = std::fs::read_to_string(dir.path().join("report/index.html")).unwrap();
  assert!(html.contains("frame-00.jpg"));
  assert!(html.contains("frame-01.jpg"));
  assert_eq!(
    std::fs::read_dir(dir.path().join("report/previews")).unwrap().count(),
    2
  );

  let json: serde_json::Value =
    serde_json::from_slice(&std::fs::read(dir.path().join("session.json")).unwrap()).unwrap();
  assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[test]
fn files_on_disk_flow_through_the_workbench() {
  let dir = tempfile::tempdir().unwrap();
  for i in 0..12 {
    image::RgbImage::new(3, 3)
      .save(dir.path().join(format!("{i:02}.png")))
      .unwrap();
  }
  std::fs::write(dir.path().join("readme.txt"), "not an image").unwrap();

  let blobs = ImageFileInput::from_dir(dir.path())
    .unwrap()
    .verify(true)
    .read_blobs()
    .unwrap();
  assert_eq!(blobs.len(), 12);

  let store = PreviewStore::new();
  let mut bench = fast_workbench(&store);
  bench.upload(blobs);
  bench.run_detection().unwrap();

  let names: Vec<_> = bench
    .state()
    .results()
    .unwrap()
    .iter()
    .map(|r| r.file_name.clone())
    .collect();
  let expected: Vec<_> = (0..10).map(|i| format!("{i:02}.png")).collect();
  assert_eq!(names, expected);
}
