// 该文件是 Gezi （格子） 项目的一部分。
// src/output/json_record.rs - 检测结果 JSON 记录
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

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, frame::Frame, model::DetectedBox, output::Render, utils::url_path,
};

#[derive(Error, Debug)]
pub enum JsonRecordError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 写入文件的一条记录，坐标为原图坐标
#[derive(Debug, Serialize)]
pub struct DetectionRecord<'a> {
  pub image_width: u32,
  pub image_height: u32,
  #[serde(flatten)]
  pub detection: &'a DetectedBox,
}

/// `json:///path/to/result.json`
pub struct JsonRecordOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if !Self::accepts(uri) {
      return Err(JsonRecordError::SchemeMismatch);
    }

    Ok(JsonRecordOutput {
      path: url_path(uri),
    })
  }
}

impl Render<Frame, DetectedBox> for JsonRecordOutput {
  type Error = JsonRecordError;

  fn render_result(&self, frame: &Frame, result: &DetectedBox) -> Result<(), Self::Error> {
    let (image_width, image_height) = frame.original_size();
    let record = DetectionRecord {
      image_width,
      image_height,
      detection: result,
    };

    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, serde_json::to_string_pretty(&record)?)?;
    info!("检测记录已写入: {}", self.path.display());

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{frame::RawTensor, model::BoundingBoxDimensions};
  use image::{Rgb, RgbImage};

  #[test]
  fn writes_flattened_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    let url = Url::parse(&format!("json://{}", path.display())).unwrap();
    let output = JsonRecordOutput::from_url(&url).unwrap();

    let frame = Frame::new(
      RgbImage::from_pixel(640, 480, Rgb([0, 0, 0])),
      RawTensor::default(),
    );
    let detection = DetectedBox::new(
      BoundingBoxDimensions {
        x: 10.0,
        y: 20.0,
        width: 30.0,
        height: 40.0,
      },
      0.75,
      "white",
    );
    output.render_result(&frame, &detection).unwrap();

    let value: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["image_width"], 640);
    assert_eq!(value["image_height"], 480);
    assert_eq!(value["label"], "white");
    assert_eq!(value["description"], "white (75%)");
    assert_eq!(value["confidence"], 0.75);
    assert_eq!(value["dimensions"]["x"], 10.0);
    assert_eq!(value["dimensions"]["height"], 40.0);
  }
}
