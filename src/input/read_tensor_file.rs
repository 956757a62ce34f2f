// 该文件是 Gezi （格子） 项目的一部分。
// src/input/read_tensor_file.rs - 原始输出张量文件
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RawTensor,
  utils::{query_value, url_path},
};

const F32_SIZE: usize = std::mem::size_of::<f32>();

#[derive(Error, Debug)]
pub enum TensorFileInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("二进制张量长度 {0} 不是 4 的倍数")]
  TruncatedBinary(usize),
  #[error("未知的张量格式: {0}")]
  UnknownFormat(String),
}

/// 张量文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorFormat {
  /// 小端 f32 连续存储
  F32Le,
  /// 数字组成的 JSON 数组
  Json,
}

impl TensorFormat {
  /// `.json` 后缀为 JSON，其余按二进制处理
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("json") => TensorFormat::Json,
      _ => TensorFormat::F32Le,
    }
  }
}

impl std::str::FromStr for TensorFormat {
  type Err = TensorFileInputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "f32le" | "bin" | "raw" => Ok(TensorFormat::F32Le),
      "json" => Ok(TensorFormat::Json),
      other => Err(TensorFileInputError::UnknownFormat(other.to_string())),
    }
  }
}

pub fn parse_tensor(bytes: &[u8], format: TensorFormat) -> Result<RawTensor, TensorFileInputError> {
  match format {
    TensorFormat::Json => {
      let values: Vec<f32> = serde_json::from_slice(bytes)?;
      Ok(RawTensor::from(values))
    }
    TensorFormat::F32Le => {
      if bytes.len() % F32_SIZE != 0 {
        return Err(TensorFileInputError::TruncatedBinary(bytes.len()));
      }
      let values = bytes
        .chunks_exact(F32_SIZE)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect::<Vec<_>>();
      Ok(RawTensor::from(values))
    }
  }
}

/// `tensor:///path/to/output.bin` 或 `tensor:///path/to/output.json`
///
/// 可用 `?format=json|f32le` 覆盖根据后缀推断出的格式。
pub struct TensorFileInput {
  tensor: RawTensor,
}

impl FromUrlWithScheme for TensorFileInput {
  const SCHEME: &'static str = "tensor";
}

impl FromUrl for TensorFileInput {
  type Error = TensorFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if !Self::accepts(url) {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(TensorFileInputError::SchemeMismatch);
    }

    let path = url_path(url);
    let format = match query_value(url, "format") {
      Some(format) => format.parse()?,
      None => TensorFormat::from_path(&path),
    };

    info!("读取张量文件: {} ({:?})", path.display(), format);
    let bytes = std::fs::read(&path)?;
    let tensor = parse_tensor(&bytes, format)?;
    debug!("张量元素个数: {}", tensor.len());

    Ok(TensorFileInput { tensor })
  }
}

impl TensorFileInput {
  pub fn into_tensor(self) -> RawTensor {
    self.tensor
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_little_endian_floats() {
    let bytes: Vec<u8> = [1.5f32, -2.0, 0.25]
      .iter()
      .flat_map(|v| v.to_le_bytes())
      .collect();
    let tensor = parse_tensor(&bytes, TensorFormat::F32Le).unwrap();
    assert_eq!(tensor.as_slice(), &[1.5, -2.0, 0.25]);
  }

  #[test]
  fn rejects_truncated_binary() {
    assert!(matches!(
      parse_tensor(&[0u8; 7], TensorFormat::F32Le),
      Err(TensorFileInputError::TruncatedBinary(7))
    ));
  }

  #[test]
  fn parses_json_array() {
    let tensor = parse_tensor(b"[0, 1.5, -3e2]", TensorFormat::Json).unwrap();
    assert_eq!(tensor.as_slice(), &[0.0, 1.5, -300.0]);
  }

  #[test]
  fn format_follows_extension_and_query() {
    assert_eq!(
      TensorFormat::from_path(Path::new("/a/out.JSON")),
      TensorFormat::Json
    );
    assert_eq!(
      TensorFormat::from_path(Path::new("/a/out.bin")),
      TensorFormat::F32Le
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.dat");
    std::fs::write(&path, "[4, 5]").unwrap();
    let url = Url::parse(&format!("tensor://{}?format=json", path.display())).unwrap();
    let tensor = TensorFileInput::from_url(&url).unwrap().into_tensor();
    assert_eq!(tensor.as_slice(), &[4.0, 5.0]);
  }

  #[test]
  fn unknown_format_is_rejected() {
    let url = Url::parse("tensor:///tmp/out.bin?format=npy").unwrap();
    assert!(matches!(
      TensorFileInput::from_url(&url),
      Err(TensorFileInputError::UnknownFormat(_))
    ));
  }
}
