// 该文件是 Gezi （格子） 项目的一部分。
// src/model/labels.rs - 类别标签表
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

use std::{ops::Deref, path::Path};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签表为空")]
  Empty,
}

/// 有序、非空的类别名称表，下标即类别编号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
  labels: Box<[String]>,
}

impl LabelVocabulary {
  /// 每行一个类别名；去掉行尾空白，忽略空行
  pub fn from_lines(content: &str) -> Result<Self, LabelError> {
    let labels: Vec<String> = content
      .lines()
      .map(str::trim_end)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();
    Self::try_from(labels)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    info!("加载标签文件: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let labels = Self::from_lines(&content)?;
    debug!("共 {} 个类别", labels.len());
    Ok(labels)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.labels
  }
}

impl TryFrom<Vec<String>> for LabelVocabulary {
  type Error = LabelError;

  fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
    if labels.is_empty() {
      return Err(LabelError::Empty);
    }
    Ok(Self {
      labels: labels.into_boxed_slice(),
    })
  }
}

impl Deref for LabelVocabulary {
  type Target = [String];

  fn deref(&self) -> &Self::Target {
    &self.labels
  }
}
