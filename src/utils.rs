// 该文件是 Gezi （格子） 项目的一部分。
// src/utils.rs - URL 辅助函数
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

use url::Url;

/// 将 URL 路径解码为本地文件路径
///
/// `image:///tmp/my%20photo.jpg` 会得到 `/tmp/my photo.jpg`。
/// 解码失败（非 UTF-8）时回退为原始路径。
pub fn url_path(url: &Url) -> PathBuf {
  let raw = url.path();
  match urlencoding::decode(raw) {
    Ok(decoded) => PathBuf::from(decoded.into_owned()),
    Err(_) => PathBuf::from(raw),
  }
}

/// 查询参数中第一个名为 `key` 的值
pub fn query_value(url: &Url, key: &str) -> Option<String> {
  url
    .query_pairs()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_percent_encoded_path() {
    let url = Url::parse("image:///tmp/my%20photo.jpg").unwrap();
    assert_eq!(url_path(&url), PathBuf::from("/tmp/my photo.jpg"));
  }

  #[test]
  fn finds_first_query_value() {
    let url = Url::parse("gridbox:///labels.txt?threshold=0.7&threshold=0.2").unwrap();
    assert_eq!(query_value(&url, "threshold").as_deref(), Some("0.7"));
    assert_eq!(query_value(&url, "config"), None);
  }
}
