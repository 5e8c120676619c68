//! レスポンスの二段階デコード
//!
//! 外側のJSON → `output2.value.Values[0][0]` → 内側のJSON、の順に解析する。
//! 外側の形が想定と違えばエラー、内側が読めなければプロットなしとして扱う。

use super::wire::{ScoreResponseEnvelope, SecondaryOutput};
use crate::error::Result;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

/// 内側のJSONでプロット画像を保持するキー
pub const GRAPHICS_DEVICE_KEY: &str = "Graphics Device";

/// スコアリング済みテーブル（値はサーバーの文字列をそのまま保持）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputTable {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// base64エンコードされたプロット画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPlot(String);

impl EncodedPlot {
    pub fn new(base64: impl Into<String>) -> Self {
        Self(base64.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 画像バイト列にデコード（改行などの空白は無視）
    pub fn decode(&self) -> Result<Vec<u8>> {
        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
    }
}

/// デコード済みレスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringResponse {
    pub table: OutputTable,
    pub plots: Vec<EncodedPlot>,
}

impl ScoringResponse {
    /// 空でないレスポンス本文を解析
    pub fn from_body(body: &str) -> Result<Self> {
        let envelope: ScoreResponseEnvelope = serde_json::from_str(body)?;
        Ok(Self::from_envelope(envelope))
    }

    pub fn from_envelope(envelope: ScoreResponseEnvelope) -> Self {
        let results = envelope.results;
        let scored = results.output1.value;

        let table = OutputTable {
            column_names: scored.column_names,
            rows: scored
                .values
                .into_iter()
                .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
                .collect(),
        };

        let plots = results
            .output2
            .map(|output| extract_plots(&output))
            .unwrap_or_default();

        Self { table, plots }
    }
}

fn extract_plots(secondary: &SecondaryOutput) -> Vec<EncodedPlot> {
    let Some(document) = secondary.document() else {
        debug!("Secondary output is empty, no plot");
        return Vec::new();
    };

    let inner: Value = match serde_json::from_str(document) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Secondary output is not JSON, no plot");
            return Vec::new();
        }
    };

    let Some(object) = inner.as_object() else {
        return Vec::new();
    };

    object
        .iter()
        .filter(|(key, _)| key.as_str() == GRAPHICS_DEVICE_KEY)
        .filter_map(|(_, value)| first_string(value))
        .filter(|s| !s.trim().is_empty())
        .map(EncodedPlot::new)
        .collect()
}

// 最初の子（文書順、preserve_order 前提）を辿って文字列を探す
fn first_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(first_string),
        Value::Object(map) => map.values().next().and_then(first_string),
        _ => None,
    }
}
