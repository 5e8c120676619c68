//! 区切りテキストからの時系列テーブル読み込み

use super::synthetic;
use super::timestamp::{canonical_timestamp, parse_timestamp, parse_value};
use super::{Row, TimeSeriesTable};
use crate::error::{Error, Result, RowErrorKind, RowParseError};
use chrono::Utc;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// 解析できなかった行を書き出す診断ファイル名（作業ディレクトリ）
pub const BAD_RECORD_LOG: &str = "badrecords.log";

/// 一回の読み込み結果
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    pub table: TimeSeriesTable,
    /// 除外された行（元の順序）
    pub rejected: Vec<RowParseError>,
    /// ヘッダーとして読み飛ばした1行目
    pub header: Option<String>,
}

/// テーブルリーダー
#[derive(Debug, Clone)]
pub struct TableReader {
    delimiter: u8,
    bad_record_log: PathBuf,
}

impl Default for TableReader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            bad_record_log: PathBuf::from(BAD_RECORD_LOG),
        }
    }
}

impl TableReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 区切り文字を設定
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// 診断ファイルの出力先を設定
    pub fn with_bad_record_log<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.bad_record_log = path.into();
        self
    }

    pub fn bad_record_log(&self) -> &Path {
        &self.bad_record_log
    }

    /// 入力ファイルがなければ合成データを返す
    pub fn read(&self, source: Option<&Path>) -> Result<TimeSeriesTable> {
        match source {
            Some(path) => Ok(self.read_file(path)?.table),
            None => {
                info!(
                    rows = synthetic::SYNTHETIC_ROWS,
                    "No input file given, generating synthetic data"
                );
                Ok(synthetic::generate(Utc::now()))
            }
        }
    }

    /// ファイルを読み込む。開けない場合のみ失敗する
    pub fn read_file(&self, path: &Path) -> Result<Ingestion> {
        info!(path = %path.display(), "Reading input table");
        let file = File::open(path).map_err(|source| Error::Input {
            path: path.to_path_buf(),
            source,
        })?;

        let ingestion = self.parse(file, path)?;

        if !ingestion.rejected.is_empty() {
            warn!(
                rejected = ingestion.rejected.len(),
                log = %self.bad_record_log.display(),
                "Some input rows could not be parsed and were skipped"
            );
            self.persist_rejected(&ingestion.rejected);
        }

        info!(
            rows = ingestion.table.len(),
            header = ingestion.header.is_some(),
            "Input table loaded"
        );
        Ok(ingestion)
    }

    /// 任意のリーダーから解析する（診断ファイルは書かない）
    pub fn parse<R: Read>(&self, mut reader: R, path: &Path) -> Result<Ingestion> {
        let input_error = |source: std::io::Error| Error::Input {
            path: path.to_path_buf(),
            source,
        };

        // 除外行を元のテキストのまま残すため全体をバッファに読む
        let mut input = Vec::new();
        reader.read_to_end(&mut input).map_err(input_error)?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(self.delimiter)
            .from_reader(input.as_slice());

        let mut ingestion = Ingestion::default();
        let mut rows = Vec::new();
        let mut record = csv::ByteRecord::new();
        let mut first = true;
        let mut ordinal = 0u64;

        loop {
            let more = csv_reader
                .read_byte_record(&mut record)
                .map_err(|e| input_error(e.into()))?;
            if !more {
                break;
            }
            ordinal += 1;

            let line = record.position().map(|p| p.line()).unwrap_or(ordinal);
            let start = record.position().map(|p| p.byte()).unwrap_or(0);
            let end = csv_reader.position().byte();
            let raw = raw_text(&input, start, end);

            let fields: Vec<String> = record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect();

            match parse_row(line, &raw, &fields) {
                Ok(row) => rows.push(row),
                // 1行目が解析できなければヘッダーとみなす
                Err(_) if first => {
                    debug!(line, "Treating first row as header");
                    ingestion.header = Some(raw);
                }
                Err(rejected) => {
                    debug!(line, reason = %rejected.kind, "Skipping row");
                    ingestion.rejected.push(rejected);
                }
            }
            first = false;
        }

        ingestion.table = TimeSeriesTable::new(rows);
        Ok(ingestion)
    }

    fn persist_rejected(&self, rejected: &[RowParseError]) {
        let mut contents = rejected
            .iter()
            .map(|r| r.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        contents.push('\n');

        if let Err(e) = std::fs::write(&self.bad_record_log, contents) {
            error!(
                log = %self.bad_record_log.display(),
                error = %e,
                "Failed to write bad record log"
            );
        }
    }
}

fn parse_row(line: u64, raw: &str, fields: &[String]) -> std::result::Result<Row, RowParseError> {
    let reject = |kind| RowParseError {
        line,
        raw: raw.to_string(),
        kind,
    };

    if fields.len() < 2 {
        return Err(reject(RowErrorKind::MissingField(fields.len())));
    }

    let timestamp = parse_timestamp(&fields[0])
        .ok_or_else(|| reject(RowErrorKind::InvalidTimestamp(fields[0].clone())))?;
    let value = parse_value(&fields[1])
        .ok_or_else(|| reject(RowErrorKind::InvalidValue(fields[1].clone())))?;

    Ok(Row::new(canonical_timestamp(&timestamp), value.to_string()))
}

/// レコードの元テキスト（前後の改行を除く）
fn raw_text(input: &[u8], start: u64, end: u64) -> String {
    let start = usize::try_from(start).unwrap_or(input.len()).min(input.len());
    let end = usize::try_from(end).unwrap_or(input.len()).clamp(start, input.len());
    let text = String::from_utf8_lossy(&input[start..end]);
    text.trim_matches(|c| c == '\r' || c == '\n').to_string()
}
