//! read → score → write の一連の処理

use crate::error::Result;
use crate::output::{ResultWriter, WrittenArtifacts};
use crate::parameters::RequestParameters;
use crate::scoring::ScoringService;
use crate::table::TableReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 入力データの取得元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Synthetic,
}

impl InputSource {
    /// 入力ファイルがあればそれを使い、`--random` は無視する
    pub fn resolve(input: Option<&Path>, random: bool) -> Self {
        match input {
            Some(path) => {
                if random {
                    debug!("--random ignored because an input file was given");
                }
                InputSource::File(path.to_path_buf())
            }
            None => InputSource::Synthetic,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            InputSource::File(path) => Some(path),
            InputSource::Synthetic => None,
        }
    }
}

/// 実行結果
#[derive(Debug)]
pub enum RunOutcome {
    /// 成功レスポンスの本文が空だった（出力なし）
    NoResult,
    Written(WrittenArtifacts),
}

impl RunOutcome {
    pub fn artifacts(&self) -> Option<&WrittenArtifacts> {
        match self {
            RunOutcome::NoResult => None,
            RunOutcome::Written(artifacts) => Some(artifacts),
        }
    }
}

pub struct Pipeline<S> {
    reader: TableReader,
    service: S,
    writer: ResultWriter,
}

impl<S: ScoringService> Pipeline<S> {
    pub fn new(reader: TableReader, service: S, writer: ResultWriter) -> Self {
        Self {
            reader,
            service,
            writer,
        }
    }

    /// 一回分の処理を実行する。書き込み失敗は `WrittenArtifacts` に含まれる
    pub async fn run(
        &self,
        source: &InputSource,
        params: &RequestParameters,
        output: Option<&Path>,
    ) -> Result<RunOutcome> {
        let table = self.reader.read(source.path())?;

        info!(endpoint = self.service.endpoint(), "Calling scoring service");
        let Some(response) = self.service.score(&table, params).await? else {
            return Ok(RunOutcome::NoResult);
        };
        info!("Scoring service call complete");

        Ok(RunOutcome::Written(self.writer.write(&response, output)))
    }
}
