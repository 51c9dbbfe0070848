//! Query Handler
//!
//! Executes parsed commands against a word vector store.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::command::{Command, ExportFormat};
use super::response::{Response, StoreInfo};
use crate::codec::{write_binary, write_text, ByteDecoder};
use crate::config::TrainConfig;
use crate::error::Result;
use crate::persistence::Snapshot;
use crate::storage::WordVectors;
use crate::vector::VectorRows;

/// Query handler
pub struct Handler<M: VectorRows> {
    store: WordVectors<M>,
    train: TrainConfig,
    decoder: ByteDecoder,
    include_clusters: bool,
}

impl<M: VectorRows> Handler<M> {
    pub fn new(store: WordVectors<M>) -> Self {
        Self {
            store,
            train: TrainConfig::default(),
            decoder: ByteDecoder::default(),
            include_clusters: true,
        }
    }

    /// Defaults for TRAIN options left unset
    pub fn with_train_config(mut self, train: TrainConfig) -> Self {
        self.train = train;
        self
    }

    /// Encoding used by EXPORT
    pub fn with_decoder(mut self, decoder: ByteDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_clusters_in_results(mut self, include: bool) -> Self {
        self.include_clusters = include;
        self
    }

    pub fn store(&self) -> &WordVectors<M> {
        &self.store
    }

    /// Parse and execute one input line
    pub fn handle_line(&self, line: &str) -> Response {
        match Command::parse(line) {
            Ok(cmd) => self.execute(cmd),
            Err(e) => Response::Error(e.to_string()),
        }
    }

    /// Execute a command and return response
    pub fn execute(&self, cmd: Command) -> Response {
        let start = Instant::now();
        let name = command_name(&cmd);

        let response = self
            .try_execute(cmd)
            .unwrap_or_else(|e| Response::Error(e.to_string()));

        debug!(cmd = name, latency = ?start.elapsed(), "Command executed");
        response
    }

    fn try_execute(&self, cmd: Command) -> Result<Response> {
        match cmd {
            Command::Cosine { word, n } => {
                let matches = self.store.cosine(&word, n)?;
                self.neighbors(&matches)
            }

            Command::Analogy {
                positive,
                negative,
                n,
            } => {
                let matches = self.store.analogy(positive.as_slice(), negative.as_slice(), n)?;
                self.neighbors(&matches)
            }

            Command::Vector { word } => Ok(Response::Vector(self.store.get_vector(&word)?.to_vec())),

            Command::Has { word } => Ok(Response::Integer(i64::from(self.store.contains(&word)))),

            Command::Train {
                epochs,
                alpha,
                sentence,
            } => {
                let mut config = self.train.clone();
                if let Some(epochs) = epochs {
                    config = config.with_epochs(epochs);
                }
                if let Some(alpha) = alpha {
                    config = config.with_alpha(alpha);
                }
                Ok(Response::Vector(self.store.train_sentence(&sentence, &config)?))
            }

            Command::Export { format, path } => {
                self.export(format, &path)?;
                Ok(Response::Written(path))
            }

            Command::Save { path } => {
                Snapshot::default().save(&self.store, &path)?;
                Ok(Response::Written(path))
            }

            Command::Info => Ok(Response::Info(StoreInfo {
                words: self.store.len(),
                dim: self.store.dim(),
                trainable: self.store.side_model().is_some(),
                clusters: self.store.clusters().is_some(),
            })),
        }
    }

    fn neighbors(&self, matches: &[(usize, f32)]) -> Result<Response> {
        let items = self.store.generate_response(matches, self.include_clusters)?;
        Ok(Response::Neighbors(items))
    }

    fn export(&self, format: ExportFormat, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let vocab = self.store.vocab();
        let vectors = self.store.vectors();
        match format {
            ExportFormat::Binary => write_binary(&mut writer, vocab, vectors, &self.decoder)?,
            ExportFormat::Text => write_text(&mut writer, vocab, vectors, &self.decoder)?,
        }
        writer.flush()?;
        Ok(())
    }
}

fn command_name(cmd: &Command) -> &'static str {
    match cmd {
        Command::Cosine { .. } => "COSINE",
        Command::Analogy { .. } => "ANALOGY",
        Command::Vector { .. } => "VECTOR",
        Command::Has { .. } => "HAS",
        Command::Train { .. } => "TRAIN",
        Command::Export { .. } => "EXPORT",
        Command::Save { .. } => "SAVE",
        Command::Info => "INFO",
    }
}
