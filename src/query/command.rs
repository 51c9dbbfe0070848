//! Query Command Parsing
//!
//! Parses one line of the query language into a [`Command`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Result count when a query does not give one
pub const DEFAULT_RESULTS: usize = 10;

/// Separates TRAIN options from the sentence
const TRAIN_SEPARATOR: &str = "::";

/// On-disk format for EXPORT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Binary,
    Text,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(ExportFormat::Binary),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(Error::InvalidQuery(format!(
                "unknown export format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Binary => write!(f, "binary"),
            ExportFormat::Text => write!(f, "text"),
        }
    }
}

/// Parsed query command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Nearest neighbours of a word
    Cosine { word: String, n: usize },

    /// Mean of positive minus negative words
    Analogy {
        positive: Vec<String>,
        negative: Vec<String>,
        n: usize,
    },

    /// Print a word's unit vector
    Vector { word: String },

    /// Check vocabulary membership
    Has { word: String },

    /// Learn a sentence embedding; unset options fall back to the handler's
    Train {
        epochs: Option<usize>,
        alpha: Option<f32>,
        sentence: String,
    },

    /// Write the store as a word2vec model file
    Export { format: ExportFormat, path: PathBuf },

    /// Write a snapshot
    Save { path: PathBuf },

    /// Store summary
    Info,
}

impl Command {
    /// Parse a command line
    ///
    /// Keywords are case-insensitive, words are kept verbatim.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (keyword, rest) = match input.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (input, ""),
        };
        if keyword.is_empty() {
            return Err(Error::InvalidQuery("empty command".to_string()));
        }

        let args: Vec<&str> = rest.split_whitespace().collect();
        match keyword.to_ascii_uppercase().as_str() {
            "COSINE" => {
                let (word, n) = match args.as_slice() {
                    [word] => (*word, DEFAULT_RESULTS),
                    [word, n] => (*word, parse_arg(n, "result count")?),
                    _ => return Err(usage("COSINE <word> [n]")),
                };
                Ok(Command::Cosine {
                    word: word.to_string(),
                    n,
                })
            }

            "ANALOGY" => {
                let mut words = args.as_slice();
                let mut n = DEFAULT_RESULTS;
                // A trailing number is the result count when other words remain
                if let [head @ .., last] = words {
                    if !head.is_empty() {
                        if let Ok(count) = last.parse::<usize>() {
                            n = count;
                            words = head;
                        }
                    }
                }

                let mut positive = Vec::new();
                let mut negative = Vec::new();
                for word in words {
                    match word.strip_prefix('-') {
                        Some("") => return Err(usage("ANALOGY <word>.. -<word>.. [n]")),
                        Some(neg) => negative.push(neg.to_string()),
                        None => positive.push(word.to_string()),
                    }
                }
                if positive.is_empty() && negative.is_empty() {
                    return Err(usage("ANALOGY <word>.. -<word>.. [n]"));
                }
                Ok(Command::Analogy {
                    positive,
                    negative,
                    n,
                })
            }

            "VECTOR" => match args.as_slice() {
                [word] => Ok(Command::Vector {
                    word: word.to_string(),
                }),
                _ => Err(usage("VECTOR <word>")),
            },

            "HAS" => match args.as_slice() {
                [word] => Ok(Command::Has {
                    word: word.to_string(),
                }),
                _ => Err(usage("HAS <word>")),
            },

            "TRAIN" => {
                let (options, sentence) = rest
                    .split_once(TRAIN_SEPARATOR)
                    .ok_or_else(|| usage("TRAIN [epochs] [alpha] :: <sentence>"))?;
                let options: Vec<&str> = options.split_whitespace().collect();
                let (epochs, alpha) = match options.as_slice() {
                    [] => (None, None),
                    [epochs] => (Some(parse_arg(epochs, "epochs")?), None),
                    [epochs, alpha] => (
                        Some(parse_arg(epochs, "epochs")?),
                        Some(parse_arg(alpha, "alpha")?),
                    ),
                    _ => return Err(usage("TRAIN [epochs] [alpha] :: <sentence>")),
                };
                Ok(Command::Train {
                    epochs,
                    alpha,
                    sentence: sentence.trim().to_string(),
                })
            }

            "EXPORT" => match args.as_slice() {
                [format, path] => Ok(Command::Export {
                    format: format.parse()?,
                    path: PathBuf::from(path),
                }),
                _ => Err(usage("EXPORT binary|text <path>")),
            },

            "SAVE" => match args.as_slice() {
                [path] => Ok(Command::Save {
                    path: PathBuf::from(path),
                }),
                _ => Err(usage("SAVE <path>")),
            },

            "INFO" if args.is_empty() => Ok(Command::Info),
            "INFO" => Err(usage("INFO")),

            other => Err(Error::InvalidQuery(format!("unknown command: {}", other))),
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Command::parse(s)
    }
}

fn usage(text: &str) -> Error {
    Error::InvalidQuery(format!("usage: {}", text))
}

fn parse_arg<T: FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::InvalidQuery(format!("invalid {}: {}", what, token)))
}
