//! Query Responses
//!
//! Result variants for executed commands and their console rendering.

use std::fmt;
use std::path::PathBuf;

use crate::storage::Neighbor;

/// Store summary returned by INFO
#[derive(Debug, Clone, PartialEq)]
pub struct StoreInfo {
    pub words: usize,
    pub dim: usize,
    pub trainable: bool,
    pub clusters: bool,
}

/// Response to a command
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Ranked words with scores
    Neighbors(Vec<Neighbor>),

    /// Raw vector components
    Vector(Vec<f32>),

    /// Integer value (HAS answers 1 or 0)
    Integer(i64),

    /// File written
    Written(PathBuf),

    Info(StoreInfo),

    /// Error response
    Error(String),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Neighbors(items) => {
                if items.is_empty() {
                    return write!(f, "(empty)");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{:>3}) {:<24} {:.6}", i + 1, item.word, item.score)?;
                    if let Some(cluster) = item.cluster {
                        write!(f, "  [cluster {}]", cluster)?;
                    }
                }
                Ok(())
            }
            Response::Vector(values) => {
                write!(f, "[")?;
                for (i, x) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:.6}", x)?;
                }
                write!(f, "]")
            }
            Response::Integer(n) => write!(f, "(integer) {}", n),
            Response::Written(path) => write!(f, "OK wrote {}", path.display()),
            Response::Info(info) => write!(
                f,
                "words: {}\ndim: {}\ntrainable: {}\nclusters: {}",
                info.words,
                info.dim,
                if info.trainable { "yes" } else { "no" },
                if info.clusters { "yes" } else { "no" }
            ),
            Response::Error(msg) => write!(f, "(error) {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_display() {
        let response = Response::Neighbors(vec![
            Neighbor {
                word: "queen".to_string(),
                score: 0.75,
                cluster: None,
            },
            Neighbor {
                word: "princess".to_string(),
                score: 0.5,
                cluster: Some(7),
            },
        ]);
        let text = response.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1) queen"));
        assert!(lines[0].ends_with("0.750000"));
        assert!(lines[1].ends_with("[cluster 7]"));
        assert_eq!(Response::Neighbors(vec![]).to_string(), "(empty)");
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Response::Integer(1).to_string(), "(integer) 1");
        assert_eq!(Response::Vector(vec![0.5, -1.0]).to_string(), "[0.500000, -1.000000]");
        assert_eq!(Response::Error("bad".to_string()).to_string(), "(error) bad");
        assert!(Response::Error(String::new()).is_error());
        assert!(!Response::Integer(0).is_error());
    }

    #[test]
    fn test_info_display() {
        let response = Response::Info(StoreInfo {
            words: 3,
            dim: 2,
            trainable: false,
            clusters: true,
        });
        assert_eq!(
            response.to_string(),
            "words: 3\ndim: 2\ntrainable: no\nclusters: yes"
        );
    }
}
