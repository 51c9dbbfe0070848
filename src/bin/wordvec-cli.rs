//! wordvec CLI
//!
//! Loads a word2vec model and answers similarity queries interactively.

use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wordvec::query::Handler;
use wordvec::vector::VectorRows;
use wordvec::{LoadConfig, Snapshot, TrainConfig, WordVectors};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// word2vec binary (`-binary 1`)
    Binary,
    /// word2vec text (`-binary 0`)
    Text,
    /// wordvec snapshot
    Snapshot,
}

/// wordvec - word embedding queries
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Model file
    path: PathBuf,

    /// Model file format
    #[arg(short, long, value_enum, default_value_t = Format::Binary)]
    format: Format,

    /// Memory-map snapshot rows instead of reading them (snapshot format only)
    #[arg(long)]
    mmap: bool,

    /// Longer words are truncated
    #[arg(long, default_value_t = wordvec::config::DEFAULT_MAX_WORD_LENGTH)]
    max_word_length: usize,

    /// File with one word per line; only these words are kept
    #[arg(long)]
    desired_vocab: Option<PathBuf>,

    /// word2vec `-classes` output to attach as clusters
    #[arg(long)]
    clusters: Option<PathBuf>,

    /// Skip loading `<path>.syn1` and `<path>.vocab`
    #[arg(long)]
    no_side_model: bool,

    /// Training epochs for TRAIN
    #[arg(long, default_value_t = 50)]
    epochs: usize,

    /// Starting learning rate for TRAIN
    #[arg(long, default_value_t = 0.05)]
    alpha: f32,

    /// Seed for TRAIN (random when unset)
    #[arg(long)]
    seed: Option<u64>,

    /// Run a single command and exit
    #[arg(short, long)]
    command: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("wordvec=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.mmap && args.format != Format::Snapshot {
        anyhow::bail!("--mmap requires --format snapshot");
    }

    let load = load_config(&args)?;
    let mut train = TrainConfig::default()
        .with_epochs(args.epochs)
        .with_alpha(args.alpha);
    if let Some(seed) = args.seed {
        train = train.with_seed(seed);
    }

    match args.format {
        Format::Binary => {
            let store = WordVectors::from_binary_file(&args.path, &load)?;
            run(handler(store, &load, train), args.command.as_deref())
        }
        Format::Text => {
            let store = WordVectors::from_text_file(&args.path, &load)?;
            run(handler(store, &load, train), args.command.as_deref())
        }
        Format::Snapshot if args.mmap => {
            let store = Snapshot::new(load.clone()).open_mapped(&args.path)?;
            run(handler(store, &load, train), args.command.as_deref())
        }
        Format::Snapshot => {
            let store = Snapshot::new(load.clone()).load(&args.path)?;
            run(handler(store, &load, train), args.command.as_deref())
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<LoadConfig> {
    let mut config = LoadConfig::default()
        .with_max_word_length(args.max_word_length)
        .with_side_model(!args.no_side_model);

    if let Some(path) = &args.desired_vocab {
        let words = fs::read_to_string(path)?;
        config = config.with_desired_vocab(
            words
                .lines()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string),
        );
    }
    if let Some(path) = &args.clusters {
        config = config.with_clusters(path);
    }
    Ok(config)
}

fn handler<M: VectorRows>(
    store: WordVectors<M>,
    load: &LoadConfig,
    train: TrainConfig,
) -> Handler<M> {
    Handler::new(store)
        .with_train_config(train)
        .with_decoder(load.decoder.clone())
}

fn run<M: VectorRows>(handler: Handler<M>, command: Option<&str>) -> anyhow::Result<()> {
    if let Some(line) = command {
        let response = handler.handle_line(line);
        println!("{}", response);
        if response.is_error() {
            anyhow::bail!("command failed");
        }
        return Ok(());
    }

    info!(
        words = handler.store().len(),
        dim = handler.store().dim(),
        "Ready"
    );
    println!("Type 'help' for available commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("wordvec> ");
        io::stdout().flush()?;

        let Some(input) = lines.next() else {
            break;
        };
        let input = input?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        println!("{}", handler.handle_line(input));
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"
Available commands:

  COSINE <word> [n]                    - Nearest words by cosine similarity
  ANALOGY <word>.. -<word>.. [n]       - Words near the mean of +words minus -words
  VECTOR <word>                        - Print a word's unit vector
  HAS <word>                           - 1 if the word is in the vocabulary
  TRAIN [epochs] [alpha] :: <sentence> - Learn a vector for a sentence
  EXPORT binary|text <path>            - Write the model in word2vec format
  SAVE <path>                          - Write a snapshot
  INFO                                 - Vocabulary size and dimension

  help                                 - Show this help
  quit / exit                          - Exit the CLI

Examples:
  COSINE france 5
  ANALOGY king woman -man 3
  TRAIN 20 :: the cat sat on the mat
"#
    );
}
