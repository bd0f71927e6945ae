use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use colloquy::{
    Answer, ChatConfig, ChatSession, ChunkConfig, Embedder, Generator, OpenAiClient, OpenAiConfig,
    RetrieverConfig, load_result_file, normalize, render_report, write_normalized, write_report,
};

#[derive(Parser)]
#[command(name = "colloquy")]
#[command(author, version, about = "Transcript analysis and retrieval-augmented transcript chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a completed job result into speaker-indexed structures
    Process {
        /// Input job-result file (AssemblyAI JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the normalized transcript (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for a human-readable analysis report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print transcript statistics without writing output
    Analyze {
        /// Input job-result file (AssemblyAI JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Interactive question answering against a transcript
    Chat {
        /// Input job-result file (AssemblyAI JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory where the index is persisted
        #[arg(long)]
        store: Option<PathBuf>,

        /// Maximum chunk length in characters
        #[arg(long, default_value = "2500")]
        chunk_size: usize,

        /// Overlap carried between consecutive chunks, in characters
        #[arg(long, default_value = "200")]
        chunk_overlap: usize,

        /// Maximum chunks retrieved per question
        #[arg(long, default_value = "4")]
        top_k: usize,

        /// Minimum similarity score for retrieved chunks (0-1)
        #[arg(long, default_value = "0.5")]
        min_score: f32,

        /// Paraphrase each question and merge retrieval results
        #[arg(long)]
        expand_queries: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Ask a single question against a transcript
    Ask {
        /// Input job-result file (AssemblyAI JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// The question to answer
        #[arg(short, long)]
        question: String,

        /// Maximum chunks retrieved for the question
        #[arg(long, default_value = "4")]
        top_k: usize,

        /// Minimum similarity score for retrieved chunks (0-1)
        #[arg(long, default_value = "0.5")]
        min_score: f32,

        /// Paraphrase the question and merge retrieval results
        #[arg(long)]
        expand_queries: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            process_result(&input, &output, report.as_deref())
        }
        Commands::Analyze { input, verbose } => {
            setup_logging(verbose);
            analyze_result(&input)
        }
        Commands::Chat {
            input,
            store,
            chunk_size,
            chunk_overlap,
            top_k,
            min_score,
            expand_queries,
            verbose,
        } => {
            setup_logging(verbose);
            let config = ChatConfig {
                chunking: ChunkConfig {
                    max_chars: chunk_size,
                    overlap_chars: chunk_overlap,
                },
                retriever: RetrieverConfig {
                    k: top_k,
                    min_score,
                    expand_queries,
                    ..Default::default()
                },
                ..Default::default()
            };
            run_chat(&input, store.as_deref(), config).await
        }
        Commands::Ask {
            input,
            question,
            top_k,
            min_score,
            expand_queries,
            verbose,
        } => {
            setup_logging(verbose);
            let config = ChatConfig {
                retriever: RetrieverConfig {
                    k: top_k,
                    min_score,
                    expand_queries,
                    ..Default::default()
                },
                ..Default::default()
            };
            run_ask(&input, &question, config).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn process_result(input: &Path, output: &Path, report: Option<&Path>) -> Result<()> {
    info!("Loading job result from {:?}", input);
    let result = load_result_file(input).context("Failed to load job result")?;
    let transcript = normalize(&result).context("Failed to normalize job result")?;

    info!(
        "Normalized {} speakers, {} entities, {} sentiment segments",
        transcript.speaker_order.len(),
        transcript.entities.len(),
        transcript.sentiment_segments.len()
    );

    write_normalized(output, &transcript)?;
    info!("Normalized transcript written to {:?}", output);

    if let Some(report_path) = report {
        write_report(report_path, &transcript)?;
        info!("Report written to {:?}", report_path);
    }

    Ok(())
}

fn analyze_result(input: &Path) -> Result<()> {
    let result = load_result_file(input).context("Failed to load job result")?;
    let transcript = normalize(&result).context("Failed to normalize job result")?;
    print!("{}", render_report(&transcript));
    Ok(())
}

async fn build_session(input: &Path, config: ChatConfig) -> Result<ChatSession> {
    info!("Loading job result from {:?}", input);
    let result = load_result_file(input).context("Failed to load job result")?;
    let transcript = normalize(&result).context("Failed to normalize job result")?;

    let document_id = result.id.clone().unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transcript".to_string())
    });

    let api_config = OpenAiConfig::from_env()?;
    let client = Arc::new(OpenAiClient::new(api_config)?);
    let embedder: Arc<dyn Embedder> = client.clone();
    let generator: Arc<dyn Generator> = client;

    info!("Building retrieval index for document {}", document_id);
    let session =
        ChatSession::initialize(&document_id, &transcript, embedder, generator, config).await?;
    info!("Index ready ({} chunks)", session.index().len());

    Ok(session)
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.text);
    if !answer.sources.is_empty() {
        println!("Sources:");
        for source in &answer.sources {
            println!("  [{:.2}] {}", source.score, source.chunk.label());
        }
        println!();
    }
}

async fn run_chat(input: &Path, store: Option<&Path>, config: ChatConfig) -> Result<()> {
    let mut session = build_session(input, config).await?;

    if let Some(dir) = store {
        session.save_index(dir).context("Failed to persist index")?;
    }

    println!("Ask questions about the transcript (empty line to exit).");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        match session.ask(question).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    info!(
        "Session {} ended after {} turns",
        session.conversation().session_id,
        session.conversation().len()
    );
    Ok(())
}

async fn run_ask(input: &Path, question: &str, config: ChatConfig) -> Result<()> {
    let mut session = build_session(input, config).await?;
    let answer = session.ask(question).await?;
    print_answer(&answer);
    Ok(())
}
