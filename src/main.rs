use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod agent;
mod config;
mod llm;
mod services;

use agent::ChatAgent;
use config::Config;
use llm::{AzureOpenAiChat, StreamCallback, StreamEvent, ToolCallPhase};
use services::{IndexingClient, TranscriptClient};

#[derive(Parser)]
#[command(name = "vidchat")]
#[command(author, version, about = "Ask questions about indexed videos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question about a video
    Ask {
        /// The question to ask
        question: String,

        /// Video identifier (the indexed video name)
        #[arg(short = 'i', long)]
        video: String,
    },

    /// Interactive chat about a video
    Chat {
        /// Video identifier (the indexed video name)
        #[arg(short = 'i', long)]
        video: String,
    },

    /// Trigger transcript indexing for an uploaded video
    Index {
        /// Video name in the processing backend
        video_name: String,
    },

    /// Remove a video's documents from the search index
    Remove {
        /// Video name in the processing backend
        video_name: String,
    },

    /// Write a default config file to edit
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "vidchat=debug,vidchat_cli=debug"
    } else {
        "vidchat=info,vidchat_cli=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Ask { question, video } => {
            let mut agent = build_agent(&config)?;
            agent.ask(&question, &video, &render_callback()).await?;
            println!();
        }
        Commands::Chat { video } => {
            let mut agent = build_agent(&config)?;
            run_chat_loop(&mut agent, &video).await?;
        }
        Commands::Index { video_name } => {
            let indexer = build_indexer(&config)?;
            let status = indexer.index(&video_name).await?;
            println!("{} {}", "ok:".green(), status);
        }
        Commands::Remove { video_name } => {
            let indexer = build_indexer(&config)?;
            let status = indexer.delete(&video_name).await?;
            println!("{} {}", "ok:".green(), status);
        }
        Commands::Init => {
            Config::default().save()?;
            println!("Wrote {}", Config::config_path()?.display());
        }
    }

    Ok(())
}

fn build_agent(config: &Config) -> Result<ChatAgent> {
    if config.openai.endpoint.is_empty() || config.openai.api_key.is_empty() {
        bail!(
            "Azure OpenAI endpoint/api key not configured. Run `vidchat init` and edit the \
             config, or set AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY."
        );
    }

    let transcript = Arc::new(TranscriptClient::new(config.transcript.endpoint.clone()));
    let llm = AzureOpenAiChat::new(config.openai.clone(), transcript);
    Ok(ChatAgent::new(llm, config.chat.system_prompt.clone()))
}

fn build_indexer(config: &Config) -> Result<IndexingClient> {
    if config.indexer.index_endpoint.is_empty() || config.indexer.delete_endpoint.is_empty() {
        bail!("Indexer endpoints not configured. Run `vidchat init` and edit the config.");
    }
    Ok(IndexingClient::new(
        config.indexer.index_endpoint.clone(),
        config.indexer.delete_endpoint.clone(),
    ))
}

async fn run_chat_loop(agent: &mut ChatAgent, video: &str) -> Result<()> {
    println!(
        "Chatting about {}. Type a question, or {} to quit.",
        video.bold(),
        "exit".bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        agent.ask(question, video, &render_callback()).await?;
        println!();
    }

    Ok(())
}

/// Streams answer text to stdout and tool-call status to stderr
fn render_callback() -> StreamCallback {
    let announced = AtomicBool::new(false);
    Box::new(move |event| match event {
        StreamEvent::Text { content } => {
            print!("{content}");
            let _ = std::io::stdout().flush();
        }
        StreamEvent::ToolCall {
            phase: ToolCallPhase::Start,
            name,
            ..
        } => {
            // The model streams many argument fragments; announce once.
            if !name.is_empty() && !announced.swap(true, Ordering::Relaxed) {
                eprintln!("{} {}", "[tool]".cyan(), name.dimmed());
            }
        }
        StreamEvent::ToolCall {
            phase: ToolCallPhase::End,
            args,
            ..
        } => {
            let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
            eprintln!(
                "{} {}",
                "[tool]".cyan(),
                format!("searching transcript for \"{query}\"").dimmed()
            );
            announced.store(false, Ordering::Relaxed);
        }
    })
}
