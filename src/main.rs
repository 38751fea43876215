use anyhow::Result;
use clap::Parser;
use codemate::cli::{Cli, Commands, FileDocument};
use codemate::config::Settings;
use codemate::core::Role;
use codemate::engine::{Command, DocumentHost, Engine, EngineState};
use codemate::provider::create_provider;
use codemate::storage::{FileStore, HistoryStore, MemoryStore};
use codemate::utils;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    init_tracing(&settings);

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { prompt, file } => handle_chat(settings, prompt, file).await,
        Commands::Interactive { file, storage_dir } => {
            handle_interactive(settings, file, storage_dir).await
        }
        Commands::Generate {
            request,
            file,
            apply,
        } => handle_generate(settings, request, file, apply).await,
        Commands::Plot { description } => handle_plot(settings, description).await,
    }
}

fn init_tracing(settings: &Settings) {
    // RUST_LOG wins over the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn build_engine(
    settings: Settings,
    document: Arc<dyn DocumentHost>,
    storage_dir: Option<String>,
) -> Result<Engine> {
    let provider = create_provider(&settings)?;
    let storage: Arc<dyn HistoryStore> = match storage_dir {
        Some(dir) => Arc::new(FileStore::new(PathBuf::from(dir)).await?),
        None => Arc::new(MemoryStore::new()),
    };

    Ok(Engine::new(settings, provider, document, storage).await)
}

fn last_reply(state: &EngineState) -> Option<&str> {
    state
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.content.as_str())
}

async fn handle_chat(settings: Settings, prompt: String, file: Option<PathBuf>) -> Result<()> {
    let context_lines = settings.conversation.context_lines;
    let document = Arc::new(FileDocument::new(file));

    // Attach the head of the document so the model sees the code in question
    let code_context = {
        let text = document.content().await?;
        if text.trim().is_empty() {
            None
        } else {
            let head: Vec<&str> = text.lines().take(context_lines).collect();
            Some(head.join("\n"))
        }
    };

    let engine = build_engine(settings, document, None).await?;

    utils::print_info("Sending request...");
    let state = engine
        .dispatch(Command::Send {
            text: prompt,
            code_context,
        })
        .await;

    if let Some(notice) = state.notice {
        anyhow::bail!(notice);
    }

    if let Some(reply) = last_reply(&state) {
        println!("\n{}", reply);
    }
    Ok(())
}

async fn handle_generate(
    settings: Settings,
    request: String,
    file: Option<PathBuf>,
    apply: bool,
) -> Result<()> {
    let show_unchanged = settings.review.show_unchanged;
    let document = Arc::new(FileDocument::new(file.clone()));
    let engine = build_engine(settings, document, None).await?;

    utils::print_info("Generating code...");
    let state = engine.dispatch(Command::InsertCode { text: request }).await;

    if let Some(notice) = state.notice {
        anyhow::bail!(notice);
    }

    if let Some(candidate) = &state.candidate {
        utils::print_header("Proposed change");
        utils::print_diff(&candidate.diff, show_unchanged);
        utils::print_diff_summary(&candidate.diff);
    }

    if apply {
        let state = engine.dispatch(Command::Accept).await;
        if let Some(notice) = state.notice {
            anyhow::bail!(notice);
        }
        match file {
            Some(path) => utils::print_success(&format!("Wrote {:?}", path)),
            None => utils::print_success("Change applied"),
        }
    } else {
        utils::print_info("Re-run with --apply to write the change");
    }
    Ok(())
}

async fn handle_plot(settings: Settings, description: String) -> Result<()> {
    let engine = build_engine(settings, Arc::new(FileDocument::new(None)), None).await?;

    utils::print_info("Generating chart...");
    let state = engine.dispatch(Command::Plot { description }).await;

    if let Some(notice) = state.notice {
        anyhow::bail!(notice);
    }

    if let Some(payload) = last_reply(&state) {
        println!("{}", payload);
    }
    Ok(())
}

async fn handle_interactive(
    settings: Settings,
    file: Option<PathBuf>,
    storage_dir: String,
) -> Result<()> {
    let show_unchanged = settings.review.show_unchanged;
    let completion = if settings.completion.inline_enabled {
        "enabled"
    } else {
        "disabled"
    };

    utils::print_header("Codemate Interactive");
    utils::print_info(&format!(
        "Provider: {} ({})",
        settings.provider.name, settings.provider.model
    ));
    match &file {
        Some(path) => utils::print_info(&format!("Document: {:?}", path)),
        None => utils::print_info("Document: none (pass --file to enable /code)"),
    }
    utils::print_info(&format!("Storage: {}", storage_dir));
    utils::print_info(&format!("Inline completion: {}", completion));
    utils::print_info("Type a message, or /help for commands\n");

    let document = Arc::new(FileDocument::new(file));
    let engine = build_engine(settings, document, Some(storage_dir)).await?;

    let resumed = engine.current_state().await.messages.len();
    if resumed > 0 {
        utils::print_success(&format!("Resumed session with {} previous messages", resumed));
    } else {
        utils::print_success("New session created");
    }

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        utils::print_prompt("You: ");
        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let (head, rest) = match input.split_once(' ') {
            Some((head, rest)) => (head, rest.trim()),
            None => (input, ""),
        };

        match head {
            "/quit" | "/exit" => break,

            "/help" => {
                println!("Commands:");
                println!("  /code <request>  - Generate code for the document and review the diff");
                println!("  /plot <text>     - Generate Chart.js JSON from a description");
                println!("  /accept          - Apply the pending proposal");
                println!("  /discard         - Drop the pending proposal");
                println!("  /diff            - Show the pending diff again");
                println!("  /clear           - Clear conversation history");
                println!("  /count           - Show message count");
                println!("  /quit            - Exit\n");
            }

            "/clear" => {
                let state = engine.dispatch(Command::Clear).await;
                match state.notice {
                    Some(notice) => utils::print_error(&notice),
                    None => utils::print_success("Conversation cleared"),
                }
                println!();
            }

            "/count" => {
                let count = engine.current_state().await.messages.len();
                utils::print_info(&format!("Messages in session: {}\n", count));
            }

            "/diff" => {
                let state = engine.current_state().await;
                match &state.candidate {
                    Some(candidate) => {
                        utils::print_diff(&candidate.diff, show_unchanged);
                        utils::print_diff_summary(&candidate.diff);
                    }
                    None => utils::print_info("No pending proposal"),
                }
                println!();
            }

            "/code" => {
                if rest.is_empty() {
                    utils::print_error("Usage: /code <request>");
                    continue;
                }

                utils::print_info("Generating code...");
                let state = engine
                    .dispatch(Command::InsertCode {
                        text: rest.to_string(),
                    })
                    .await;

                match (&state.notice, &state.candidate) {
                    (Some(notice), _) => utils::print_error(notice),
                    (None, Some(candidate)) => {
                        utils::print_diff(&candidate.diff, show_unchanged);
                        utils::print_diff_summary(&candidate.diff);
                        utils::print_info("Apply with /accept, reject with /discard");
                    }
                    (None, None) => utils::print_error("No proposal was produced"),
                }
                println!();
            }

            "/plot" => {
                if rest.is_empty() {
                    utils::print_error("Usage: /plot <description>");
                    continue;
                }

                utils::print_info("Generating chart...");
                let state = engine
                    .dispatch(Command::Plot {
                        description: rest.to_string(),
                    })
                    .await;

                match state.notice {
                    Some(notice) => utils::print_error(&notice),
                    None => {
                        if let Some(payload) = last_reply(&state) {
                            println!("{}", payload);
                        }
                    }
                }
                println!();
            }

            "/accept" => {
                let state = engine.dispatch(Command::Accept).await;
                match state.notice {
                    Some(notice) => utils::print_error(&notice),
                    None => utils::print_success("Change applied to the document"),
                }
                println!();
            }

            "/discard" => {
                let state = engine.dispatch(Command::Discard).await;
                match state.notice {
                    Some(notice) => utils::print_error(&notice),
                    None => utils::print_success("Proposal discarded"),
                }
                println!();
            }

            _ if input.starts_with('/') => {
                utils::print_error(&format!("Unknown command: {} (try /help)", head));
            }

            _ => {
                utils::print_info("Assistant: ");
                let state = engine
                    .dispatch(Command::Send {
                        text: input.to_string(),
                        code_context: None,
                    })
                    .await;

                match state.notice {
                    Some(notice) => utils::print_error(&notice),
                    None => {
                        if let Some(reply) = last_reply(&state) {
                            println!("{}\n", reply);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
