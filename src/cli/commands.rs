use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codemate")]
#[command(author, version, about = "Editor-style AI assistant for chat, code review, and plots", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single chat message
    Chat {
        prompt: String,

        /// Active document the conversation is about
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Start an interactive session with history and code review
    Interactive {
        /// Active document for /code, /accept and /discard
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Storage directory for conversation history (default: "./sessions")
        #[arg(long, default_value = "./sessions")]
        storage_dir: String,
    },

    /// Generate code for a document and review the diff
    Generate {
        request: String,

        /// Document the generated code targets
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Write the generated code to the document without a review prompt
        #[arg(short, long)]
        apply: bool,
    },

    /// Generate Chart.js-compatible JSON from a description
    Plot {
        description: String,
    },
}
