//! Chatboard - Entry Point
//!
//! Interactive chat on stdin. Board commands run locally; everything else
//! goes to the chat model.

use chatboard::{
    AirtableClient, ArceeClient, ChatLoop, Config, ConversationStore, Session, TrelloClient,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const EXIT_WORDS: [&str; 3] = ["sair", "exit", "quit"];
const CLEAR_WORDS: [&str; 2] = ["limpar", "clear"];
const HISTORY_WORDS: [&str; 2] = ["historico", "history"];

fn print_help() {
    println!("Chatboard v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: chatboard [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --session <ID>     Resume a stored conversation");
    println!("  --json-logs        Log to stderr as JSON");
    println!("  --help, -h         Show this help");
    println!();
    println!("In the chat: 'sair' to quit, 'limpar' to clear the history,");
    println!("'historico' to show the recent conversation.");
    println!();
    println!("Environment variables:");
    println!("  TRELLO_API_KEY, TRELLO_TOKEN    Board service credentials");
    println!("  TRELLO_BOARD_ID                 Default board");
    println!("  AIRTABLE_API_KEY                Task service key");
    println!("  AIRTABLE_BASE_ID                Task service base");
    println!("  AIRTABLE_TABLE_ID               Task service table");
    println!("  ARCEE_API_KEY                   Chat model key");
    println!("  ARCEE_MODEL                     Chat model (default: auto)");
    println!("  CHATBOARD_CACHE_TTL             Cache TTL seconds (default: 300)");
    println!("  CHATBOARD_HTTP_TIMEOUT          Request timeout seconds (default: 30)");
    println!("  CHATBOARD_DB_PATH               History database path");
    println!("  CHATBOARD_HISTORY_LIMIT         Messages sent to the model (default: 20)");
    println!("  RUST_LOG                        Log level (default: warn)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Parse args
    let args: Vec<String> = std::env::args().collect();
    let help_mode = args.iter().any(|a| a == "--help" || a == "-h");
    let json_logs = args.iter().any(|a| a == "--json-logs");
    let session_id = args
        .iter()
        .position(|a| a == "--session")
        .and_then(|i| args.get(i + 1))
        .cloned();

    if help_mode {
        print_help();
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        })
        .unwrap_or(Level::WARN);

    // Logs go to stderr so they never interleave with replies
    if json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let config = Config::from_env()?;

    let boards = TrelloClient::from_config(&config)?;
    let tasks = AirtableClient::from_config(&config)?;
    let model = ArceeClient::from_config(&config)?;
    if !boards.is_available() {
        warn!("TRELLO_API_KEY/TRELLO_TOKEN not set - board commands will fail");
    }
    if !model.is_available() {
        warn!("ARCEE_API_KEY not set - chat model unavailable");
    }

    let session = match session_id {
        Some(id) => Session::with_id(id, Arc::new(boards), Arc::new(tasks), &config),
        None => Session::new(Arc::new(boards), Arc::new(tasks), &config),
    };
    let store = ConversationStore::open(&config.db_path)?;
    let mut chat = ChatLoop::new(session, Box::new(model), store, config.history_limit);

    info!("Chatboard v{} session {}", env!("CARGO_PKG_VERSION"), chat.session().id());
    println!("Chatboard v{} (sessão {})", env!("CARGO_PKG_VERSION"), chat.session().id());
    let summary = chat.store().get_summary(chat.session().id())?;
    if summary.message_count > 0 {
        println!("{} mensagens no histórico desta sessão.", summary.message_count);
    }
    println!("Digite 'sair' para encerrar, 'limpar' para apagar o histórico ou 'historico' para revê-lo.");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let lowered = input.to_lowercase();
        if EXIT_WORDS.contains(&lowered.as_str()) {
            break;
        }
        if CLEAR_WORDS.contains(&lowered.as_str()) {
            match chat.clear() {
                Ok(_) => println!("🧹 Histórico apagado."),
                Err(e) => println!("❌ Erro ao apagar histórico: {}", e),
            }
            continue;
        }

        if HISTORY_WORDS.contains(&lowered.as_str()) {
            match chat.transcript(config.history_limit) {
                Ok(messages) if messages.is_empty() => println!("ℹ️ Histórico vazio."),
                Ok(messages) => {
                    for message in messages {
                        let who = if message.role == "user" { "Você" } else { "Assistente" };
                        println!("{}: {}", who, message.content);
                    }
                }
                Err(e) => println!("❌ Erro ao ler histórico: {}", e),
            }
            continue;
        }

        match chat.turn(input).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => {
                warn!("Turn failed: {}", e);
                println!("❌ {}", e);
            }
        }
    }

    println!("Até logo!");
    Ok(())
}
