use clap::Parser;
use clap_derive::Parser;
use config::{ClientEnv, ClientSettings, load_env_file};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tutor_core::backend::DEFAULT_TIMEOUT;
use tutor_core::{AuthCredential, ContextWindow, HttpChatBackend, TokenStore, TurnController};

mod commands;
mod logging;
mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with Math Buddy from the terminal", long_about = None)]
struct Args {
    /// Backend base URL; overrides settings.toml and MATH_BUDDY_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Seconds to wait for an answer before giving up
    #[arg(long)]
    timeout: Option<u64>,

    /// Forward the last N messages with each question
    #[arg(long, conflicts_with = "context_inputs")]
    context_messages: Option<usize>,

    /// Forward only the last N questions with each question
    #[arg(long)]
    context_inputs: Option<usize>,

    /// Bearer token for this run; not saved
    #[arg(long)]
    token: Option<String>,
}

pub struct Session {
    pub controller: TurnController<HttpChatBackend>,
    pub credential: Option<AuthCredential>,
    pub token_store: Option<TokenStore>,
}

fn context_window(args: &Args, settings: &ClientSettings) -> ContextWindow {
    match (args.context_messages, args.context_inputs) {
        (Some(n), _) => ContextWindow::LastMessages(n),
        (None, Some(n)) => ContextWindow::LastUserInputs(n),
        (None, None) => settings
            .context_window
            .map(ContextWindow::from)
            .unwrap_or_default(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file();
    let args = Args::parse();
    let _log_guard = logging::init_logging();

    let env = ClientEnv::from_env();
    let settings = ClientSettings::load();
    let api_url = args
        .api_url
        .clone()
        .or_else(|| settings.api_url.clone())
        .unwrap_or_else(|| env.api_url.clone());
    let timeout = args
        .timeout
        .or(settings.request_timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);
    let window = context_window(&args, &settings);

    let backend = HttpChatBackend::new(&api_url, timeout)?;
    let token_store = TokenStore::default_location();
    let credential = args
        .token
        .clone()
        .and_then(AuthCredential::new)
        .or_else(|| token_store.as_ref().and_then(TokenStore::load));
    tracing::info!(
        api_url = %api_url,
        ?window,
        signed_in = credential.is_some(),
        google_client_id = env.google_client_id.is_some(),
        "Starting Math Buddy client"
    );

    let mut session = Session {
        controller: TurnController::new(backend, window),
        credential,
        token_store,
    };

    println!();
    render::conversation(&session.controller);
    if session.credential.is_none() {
        println!("You are not signed in. Use /login <token> to start chatting.");
    }
    println!("Type /help for commands, Ctrl+D or /quit to exit.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        render::status_bar(&session.controller, session.credential.is_some());
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
            None => {
                println!();
                println!("Goodbye!");
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match commands::Command::parse(input) {
                Ok(cmd) => match cmd.execute(&mut session, &mut lines).await {
                    commands::CommandResult::Exit => break,
                    commands::CommandResult::Continue => continue,
                },
                Err(err) => {
                    println!("{}", err);
                    println!();
                    continue;
                }
            }
        }

        session.controller.set_draft(input);
        let result = session
            .controller
            .submit_draft(session.credential.as_ref())
            .await;
        render::turn(&session.controller, result);
        println!();
    }

    let progress = session.controller.progress();
    println!(
        "You answered {} of {} questions this time. Keep it up!",
        progress.correct_answers, progress.total_questions
    );
    Ok(())
}
