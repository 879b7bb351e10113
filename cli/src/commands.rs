//! Slash command parsing and handling

use crate::Session;
use crate::render;
use std::io::{self, Write};
use std::path::PathBuf;
use tutor_core::{Attachment, AuthCredential, DictationEvent, NewThreadOutcome, ToolResult};

pub enum Command {
    Quit,
    Help,
    New,
    Send,
    Image(PathBuf),
    ClearImage,
    Draw(PathBuf),
    Calc(String),
    Suggestion(usize),
    Voice,
    Login(String),
    Logout,
    Progress,
}

pub enum CommandResult {
    Continue,
    Exit,
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, String> {
        let Some(body) = input.strip_prefix('/') else {
            return Err("Not a command".to_string());
        };

        let (name, rest) = body.split_once(' ').unwrap_or((body, ""));
        let rest = rest.trim();
        let require = |usage: &str| {
            if rest.is_empty() {
                Err(format!("Usage: {}", usage))
            } else {
                Ok(rest.to_string())
            }
        };

        match name {
            "quit" | "exit" => Ok(Command::Quit),
            "help" => Ok(Command::Help),
            "new" => Ok(Command::New),
            "send" => Ok(Command::Send),
            "image" => require("/image <path>").map(|p| Command::Image(PathBuf::from(p))),
            "noimage" => Ok(Command::ClearImage),
            "draw" => require("/draw <png path>").map(|p| Command::Draw(PathBuf::from(p))),
            "calc" => require("/calc <result>").map(Command::Calc),
            "s" | "suggest" => {
                let n: usize = require("/s <number>")?
                    .parse()
                    .map_err(|_| "Suggestion number must be a positive integer".to_string())?;
                if n == 0 {
                    return Err("Suggestions are numbered from 1".to_string());
                }
                Ok(Command::Suggestion(n - 1))
            }
            "voice" => Ok(Command::Voice),
            "login" => require("/login <token>").map(Command::Login),
            "logout" => Ok(Command::Logout),
            "progress" => Ok(Command::Progress),
            "" => Err("Empty command".to_string()),
            other => Err(format!(
                "Unknown command: /{}. Type /help for available commands.",
                other
            )),
        }
    }

    pub async fn execute<I>(self, session: &mut Session, lines: &mut I) -> CommandResult
    where
        I: Iterator<Item = io::Result<String>>,
    {
        match self {
            Command::Quit => {
                println!("Goodbye!");
                return CommandResult::Exit;
            }
            Command::Help => print_help(),
            Command::New => {
                let outcome = session.controller.start_new_thread(|| {
                    confirm(
                        "Start a new conversation? Your current conversation will be cleared. [y/N] ",
                        lines,
                    )
                });
                match outcome {
                    NewThreadOutcome::Reset => render::conversation(&session.controller),
                    NewThreadOutcome::Cancelled => println!("Keeping the current conversation."),
                }
            }
            Command::Send => {
                let result = session
                    .controller
                    .submit_draft(session.credential.as_ref())
                    .await;
                render::turn(&session.controller, result);
            }
            Command::Image(path) => match Attachment::read(&path) {
                Ok(attachment) => {
                    let handle = session.controller.select_image(attachment);
                    println!(
                        "Image ready ({}). Type your question, or /send to send it alone.",
                        handle
                    );
                }
                Err(e) => println!("{}", e),
            },
            Command::ClearImage => {
                session.controller.clear_selected_image();
                println!("Image removed.");
            }
            Command::Draw(path) => {
                let canvas = match image::open(&path) {
                    Ok(canvas) => canvas.to_rgba8(),
                    Err(e) => {
                        println!("Could not open drawing {}: {}", path.display(), e);
                        return CommandResult::Continue;
                    }
                };
                match ToolResult::from_canvas(&canvas) {
                    Ok(drawing) => {
                        let result = session
                            .controller
                            .submit_tool_result(session.credential.as_ref(), drawing)
                            .await;
                        render::turn(&session.controller, result);
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Command::Calc(value) => {
                let result = session
                    .controller
                    .submit_tool_result(session.credential.as_ref(), ToolResult::Calculation(value))
                    .await;
                render::turn(&session.controller, result);
            }
            Command::Suggestion(index) => {
                let result = session
                    .controller
                    .choose_suggestion(session.credential.as_ref(), index)
                    .await;
                render::turn(&session.controller, result);
            }
            Command::Voice => dictate(session, lines).await,
            Command::Login(token) => match AuthCredential::new(token) {
                Some(credential) => {
                    if let Some(store) = &session.token_store
                        && let Err(e) = store.save(&credential)
                    {
                        tracing::warn!("Could not persist session token: {:#}", e);
                        println!("Signed in for this session only ({}).", e);
                    } else {
                        println!("Signed in.");
                    }
                    session.credential = Some(credential);
                }
                None => println!("Usage: /login <token>"),
            },
            Command::Logout => {
                session.credential = None;
                if let Some(store) = &session.token_store
                    && let Err(e) = store.clear()
                {
                    println!("Signed out, but the saved token could not be removed: {:#}", e);
                } else {
                    println!("Signed out.");
                }
            }
            Command::Progress => render::progress(session.controller.progress()),
        }
        println!();
        CommandResult::Continue
    }
}

/// Lines typed after `/voice` stand in for the recognizer's live transcript;
/// an empty line is the end-of-listening signal.
async fn dictate<I>(session: &mut Session, lines: &mut I)
where
    I: Iterator<Item = io::Result<String>>,
{
    let credential = session.credential.as_ref();
    session
        .controller
        .handle_dictation(credential, DictationEvent::ListeningStarted)
        .await;
    println!("🎤 Listening... speak (type), then press Enter on an empty line to finish.");

    let mut heard = String::new();
    loop {
        print!("🎤 ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if !heard.is_empty() {
            heard.push(' ');
        }
        heard.push_str(line);
        session
            .controller
            .handle_dictation(credential, DictationEvent::Transcript(heard.clone()))
            .await;
    }

    match session
        .controller
        .handle_dictation(credential, DictationEvent::ListeningEnded)
        .await
    {
        Some(result) => render::turn(&session.controller, result),
        None => println!("I didn't catch anything."),
    }
}

fn confirm<I>(prompt: &str, lines: &mut I) -> bool
where
    I: Iterator<Item = io::Result<String>>,
{
    print!("{}", prompt);
    let _ = io::stdout().flush();
    matches!(
        lines.next(),
        Some(Ok(answer)) if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    )
}

fn print_help() {
    println!("Available commands:");
    println!("  <text>                 - Ask Math Buddy (sends the selected image too)");
    println!("  /send                  - Send the selected image without a question");
    println!("  /image <path>          - Attach an image of a math problem");
    println!("  /noimage               - Remove the attached image");
    println!("  /draw <png path>       - Send a drawing");
    println!("  /calc <result>         - Ask Math Buddy to check a calculator result");
    println!("  /s <number>            - Pick a follow-up suggestion");
    println!("  /voice                 - Dictate a question");
    println!("  /progress              - Show your progress");
    println!("  /new                   - Start a new conversation");
    println!("  /login <token>         - Sign in with a bearer token");
    println!("  /logout                - Sign out");
    println!("  /help                  - Show this help message");
    println!("  /quit, Ctrl+D          - Exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        assert!(matches!(Command::parse("/calc 42"), Ok(Command::Calc(v)) if v == "42"));
        assert!(matches!(Command::parse("/s 2"), Ok(Command::Suggestion(1))));
        assert!(matches!(
            Command::parse("/image  ./homework.png"),
            Ok(Command::Image(p)) if p == PathBuf::from("./homework.png")
        ));
        assert!(matches!(Command::parse("/quit"), Ok(Command::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("/calc").err(), Some("Usage: /calc <result>".to_string()));
        assert!(Command::parse("/s 0").is_err());
        assert!(Command::parse("/s two").is_err());
        assert!(Command::parse("/bogus").is_err());
        assert!(Command::parse("hello").is_err());
    }
}
