//! Parlor - unified CLI.
//!
//! Runs the HTTP session server, or a terminal client that converges on
//! a session's state by polling with adaptive backoff.

use anyhow::Result;
use clap::Parser;
use parlor::cli::{Cli, Command};
use parlor::{Backoff, GameClient, GameKind, ServerConfig, SessionStore, StateSnapshot};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port, config } => run_server(host, port, config).await,
        Command::Watch { url, code } => run_watch(url, code).await,
        Command::Play { url, code, player } => run_play(url, code, player).await,
    }
}

/// Run the HTTP game server.
async fn run_server(host: String, port: u16, config_path: Option<PathBuf>) -> Result<()> {
    let config = ServerConfig::load(config_path.as_deref())?;
    info!(
        code_length = config.code_length(),
        max_message_len = config.max_message_len(),
        "Starting parlor server"
    );

    let store = SessionStore::new(config);
    let sweeper = store.spawn_sweeper();

    let result = parlor::serve(&host, port, store).await;
    sweeper.abort();
    result
}

/// Watch a session read-only until it ends.
async fn run_watch(url: String, code: String) -> Result<()> {
    let config = ServerConfig::load(None)?;
    let client = GameClient::new(url);
    let backoff = Backoff::new(config.poll_floor(), config.poll_ceiling());

    info!(code = %code, "Watching session");
    let last = client
        .watch(&code, backoff, |snapshot| print_snapshot(snapshot))
        .await?;
    print_outcome(&last);
    Ok(())
}

/// Join a session and play it interactively from the terminal.
///
/// Line commands: `move <cell>`, `say <text>`, `quit`. Between
/// commands the loop polls the server on the backoff schedule; a
/// successful command of our own forces an immediate refresh instead of
/// waiting for the next tick.
async fn run_play(url: String, code: Option<String>, player: String) -> Result<()> {
    let config = ServerConfig::load(None)?;
    let client = GameClient::new(url);

    let code = match code {
        Some(code) => code,
        None => {
            let code = client.create_game(GameKind::TicTacToe).await?;
            println!("Created game {} - share this code with your opponent", code);
            code
        }
    };

    let index = client.join_game(&code, &player).await?;
    println!("Joined {} as player {} ({})", code, index, mark_label(index));

    let mut backoff = Backoff::new(config.poll_floor(), config.poll_ceiling());
    let mut last: Option<StateSnapshot> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Some(PlayCommand::Move(cell)) => {
                        match client.move_and_refresh(&code, &player, cell, &mut backoff).await {
                            Ok(snapshot) => {
                                print_snapshot(&snapshot);
                                if snapshot.game_over {
                                    print_outcome(&snapshot);
                                    break;
                                }
                                last = Some(snapshot);
                            }
                            Err(e) => println!("rejected: {}", e),
                        }
                    }
                    Some(PlayCommand::Say(text)) => {
                        match client.say_and_refresh(&code, &player, &text, &mut backoff).await {
                            Ok(messages) => {
                                for msg in messages.iter().rev().take(5).rev() {
                                    println!("[{}] {}: {}", msg.timestamp, msg.player, msg.message);
                                }
                            }
                            Err(e) => println!("rejected: {}", e),
                        }
                    }
                    Some(PlayCommand::Quit) => break,
                    None => println!("commands: move <cell>, say <text>, quit"),
                }
            }
            _ = tokio::time::sleep(backoff.current()) => {
                match client.game_state(&code).await {
                    Ok(snapshot) => {
                        let changed = last.as_ref() != Some(&snapshot);
                        if changed {
                            print_snapshot(&snapshot);
                        }
                        if snapshot.game_over {
                            print_outcome(&snapshot);
                            break;
                        }
                        backoff.observe(changed);
                        last = Some(snapshot);
                    }
                    Err(e) => {
                        warn!(error = %e, "Poll failed");
                        backoff.advance();
                    }
                }
            }
        }
    }

    Ok(())
}

/// One parsed line of play-mode input.
enum PlayCommand {
    Move(usize),
    Say(String),
    Quit,
}

fn parse_command(line: &str) -> Option<PlayCommand> {
    let line = line.trim();
    if line == "quit" {
        return Some(PlayCommand::Quit);
    }
    if let Some(rest) = line.strip_prefix("move ") {
        return rest.trim().parse().ok().map(PlayCommand::Move);
    }
    if let Some(rest) = line.strip_prefix("say ") {
        return Some(PlayCommand::Say(rest.to_string()));
    }
    None
}

fn mark_label(index: usize) -> &'static str {
    if index == 0 { "X" } else { "O" }
}

fn print_snapshot(snapshot: &StateSnapshot) {
    println!();
    println!("{}", snapshot.display_board());
    if !snapshot.game_over {
        match snapshot.players.get(snapshot.turn) {
            Some(name) => println!("turn: {} ({})", name, mark_label(snapshot.turn)),
            None => println!("waiting for players ({} joined)", snapshot.players.len()),
        }
    }
}

fn print_outcome(snapshot: &StateSnapshot) {
    use parlor::Winner;
    match snapshot.winner {
        Some(Winner::Tie) => println!("Game over: tie"),
        Some(winner) => println!(
            "Game over: {:?} wins (line {:?})",
            winner, snapshot.winning_line
        ),
        None => println!("Game over"),
    }
}
