//! Line-oriented terminal front-end. Screens go to stdout, logs to stderr.

mod commands;
mod screens;

pub use commands::{Command, parse_command};
pub use screens::{render_auth, render_clinic, render_loading, render_shop};

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::controller::GameController;
use clinic_types::{GameView, PlayerAction};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

const HELP: &str = "\
Commands
  auth:    login <user> <pass> | signup <user> <pass> | guest
  loading: catch <n> | c
  clinic:  <n> to choose | next | learn | hint | shop | logout
  shop:    buy <n> | back
  any:     refresh (or empty line) | help | quit";

/// Renders whichever screen the current state calls for.
pub async fn render(controller: &GameController, message: Option<&str>) -> String {
    let state = controller.state().await;

    let screen = if state.user.is_none() {
        return render_auth(message);
    } else if state.loading {
        render_loading(&state, &controller.falling_items().await)
    } else if state.view == GameView::Shop {
        render_shop(&state)
    } else {
        render_clinic(&state, &controller.leaderboard().await)
    };

    match message {
        Some(message) => format!("{}! {}\n", screen, message),
        None => screen,
    }
}

/// Runs the action in the background and waits until it either finishes or puts
/// the loading screen up, so the mini-game stays playable during a slow load.
async fn dispatch_until_loading(
    controller: &Arc<GameController>,
    action: PlayerAction,
) -> Option<String> {
    let task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.dispatch(action).await })
    };

    loop {
        if task.is_finished() {
            return match task.await {
                Ok(result) => result.err().map(|e| e.to_string()),
                Err(e) => Some(format!("Something went wrong: {}", e)),
            };
        }
        if controller.state().await.loading {
            return None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

pub async fn run(controller: Arc<GameController>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if controller.resume_session().await? {
        info!("Welcome back");
    }
    stdout
        .write_all(render(&controller, None).await.as_bytes())
        .await?;
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let (state, falling) = (controller.state().await, controller.falling_items().await);

        let message = match parse_command(&line, &state, &falling) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => Some(HELP.to_string()),
            Ok(Command::Refresh) => None,
            Ok(Command::Action(action)) => dispatch_until_loading(&controller, action).await,
            Err(hint) => Some(hint),
        };

        let screen = render(&controller, message.as_deref()).await;
        stdout.write_all(screen.as_bytes()).await?;
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    controller.shutdown();
    Ok(())
}
