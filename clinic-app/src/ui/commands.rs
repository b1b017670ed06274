use clinic_core::{FallingItem, SHOP_ITEMS, find_item};
use clinic_types::{GameState, GameStatus, GameView, PlayerAction};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Action(PlayerAction),
    Refresh,
    Help,
    Quit,
}

/// Turns one line of input into a command for the current screen.
pub fn parse_command(
    input: &str,
    state: &GameState,
    falling: &[FallingItem],
) -> Result<Command, String> {
    let mut words = input.split_whitespace();
    let Some(verb) = words.next().map(str::to_lowercase) else {
        return Ok(Command::Refresh);
    };
    let args: Vec<&str> = words.collect();

    match verb.as_str() {
        "quit" | "exit" => return Ok(Command::Quit),
        "help" | "?" => return Ok(Command::Help),
        "refresh" | "r" => return Ok(Command::Refresh),
        _ => {}
    }

    let action = if state.user.is_none() {
        parse_auth(&verb, &args)?
    } else if state.loading {
        parse_loading(&verb, &args, falling)?
    } else if state.view == GameView::Shop {
        parse_shop(&verb, &args)?
    } else {
        parse_clinic(&verb, state)?
    };
    Ok(Command::Action(action))
}

fn credentials(args: &[&str]) -> Result<(String, String), String> {
    match args {
        [username, password] => Ok((username.to_string(), password.to_string())),
        _ => Err("Usage: login|signup <username> <password>".to_string()),
    }
}

fn parse_auth(verb: &str, args: &[&str]) -> Result<PlayerAction, String> {
    match verb {
        "login" => {
            let (username, password) = credentials(args)?;
            Ok(PlayerAction::Login { username, password })
        }
        "signup" => {
            let (username, password) = credentials(args)?;
            Ok(PlayerAction::Signup { username, password })
        }
        "guest" => Ok(PlayerAction::PlayAsGuest),
        _ => Err("Try: login, signup or guest".to_string()),
    }
}

fn parse_loading(verb: &str, args: &[&str], falling: &[FallingItem]) -> Result<PlayerAction, String> {
    match verb {
        "catch" | "c" => {
            let item_id = match args.first() {
                Some(raw) => raw.parse().map_err(|_| format!("'{}' is not an item number", raw))?,
                None => falling
                    .iter()
                    .find(|item| !item.caught)
                    .map(|item| item.id)
                    .ok_or("Nothing to catch yet!")?,
            };
            Ok(PlayerAction::CatchItem { item_id })
        }
        "logout" => Ok(PlayerAction::Logout),
        _ => Err("The pager is buzzing... try 'catch'".to_string()),
    }
}

fn parse_shop(verb: &str, args: &[&str]) -> Result<PlayerAction, String> {
    match verb {
        "buy" => {
            let raw = args.first().ok_or("Usage: buy <number|item id>")?;
            let item = match raw.parse::<usize>() {
                Ok(n) if n >= 1 => SHOP_ITEMS.get(n - 1),
                Ok(_) => None,
                Err(_) => find_item(raw),
            }
            .ok_or_else(|| format!("No item '{}' in the shop", raw))?;
            Ok(PlayerAction::BuyItem {
                item_id: item.id.to_string(),
            })
        }
        "back" | "clinic" => Ok(PlayerAction::OpenClinic),
        "logout" => Ok(PlayerAction::Logout),
        _ => Err("Try: buy <number> or back".to_string()),
    }
}

fn parse_clinic(verb: &str, state: &GameState) -> Result<PlayerAction, String> {
    if let Ok(n) = verb.parse::<usize>() {
        let stage = state.current_stage().ok_or("No patient is waiting")?;
        let choice = n
            .checked_sub(1)
            .and_then(|index| stage.choices.get(index))
            .ok_or_else(|| format!("Pick a number from 1 to {}", stage.choices.len()))?;
        return Ok(PlayerAction::Choose {
            choice_id: choice.id.clone(),
        });
    }

    match verb {
        "next" | "n" => match state.game_status {
            GameStatus::StageSuccess => Ok(PlayerAction::NextStage),
            _ => Ok(PlayerAction::NextCase),
        },
        "retry" => Ok(PlayerAction::NextCase),
        "learn" | "explain" => Ok(PlayerAction::LearnMore),
        "hint" => Ok(PlayerAction::UseHint),
        "shop" => Ok(PlayerAction::OpenShop),
        "logout" => Ok(PlayerAction::Logout),
        _ => Err("Unknown command. Type 'help' for a list.".to_string()),
    }
}
