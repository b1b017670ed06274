use std::fmt::{self, Write};

use clinic_core::{
    FallingItem, FallingKind, ItemEffect, SHOP_ITEMS, ShopItem, rank_for, rank_progress,
};
use clinic_persistence::LeaderboardEntry;
use clinic_types::{GameState, GameStatus, PatientCase, Profile};
use tracing::warn;

const PROGRESS_WIDTH: usize = 10;

pub fn render_auth(error: Option<&str>) -> String {
    render(|out| write_auth(out, error))
}

pub fn render_loading(state: &GameState, falling: &[FallingItem]) -> String {
    render(|out| write_loading(out, state, falling))
}

pub fn render_shop(state: &GameState) -> String {
    render(|out| write_shop(out, state))
}

pub fn render_clinic(state: &GameState, leaderboard: &[LeaderboardEntry]) -> String {
    render(|out| write_clinic(out, state, leaderboard))
}

fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    if let Err(e) = write(&mut out) {
        warn!("Screen render stopped early: {}", e);
    }
    out
}

fn write_auth(out: &mut impl Write, error: Option<&str>) -> fmt::Result {
    writeln!(out, "=== Kawaii Clinic ===")?;
    writeln!(out, "Please show your ID badge, Doctor.")?;
    writeln!(out)?;
    writeln!(out, "  login <username> <password>")?;
    writeln!(out, "  signup <username> <password>")?;
    writeln!(out, "  guest")?;
    if let Some(error) = error {
        writeln!(out)?;
        writeln!(out, "! {}", error)?;
    }
    Ok(())
}

fn write_loading(out: &mut impl Write, state: &GameState, falling: &[FallingItem]) -> fmt::Result {
    write_header(out, state)?;
    writeln!(out, "Paging the next patient... catch coins while you wait!")?;
    for item in falling.iter().filter(|item| !item.caught) {
        let icon = match item.kind {
            FallingKind::Coin => "coin",
            FallingKind::Pill => "pill",
        };
        writeln!(
            out,
            "  [{}] {} at {:.0}% ({:.1}s fall)",
            item.id, icon, item.x, item.fall_seconds
        )?;
    }
    writeln!(out, "catch <n> | c")
}

fn write_shop(out: &mut impl Write, state: &GameState) -> fmt::Result {
    write_header(out, state)?;
    writeln!(out, "--- Clinic Shop ---")?;
    for (index, item) in SHOP_ITEMS.iter().enumerate() {
        let tag = if state.profile.owns(item.id) {
            "owned".to_string()
        } else {
            format!("{} coins", item.cost)
        };
        writeln!(
            out,
            "  {}) {} [{}] - {} ({})",
            index + 1,
            item.name,
            tag,
            item.description,
            effect_summary(item)
        )?;
    }
    writeln!(out, "buy <n> | back")
}

fn write_clinic(
    out: &mut impl Write,
    state: &GameState,
    leaderboard: &[LeaderboardEntry],
) -> fmt::Result {
    write_header(out, state)?;

    if let Some(level_up) = &state.just_leveled_up {
        writeln!(out, "*** Promoted to {}! ***", level_up.title)?;
    }

    let Some(case) = &state.current_case else {
        return match &state.error {
            Some(error) => {
                writeln!(out, "{}", error)?;
                writeln!(out, "retry | logout")
            }
            None => writeln!(out, "The waiting room is empty."),
        };
    };

    write_chart(out, case)?;

    if let Some(stage) = state.current_stage() {
        writeln!(
            out,
            "Stage {}/{}: \"{}\"",
            state.current_stage_index + 1,
            case.stages.len(),
            stage.dialogue
        )?;
        for (index, choice) in stage.choices.iter().enumerate() {
            let ruled_out = state.removed_choice_id.as_deref() == Some(choice.id.as_str());
            writeln!(
                out,
                "  {}) {}{}",
                index + 1,
                choice.label,
                if ruled_out { " (ruled out)" } else { "" }
            )?;
        }
    }

    if let Some(feedback) = &state.feedback_message {
        let verdict = if state.is_correct == Some(true) {
            "Correct!"
        } else {
            "Not quite..."
        };
        writeln!(out, "{} {}", verdict, feedback)?;
    }

    match state.game_status {
        GameStatus::StageSuccess => writeln!(out, "next: continue to the next stage")?,
        GameStatus::CaseSuccess | GameStatus::Failure => {
            writeln!(out, "Diagnosis: {}", case.diagnosis)?;
            if state.show_explanation {
                writeln!(out, "{}", case.medical_explanation)?;
                for source in &case.trusted_sources {
                    writeln!(out, "  - {}: {}", source.title, source.url)?;
                }
            } else {
                writeln!(out, "learn: read more (stops the auto-advance)")?;
            }
            writeln!(out, "next: see the next patient")?;
        }
        _ => writeln!(out, "<n> choose | hint | shop | logout")?,
    }

    if !leaderboard.is_empty() {
        writeln!(out, "--- Top Doctors ---")?;
        for entry in leaderboard {
            writeln!(
                out,
                "  {}. {} ({} xp)",
                entry.rank, entry.username, entry.profile.xp
            )?;
        }
    }
    Ok(())
}

fn write_header(out: &mut impl Write, state: &GameState) -> fmt::Result {
    let name = state
        .user
        .as_ref()
        .map(|user| user.username.as_str())
        .unwrap_or("Doctor");
    writeln!(
        out,
        "=== Kawaii Clinic === {} | {} | streak {}",
        name,
        profile_summary(&state.profile),
        state.streak
    )
}

fn profile_summary(profile: &Profile) -> String {
    let rank = rank_for(profile.xp);
    let filled = (rank_progress(profile.xp) * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "{} coins | {} xp | {} {} [{}{}]",
        profile.coins,
        profile.xp,
        rank.icon,
        rank.title,
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

fn write_chart(out: &mut impl Write, case: &PatientCase) -> fmt::Result {
    writeln!(
        out,
        "Patient: {}, {} ({}){}",
        case.name,
        case.age,
        case.occupation,
        match case.difficulty {
            clinic_types::Difficulty::Advanced => " [advanced]",
            clinic_types::Difficulty::Beginner => "",
        }
    )?;
    writeln!(out, "Avatar: {}", short_url(&case.avatar_url()))?;
    writeln!(
        out,
        "Vitals: {} | BP {} | HR {}",
        case.vitals.temp, case.vitals.bp, case.vitals.hr
    )?;
    writeln!(out, "Symptoms: {}", case.symptoms.join(", "))?;
    for image in &case.medical_images {
        writeln!(out, "Finding: {} ({})", image.caption, short_url(&image.url))?;
    }
    if let Some(stats) = &case.stats {
        writeln!(
            out,
            "Solved by {:.0}% of doctors ({} attempts)",
            stats.difficulty_rating * 100.0,
            stats.attempts
        )?;
    }
    Ok(())
}

/// Inline images are far too long for a terminal.
fn short_url(url: &str) -> String {
    if url.starts_with("data:") {
        format!("inline image, {} bytes", url.len())
    } else {
        url.to_string()
    }
}

fn effect_summary(item: &ShopItem) -> String {
    match item.effect {
        ItemEffect::PassiveIncome => format!("+{} coins every tick", item.value),
        ItemEffect::RemoveWrong => "rules out a wrong answer once per case".to_string(),
        ItemEffect::CoinMultiplier => format!("x{} coin rewards", item.value),
        ItemEffect::None => "cosmetic".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::permanent_cases;

    fn state_with_case() -> GameState {
        GameState {
            current_case: Some(permanent_cases().remove(0)),
            game_status: GameStatus::Playing,
            profile: Profile::starting(),
            ..GameState::default()
        }
    }

    #[test]
    fn test_auth_shows_error() {
        let screen = render_auth(Some("Incorrect password! Try again."));
        assert!(screen.contains("signup"));
        assert!(screen.contains("Incorrect password! Try again."));
    }

    #[test]
    fn test_clinic_lists_choices() {
        let mut state = state_with_case();
        state.removed_choice_id = Some("c3".to_string());

        let screen = render_clinic(&state, &[]);
        assert!(screen.contains("Patient: Oliver, 8"));
        assert!(screen.contains("1) Calamine lotion & rest"));
        assert!(screen.contains("3) Ice bath (ruled out)"));
        assert!(screen.contains("api.dicebear.com"));
    }

    #[test]
    fn test_explanation_after_case() {
        let mut state = state_with_case();
        state.game_status = GameStatus::CaseSuccess;
        state.show_explanation = true;

        let screen = render_clinic(&state, &[]);
        assert!(screen.contains("Diagnosis: Chickenpox"));
        assert!(screen.contains("CDC - Chickenpox"));
    }

    #[test]
    fn test_load_error_offers_retry() {
        let state = GameState {
            error: Some("Oh no! The pager is broken. We couldn't find a new patient.".to_string()),
            ..GameState::default()
        };
        let screen = render_clinic(&state, &[]);
        assert!(screen.contains("pager is broken"));
        assert!(screen.contains("retry"));
    }

    #[test]
    fn test_shop_marks_owned_items() {
        let mut state = state_with_case();
        state.profile.inventory.push("equip_mri".to_string());

        let screen = render_shop(&state);
        assert!(screen.contains("[owned]"));
        assert!(screen.contains("[150 coins]"));
    }

    #[test]
    fn test_clinic_lists_leaderboard() {
        let state = state_with_case();
        let board = vec![LeaderboardEntry {
            rank: 1,
            user_id: "dr_cat".to_string(),
            username: "Dr. Meow".to_string(),
            is_ai: true,
            profile: Profile {
                xp: 5000,
                ..Profile::starting()
            },
        }];

        let screen = render_clinic(&state, &board);
        assert!(screen.contains("--- Top Doctors ---"));
        assert!(screen.contains("1. Dr. Meow (5000 xp)"));
    }

    /// A sink that refuses writes after a fixed number of bytes.
    struct Cramped {
        text: String,
        room: usize,
    }

    impl Write for Cramped {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if s.len() > self.room.saturating_sub(self.text.len()) {
                return Err(fmt::Error);
            }
            self.text.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_propagate() {
        let mut sink = Cramped {
            text: String::new(),
            room: 40,
        };
        assert!(write_clinic(&mut sink, &state_with_case(), &[]).is_err());
        assert!(sink.text.len() <= 40);

        let mut roomy = Cramped {
            text: String::new(),
            room: usize::MAX,
        };
        assert!(write_auth(&mut roomy, None).is_ok());
        assert_eq!(roomy.text, render_auth(None));
    }

    #[test]
    fn test_progress_bar_width() {
        let summary = profile_summary(&Profile {
            xp: 200,
            ..Profile::starting()
        });
        // Halfway from 100 to 300
        assert!(summary.contains("[#####-----]"));
    }
}
