use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rank {
    pub id: u32,
    pub title: &'static str,
    pub min_xp: u32,
    pub icon: &'static str,
}

/// Promotion ladder, ascending by threshold.
pub static RANKS: [Rank; 10] = [
    Rank { id: 1, title: "Pre-Med Wannabe", min_xp: 0, icon: "🥚" },
    Rank { id: 2, title: "Med Student (Lost)", min_xp: 100, icon: "📚" },
    Rank { id: 3, title: "Intern (Sleepy)", min_xp: 300, icon: "☕" },
    Rank { id: 4, title: "Junior Resident", min_xp: 600, icon: "🏃" },
    Rank { id: 5, title: "Senior Resident", min_xp: 1000, icon: "📋" },
    Rank { id: 6, title: "Chief Resident", min_xp: 1500, icon: "😼" },
    Rank { id: 7, title: "Fellow", min_xp: 2200, icon: "🧐" },
    Rank { id: 8, title: "Attending", min_xp: 3000, icon: "⛳" },
    Rank { id: 9, title: "Dept. Chair", min_xp: 4000, icon: "👑" },
    Rank { id: 10, title: "Surgeon General of Cute", min_xp: 5500, icon: "💖" },
];

/// Highest rank whose threshold the given xp has reached.
pub fn rank_for(xp: u32) -> &'static Rank {
    RANKS
        .iter()
        .rev()
        .find(|rank| xp >= rank.min_xp)
        .unwrap_or(&RANKS[0])
}

pub fn next_rank(current_rank_id: u32) -> Option<&'static Rank> {
    RANKS.iter().find(|rank| rank.id == current_rank_id + 1)
}

/// Fraction of the way from the current rank to the next one. 1.0 at the top of the ladder.
pub fn rank_progress(xp: u32) -> f64 {
    let current = rank_for(xp);
    match next_rank(current.id) {
        Some(next) => {
            let span = (next.min_xp - current.min_xp) as f64;
            ((xp - current.min_xp) as f64 / span).clamp(0.0, 1.0)
        }
        None => 1.0,
    }
}
