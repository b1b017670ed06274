use std::collections::HashMap;
use tracing::info;

use crate::store::{ClinicStore, USERS_KEY};
use clinic_types::{Profile, User, UserId};

/// Public view of a ranked user. Credentials stay in the user table.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub username: String,
    pub is_ai: bool,
    pub profile: Profile,
}

impl LeaderboardEntry {
    fn new(rank: u32, user: User) -> Self {
        Self {
            rank,
            user_id: user.id,
            username: user.username,
            is_ai: user.is_ai,
            profile: user.profile,
        }
    }
}

type UserTable = HashMap<UserId, User>;

#[derive(Clone)]
pub struct UserRepository {
    store: ClinicStore,
}

impl UserRepository {
    pub fn new(store: ClinicStore) -> Self {
        Self { store }
    }

    async fn load(&self) -> UserTable {
        self.store.get_stored_item(USERS_KEY, UserTable::new()).await
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        self.load().await.into_values().collect()
    }

    pub async fn get_user_by_id(&self, id: &str) -> Option<User> {
        self.load().await.remove(id)
    }

    /// Case-insensitive over the full Unicode range.
    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        let wanted = username.to_lowercase();
        self.load()
            .await
            .into_values()
            .find(|user| user.username.to_lowercase() == wanted)
    }

    /// Inserts or replaces the user. Returns whether the write was persisted.
    pub async fn save_user(&self, user: &User) -> bool {
        let mut users = self.load().await;
        users.insert(user.id.clone(), user.clone());
        self.store.set_stored_item(USERS_KEY, &users).await
    }

    /// Users ordered by xp, highest first.
    pub async fn get_leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut users = self.get_all_users().await;
        users.sort_by(|a, b| {
            b.profile
                .xp
                .cmp(&a.profile.xp)
                .then_with(|| a.username.cmp(&b.username))
        });

        users
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, user)| LeaderboardEntry::new((index + 1) as u32, user))
            .collect()
    }

    /// Adds the resident AI doctors unless they are already on staff.
    pub async fn seed_ai_users(&self) {
        let mut users = self.load().await;
        if users.contains_key("dr_cat") {
            return;
        }

        let now = chrono::Utc::now().timestamp_millis();
        let ai_user = |id: &str, username: &str, profile: Profile| User {
            id: id.to_string(),
            username: username.to_string(),
            password: None,
            is_ai: true,
            is_guest: false,
            profile,
            created_at: now,
            last_login: now,
        };

        let dr_cat = ai_user(
            "dr_cat",
            "Dr. Meow",
            Profile {
                coins: 9999,
                xp: 5000,
                score: 5000,
                inventory: vec!["staff_nurse_cat".to_string()],
            },
        );
        let dr_bun = ai_user(
            "dr_bun",
            "Nurse Bun",
            Profile {
                coins: 450,
                xp: 1200,
                score: 1200,
                inventory: Vec::new(),
            },
        );

        users.insert(dr_cat.id.clone(), dr_cat);
        users.insert(dr_bun.id.clone(), dr_bun);
        if self.store.set_stored_item(USERS_KEY, &users).await {
            info!("Seeded AI leaderboard users");
        }
    }
}
