use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub type UserId = String;

/// Coins granted to every new account and guest session.
pub const STARTING_COINS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// SHA-256 hex digest. AI and guest users have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub password: Option<String>,
    pub is_ai: bool,
    #[serde(default)]
    pub is_guest: bool,
    pub profile: Profile,
    #[ts(type = "number")]
    pub created_at: i64, // epoch millis
    #[ts(type = "number")]
    pub last_login: i64, // epoch millis
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Profile {
    pub coins: u32,
    pub xp: u32,
    pub score: u32,
    pub inventory: Vec<String>,
}

impl Profile {
    /// Zeroed profile with the starting coin grant.
    pub fn starting() -> Self {
        Self {
            coins: STARTING_COINS,
            ..Self::default()
        }
    }

    /// A profile nobody has played with yet.
    pub fn is_fresh(&self) -> bool {
        self.xp == 0 && self.coins == STARTING_COINS
    }

    pub fn owns(&self, item_id: &str) -> bool {
        self.inventory.iter().any(|id| id == item_id)
    }

    /// Adds an item to the inventory, returning false if it was already owned.
    pub fn add_item(&mut self, item_id: &str) -> bool {
        if self.owns(item_id) {
            return false;
        }
        self.inventory.push(item_id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_profile() {
        let profile = Profile::starting();
        assert_eq!(profile.coins, 100);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.score, 0);
        assert!(profile.inventory.is_empty());
        assert!(profile.is_fresh());
    }

    #[test]
    fn test_inventory_rejects_duplicates() {
        let mut profile = Profile::starting();
        assert!(profile.add_item("equip_scrubs"));
        assert!(!profile.add_item("equip_scrubs"));
        assert!(profile.add_item("equip_mri"));
        assert_eq!(profile.inventory, vec!["equip_scrubs", "equip_mri"]);
    }

    #[test]
    fn test_user_json_uses_camel_case() {
        let user = User {
            id: "dr_bun".to_string(),
            username: "Nurse Bun".to_string(),
            password: None,
            is_ai: true,
            is_guest: false,
            profile: Profile::default(),
            created_at: 1,
            last_login: 2,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isAi"], true);
        assert_eq!(json["lastLogin"], 2);
        assert!(json.get("password").is_none());
    }
}
