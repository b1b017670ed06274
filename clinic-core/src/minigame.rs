use rand::Rng;
use serde::Serialize;

pub const SPAWN_INTERVAL_MS: u64 = 500;
pub const MAX_FALLING_ITEMS: usize = 20;
pub const COINS_PER_CATCH: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallingKind {
    Coin,
    Pill,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallingItem {
    pub id: u32,
    /// Horizontal position in percent of the screen width.
    pub x: f64,
    pub fall_seconds: f64,
    pub kind: FallingKind,
    pub caught: bool,
}

/// Catch-the-falling-coins game shown while a case is loading.
#[derive(Debug, Default)]
pub struct MiniGame {
    items: Vec<FallingItem>,
    last_spawn_ms: Option<u64>,
    next_id: u32,
}

impl MiniGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the spawner clock. Returns the id of a newly spawned item, if one was due.
    pub fn tick<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> Option<u32> {
        let due = match self.last_spawn_ms {
            Some(last) => now_ms.saturating_sub(last) >= SPAWN_INTERVAL_MS,
            None => true,
        };
        if !due {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.items.push(FallingItem {
            id,
            x: rng.gen_range(8.0..92.0), // keep clear of the edges
            fall_seconds: rng.gen_range(2.0..4.0),
            kind: if rng.gen_bool(0.2) {
                FallingKind::Pill
            } else {
                FallingKind::Coin
            },
            caught: false,
        });
        self.last_spawn_ms = Some(now_ms);

        if self.items.len() > MAX_FALLING_ITEMS {
            let excess = self.items.len() - MAX_FALLING_ITEMS;
            self.items.drain(..excess);
        }

        Some(id)
    }

    /// Marks an item caught. Returns false for unknown or already caught items.
    pub fn catch(&mut self, item_id: u32) -> bool {
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) if !item.caught => {
                item.caught = true;
                true
            }
            _ => false,
        }
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.last_spawn_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_spawns_on_interval() {
        let mut game = MiniGame::new();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(game.tick(0, &mut rng), Some(0));
        assert_eq!(game.tick(200, &mut rng), None);
        assert_eq!(game.tick(500, &mut rng), Some(1));
        assert_eq!(game.items().len(), 2);

        for item in game.items() {
            assert!(item.x >= 8.0 && item.x < 92.0);
            assert!(item.fall_seconds >= 2.0 && item.fall_seconds < 4.0);
        }
    }

    #[test]
    fn test_caps_item_count() {
        let mut game = MiniGame::new();
        let mut rng = StdRng::seed_from_u64(7);

        for step in 0..30 {
            game.tick(step * SPAWN_INTERVAL_MS, &mut rng);
        }

        assert_eq!(game.items().len(), MAX_FALLING_ITEMS);
        // Oldest items are dropped first
        assert_eq!(game.items()[0].id, 10);
    }

    #[test]
    fn test_catch_only_once() {
        let mut game = MiniGame::new();
        let mut rng = StdRng::seed_from_u64(7);
        let id = game.tick(0, &mut rng).unwrap();

        assert!(game.catch(id));
        assert!(!game.catch(id));
        assert!(!game.catch(99));
    }
}
