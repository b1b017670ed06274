use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Staff,
    Equipment,
    Cosmetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    PassiveIncome,  // coins every income tick
    RemoveWrong,    // hides one wrong choice per case
    CoinMultiplier, // scales coin rewards on correct answers
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u32,
    pub category: ItemCategory,
    pub effect: ItemEffect,
    pub value: f64,
}

pub static SHOP_ITEMS: [ShopItem; 6] = [
    ShopItem {
        id: "staff_nurse_cat",
        name: "Nurse Meow-dred",
        description: "A dedicated feline nurse who helps organize files. Earns 5 coins every 10 seconds.",
        cost: 150,
        category: ItemCategory::Staff,
        effect: ItemEffect::PassiveIncome,
        value: 5.0,
    },
    ShopItem {
        id: "equip_stethoscope",
        name: "Littmann-y Cricket",
        description: "Listen closely! Allows you to rule out one incorrect diagnosis per patient.",
        cost: 500,
        category: ItemCategory::Equipment,
        effect: ItemEffect::RemoveWrong,
        value: 0.0,
    },
    ShopItem {
        id: "equip_scrubs",
        name: "Figs & Berries Scrubs",
        description: "Stylish, berry-scented scrubs. Purely cosmetic, but boosts confidence!",
        cost: 200,
        category: ItemCategory::Cosmetic,
        effect: ItemEffect::None,
        value: 0.0,
    },
    ShopItem {
        id: "equip_mri",
        name: "Mew-MRI Scanner",
        description: "A magnetic resonance imager shaped like a giant cat head. Increases coin rewards by 50% for correct diagnoses.",
        cost: 1200,
        category: ItemCategory::Equipment,
        effect: ItemEffect::CoinMultiplier,
        value: 1.5,
    },
    ShopItem {
        id: "staff_robo_doc",
        name: "Da Vinci-chi Code Bot",
        description: "A surgical robot that paints masterpieces while operating. Earns 20 coins every 10 seconds.",
        cost: 2500,
        category: ItemCategory::Staff,
        effect: ItemEffect::PassiveIncome,
        value: 20.0,
    },
    ShopItem {
        id: "equip_butterfly",
        name: "Butterfly iQ-tie",
        description: "A handheld ultrasound that looks like a bow tie. Makes you look smart.",
        cost: 800,
        category: ItemCategory::Cosmetic,
        effect: ItemEffect::None,
        value: 0.0,
    },
];

pub fn find_item(item_id: &str) -> Option<&'static ShopItem> {
    SHOP_ITEMS.iter().find(|item| item.id == item_id)
}

fn owned_items<'a>(inventory: &'a [String]) -> impl Iterator<Item = &'static ShopItem> + 'a {
    inventory.iter().filter_map(|id| find_item(id))
}

pub fn has_effect(inventory: &[String], effect: ItemEffect) -> bool {
    owned_items(inventory).any(|item| item.effect == effect)
}

/// Coins earned per income tick from owned staff.
pub fn passive_income(inventory: &[String]) -> u32 {
    owned_items(inventory)
        .filter(|item| item.effect == ItemEffect::PassiveIncome)
        .map(|item| item.value as u32)
        .sum()
}

/// Factor applied to coin rewards for correct answers; 1.0 without a multiplier item.
pub fn coin_multiplier(inventory: &[String]) -> f64 {
    owned_items(inventory)
        .filter(|item| item.effect == ItemEffect::CoinMultiplier)
        .map(|item| item.value)
        .fold(1.0, f64::max)
}
