//! Shop catalog, purchases, upgrade modifiers and cosmetic tints

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::Profile;

/// Upgrade item ids
pub const SNEAKERS: &str = "sneakers";
pub const MASK: &str = "mask";
pub const WALLET2: &str = "wallet2";

/// Speed added by sneakers (pixels per reference frame)
pub const SNEAKERS_SPEED_BONUS: f32 = 0.5;
/// Detection radius factor with the mask
pub const MASK_DETECTION_FACTOR: f32 = 0.8;
/// Coin/score multiplier with the wallet
pub const WALLET_MULTIPLIER: u64 = 2;

/// RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Cosmetic slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CosmeticCategory {
    Alex,
    Van,
}

impl CosmeticCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CosmeticCategory::Alex => "alex",
            CosmeticCategory::Van => "van",
        }
    }
}

/// What buying an item gives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Upgrade,
    Cosmetic { category: CosmeticCategory, color: Rgb },
}

/// A catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub cost: u64,
    pub kind: ItemKind,
}

const fn cosmetic(
    id: &'static str,
    name: &'static str,
    cost: u64,
    category: CosmeticCategory,
    color: Rgb,
) -> ShopItem {
    ShopItem {
        id,
        name,
        desc: "",
        cost,
        kind: ItemKind::Cosmetic { category, color },
    }
}

/// Everything the shop sells, in display order
pub const CATALOG: &[ShopItem] = &[
    ShopItem { id: SNEAKERS, name: "Sneakers", desc: "+0.5 speed", cost: 70, kind: ItemKind::Upgrade },
    ShopItem { id: MASK, name: "Mask", desc: "-20% detection", cost: 90, kind: ItemKind::Upgrade },
    ShopItem { id: WALLET2, name: "Wallet x2", desc: "Double coin rewards", cost: 220, kind: ItemKind::Upgrade },
    cosmetic("alex_grey", "Grey Shirt", 0, CosmeticCategory::Alex, Rgb(120, 120, 120)),
    cosmetic("alex_black", "Black Jacket", 80, CosmeticCategory::Alex, Rgb(30, 30, 30)),
    cosmetic("alex_red", "Red Tee", 110, CosmeticCategory::Alex, Rgb(200, 40, 40)),
    cosmetic("van_blue", "Blue Van", 0, CosmeticCategory::Van, Rgb(10, 70, 150)),
    cosmetic("van_white", "White Van", 100, CosmeticCategory::Van, Rgb(240, 240, 240)),
    cosmetic("van_stripe", "Stripe Skin", 160, CosmeticCategory::Van, Rgb(200, 20, 20)),
];

pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("no shop item {0:?}")]
    UnknownItem(String),
    #[error("{0:?} is already owned")]
    AlreadyOwned(String),
    #[error("{id:?} costs {cost}, balance is {balance}")]
    NotEnoughCoins { id: String, cost: u64, balance: u64 },
    #[error("{0:?} is not an owned cosmetic")]
    NotEquippable(String),
}

/// Buy an item: deduct the cost, mark it owned, equip it if it is a cosmetic
pub fn purchase(profile: &mut Profile, id: &str) -> Result<&'static ShopItem, ShopError> {
    let item = find_item(id).ok_or_else(|| ShopError::UnknownItem(id.to_string()))?;
    if profile.owns(id) {
        return Err(ShopError::AlreadyOwned(id.to_string()));
    }
    if profile.coins < item.cost {
        return Err(ShopError::NotEnoughCoins {
            id: id.to_string(),
            cost: item.cost,
            balance: profile.coins,
        });
    }
    profile.coins -= item.cost;
    profile.owned.insert(id.to_string());
    if let ItemKind::Cosmetic { category, .. } = item.kind {
        profile
            .equipped
            .insert(category.as_str().to_string(), id.to_string());
    }
    Ok(item)
}

/// Equip an owned cosmetic (free starter cosmetics count as owned)
pub fn equip(profile: &mut Profile, id: &str) -> Result<(), ShopError> {
    let item = find_item(id).ok_or_else(|| ShopError::UnknownItem(id.to_string()))?;
    let ItemKind::Cosmetic { category, .. } = item.kind else {
        return Err(ShopError::NotEquippable(id.to_string()));
    };
    if item.cost > 0 && !profile.owns(id) {
        return Err(ShopError::NotEquippable(id.to_string()));
    }
    profile
        .equipped
        .insert(category.as_str().to_string(), id.to_string());
    Ok(())
}

/// Gameplay modifiers derived from owned upgrades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loadout {
    /// Added to the base player speed
    pub speed_bonus: f32,
    /// Multiplies the base detection radius
    pub detection_factor: f32,
    /// Multiplies score rate, coin pickups and run rewards
    pub coin_multiplier: u64,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            speed_bonus: 0.0,
            detection_factor: 1.0,
            coin_multiplier: 1,
        }
    }
}

impl Loadout {
    pub fn from_profile(profile: &Profile) -> Self {
        let mut loadout = Self::default();
        if profile.owns(SNEAKERS) {
            loadout.speed_bonus += SNEAKERS_SPEED_BONUS;
        }
        if profile.owns(MASK) {
            loadout.detection_factor *= MASK_DETECTION_FACTOR;
        }
        if profile.owns(WALLET2) {
            loadout.coin_multiplier = WALLET_MULTIPLIER;
        }
        loadout
    }
}

/// Entities drawn in a cosmetic colour
pub trait Tintable {
    fn tint_category(&self) -> CosmeticCategory;

    /// Colour of the cosmetic equipped for this entity's category
    fn tint(&self, profile: &Profile) -> Option<Rgb> {
        let id = profile.equipped_in(self.tint_category().as_str())?;
        match find_item(id)?.kind {
            ItemKind::Cosmetic { color, .. } => Some(color),
            ItemKind::Upgrade => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_deducts_and_equips() {
        let mut profile = Profile { coins: 150, ..Default::default() };
        let item = purchase(&mut profile, "alex_red").unwrap();
        assert_eq!(item.cost, 110);
        assert_eq!(profile.coins, 40);
        assert!(profile.owns("alex_red"));
        assert_eq!(profile.equipped_in("alex"), Some("alex_red"));
    }

    #[test]
    fn test_purchase_rejects_duplicates_and_poverty() {
        let mut profile = Profile { coins: 100, ..Default::default() };
        purchase(&mut profile, SNEAKERS).unwrap();
        assert_eq!(profile.coins, 30);
        assert_eq!(
            purchase(&mut profile, SNEAKERS),
            Err(ShopError::AlreadyOwned(SNEAKERS.to_string()))
        );
        assert!(matches!(
            purchase(&mut profile, WALLET2),
            Err(ShopError::NotEnoughCoins { cost: 220, balance: 30, .. })
        ));
        assert_eq!(profile.coins, 30);
        assert!(matches!(purchase(&mut profile, "jetpack"), Err(ShopError::UnknownItem(_))));
    }

    #[test]
    fn test_equip_requires_ownership() {
        let mut profile = Profile::default();
        assert!(equip(&mut profile, "van_white").is_err());
        assert!(equip(&mut profile, MASK).is_err());
        profile.owned.insert("van_white".to_string());
        equip(&mut profile, "van_white").unwrap();
        assert_eq!(profile.equipped_in("van"), Some("van_white"));
        equip(&mut profile, "van_blue").unwrap();
        assert_eq!(profile.equipped_in("van"), Some("van_blue"));
    }

    #[test]
    fn test_loadout_from_upgrades() {
        let mut profile = Profile::default();
        assert_eq!(Loadout::from_profile(&profile), Loadout::default());
        for id in [SNEAKERS, MASK, WALLET2] {
            profile.owned.insert(id.to_string());
        }
        let loadout = Loadout::from_profile(&profile);
        assert_eq!(loadout.speed_bonus, 0.5);
        assert!((loadout.detection_factor - 0.8).abs() < 1e-6);
        assert_eq!(loadout.coin_multiplier, 2);
    }

    struct Van;
    impl Tintable for Van {
        fn tint_category(&self) -> CosmeticCategory {
            CosmeticCategory::Van
        }
    }

    #[test]
    fn test_tint_follows_equipped() {
        let mut profile = Profile::default();
        assert_eq!(Van.tint(&profile), Some(Rgb(10, 70, 150)));
        profile.equipped.insert("van".into(), "van_stripe".into());
        assert_eq!(Van.tint(&profile), Some(Rgb(200, 20, 20)));
        profile.equipped.remove("van");
        assert_eq!(Van.tint(&profile), None);
    }
}
