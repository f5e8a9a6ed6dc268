use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload tag of the items dropped into the lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Sword,
    HealthPotion,
    ManaPotion,
}

impl ItemKind {
    /// Ids of random items are drawn from `0..MAX_RANDOM_ID`.
    pub const MAX_RANDOM_ID: u64 = 1000;

    /// Swords 40% of the time, the rest split evenly between the potions.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.4) {
            ItemKind::Sword
        } else if rng.gen_bool(0.5) {
            ItemKind::HealthPotion
        } else {
            ItemKind::ManaPotion
        }
    }

    pub fn random_id<R: Rng + ?Sized>(rng: &mut R) -> u64 {
        rng.gen_range(0..Self::MAX_RANDOM_ID)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Sword => "sword",
            ItemKind::HealthPotion => "hp",
            ItemKind::ManaPotion => "mp",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn all_kinds_show_up() {
        let mut rng: StdRng = StdRng::seed_from_u64(7);
        let kinds: Vec<ItemKind> = (0..200).map(|_| ItemKind::random(&mut rng)).collect();
        assert!(kinds.contains(&ItemKind::Sword));
        assert!(kinds.contains(&ItemKind::HealthPotion));
        assert!(kinds.contains(&ItemKind::ManaPotion));
    }

    #[test]
    fn ids_stay_in_range() {
        let mut rng: StdRng = StdRng::seed_from_u64(1);
        assert!((0..500).all(|_| ItemKind::random_id(&mut rng) < ItemKind::MAX_RANDOM_ID));
    }
}
