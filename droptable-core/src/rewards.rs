use rand::Rng;
use thiserror::Error;

use crate::{Case, Item, PrimaryKey, Rarity};

impl Rarity {
    /// The relative draw weight of this tier.
    ///
    /// The weights are ratios, not percentages: an item's draw chance
    /// is its weight divided by the summed weights of the case's pool.
    pub fn weight(self) -> u32 {
        match self {
            Rarity::Legendary => 5,
            Rarity::Epic => 15,
            Rarity::Rare => 30,
            Rarity::Uncommon => 40,
            Rarity::Common => 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum RewardError {
    /// The case has no items to draw from
    #[error("case:{case_id} has an empty reward pool")]
    EmptyPool { case_id: PrimaryKey },
}

/// Draws one item from the catalog subset belonging to `case`.
///
/// Rolls a uniform integer below the pool's summed weights and walks
/// the cumulative weights, so each item's probability is exactly
/// `weight / total`. The rng is supplied by the caller, which lets
/// tests seed it.
pub fn draw_reward<R>(case: &Case, catalog: &[Item], rng: &mut R) -> Result<Item, RewardError>
where
    R: Rng,
{
    let pool: Vec<_> = catalog.iter().filter(|i| i.case_id == case.id).collect();

    let total: u32 = pool.iter().map(|i| i.rarity.weight()).sum();

    if total == 0 {
        return Err(RewardError::EmptyPool { case_id: case.id });
    }

    let mut roll = rng.gen_range(0..total);

    for item in &pool {
        let weight = item.rarity.weight();

        if roll < weight {
            return Ok((*item).clone());
        }

        roll -= weight;
    }

    // roll < total, so the walk always lands on an item
    unreachable!("roll exceeded the summed weights")
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn case(id: PrimaryKey) -> Case {
        Case {
            id,
            name: "Кейс".to_string(),
            price: 1000,
            image: "🎁".to_string(),
            description: String::new(),
        }
    }

    fn item(id: PrimaryKey, rarity: Rarity, case_id: PrimaryKey) -> Item {
        Item {
            id,
            name: format!("Скин {id}"),
            rarity,
            image: "🌟".to_string(),
            price: 100,
            case_id,
        }
    }

    #[test]
    fn test_empty_pool_fails_explicitly() {
        let mut rng = StdRng::seed_from_u64(1);

        let catalog = vec![item(1, Rarity::Common, 99)];
        let result = draw_reward(&case(1), &catalog, &mut rng);

        assert!(matches!(result, Err(RewardError::EmptyPool { case_id: 1 })));
    }

    #[test]
    fn test_draw_stays_within_case() {
        let mut rng = StdRng::seed_from_u64(2);

        let catalog = vec![
            item(1, Rarity::Common, 1),
            item(2, Rarity::Common, 2),
            item(3, Rarity::Legendary, 1),
        ];

        for _ in 0..200 {
            let reward = draw_reward(&case(1), &catalog, &mut rng).unwrap();
            assert_eq!(reward.case_id, 1);
        }
    }

    #[test]
    fn test_distribution_follows_weights() {
        let mut rng = StdRng::seed_from_u64(3);

        // The 5:60 pool from the storefront's stock legendary case
        let catalog = vec![item(1, Rarity::Legendary, 1), item(2, Rarity::Common, 1)];

        let draws = 20_000;
        let mut counts: HashMap<PrimaryKey, u32> = HashMap::new();

        for _ in 0..draws {
            let reward = draw_reward(&case(1), &catalog, &mut rng).unwrap();
            *counts.entry(reward.id).or_default() += 1;
        }

        let legendary = counts[&1] as f64 / draws as f64;
        let expected = 5.0 / 65.0;

        assert!(
            (legendary - expected).abs() < 0.01,
            "legendary frequency {legendary} should be near {expected}"
        );
    }

    #[test]
    fn test_equal_weights_draw_equally() {
        let mut rng = StdRng::seed_from_u64(4);

        let catalog = vec![item(1, Rarity::Rare, 1), item(2, Rarity::Rare, 1)];

        let draws = 10_000;
        let mut first = 0u32;

        for _ in 0..draws {
            if draw_reward(&case(1), &catalog, &mut rng).unwrap().id == 1 {
                first += 1;
            }
        }

        let frequency = first as f64 / draws as f64;
        assert!(
            (frequency - 0.5).abs() < 0.02,
            "equal weights should split evenly, got {frequency}"
        );
    }
}
