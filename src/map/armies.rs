use std::collections::BTreeSet;

use crate::config::ArmyConfig;

use super::{Bonus, SuperBonus, Territory};

/// Scores bonuses by size and exposure.
#[derive(Clone, Copy, Debug)]
pub struct ArmyCalculator {
    config: ArmyConfig,
}

impl ArmyCalculator {
    pub fn new(config: ArmyConfig) -> Self { Self { config } }

    /// Territories outside the bonus that border one of its children.
    pub fn outer_connections(territories: &[Territory], bonus: &Bonus) -> BTreeSet<usize> {
        bonus.children.iter()
            .filter_map(|&t| territories.get(t))
            .flat_map(|t| t.neighbors.iter().copied())
            .filter(|n| territories.get(*n).is_some_and(|t| t.bonus != Some(bonus.id)))
            .collect()
    }

    /// Armies for a bonus with `territories` children and `connections`
    /// outer connections, relative to the largest values on the map.
    pub fn bonus_armies(&self, territories: usize, connections: usize, max_territories: usize, max_connections: usize) -> u32 {
        let ratio = |n: usize, max: usize| if max == 0 { 0.0 } else { n as f64 / max as f64 };
        let score = self.config.territory_weight * ratio(territories, max_territories)
            + self.config.connection_weight * ratio(connections, max_connections);

        let span = self.config.max.saturating_sub(self.config.min) as f64;
        let armies = self.config.min as f64 + (span * score).round();
        armies.clamp(self.config.min as f64, self.config.max as f64) as u32
    }

    /// Sum of the member bonuses' armies, capped at twice the bonus maximum.
    pub fn super_bonus_armies(&self, bonuses: &[Bonus], super_bonus: &SuperBonus) -> u32 {
        let sum: u32 = super_bonus.children.iter()
            .filter_map(|&b| bonuses.get(b))
            .map(|b| b.armies)
            .sum();
        sum.min(self.config.max.saturating_mul(2))
    }

    /// Fill in `armies` on every bonus and super bonus.
    pub fn assign(&self, territories: &[Territory], bonuses: &mut [Bonus], super_bonuses: &mut [SuperBonus]) {
        let connections: Vec<usize> = bonuses.iter().map(|b| Self::outer_connections(territories, b).len()).collect();
        let max_territories = bonuses.iter().map(|b| b.children.len()).max().unwrap_or(0);
        let max_connections = connections.iter().copied().max().unwrap_or(0);

        for (bonus, &o) in bonuses.iter_mut().zip(&connections) {
            bonus.armies = self.bonus_armies(bonus.children.len(), o, max_territories, max_connections);
        }
        for super_bonus in super_bonuses.iter_mut() {
            super_bonus.armies = self.super_bonus_armies(bonuses, super_bonus);
        }
    }
}
