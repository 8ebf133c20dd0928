use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Serialize;

use super::{Bonus, SuperBonus, Territory};

/// A finished map in canvas coordinates `[0, width] x [0, height]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Map {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Distinct boundary levels the map was built from.
    pub levels: BTreeSet<u8>,
    pub territories: Vec<Territory>,
    pub bonuses: Vec<Bonus>,
    pub super_bonuses: Vec<SuperBonus>,
}

impl Map {
    #[inline] pub fn territory(&self, id: usize) -> Option<&Territory> { self.territories.get(id) }

    #[inline] pub fn bonus(&self, id: usize) -> Option<&Bonus> { self.bonuses.get(id) }

    #[inline] pub fn super_bonus(&self, id: usize) -> Option<&SuperBonus> { self.super_bonuses.get(id) }

    /// Number of undirected territory connections.
    pub fn connection_count(&self) -> usize {
        self.territories.iter().map(|t| t.neighbors.len()).sum::<usize>() / 2
    }

    /// Territories not held by any bonus.
    pub fn ungrouped_territories(&self) -> impl Iterator<Item = &Territory> + '_ {
        self.territories.iter().filter(|t| t.bonus.is_none())
    }

    /// Check ids, neighbour symmetry and parent/child agreement.
    pub fn validate(&self) -> Result<()> {
        for (i, t) in self.territories.iter().enumerate() {
            ensure!(t.id == i, "[Map.validate] territory at {i} has id {}", t.id);
            for &n in &t.neighbors {
                let other = self.territory(n).with_context(|| format!("[Map.validate] territory {i} borders unknown {n}"))?;
                ensure!(n != i, "[Map.validate] territory {i} borders itself");
                ensure!(other.neighbors.contains(&i), "[Map.validate] {i} -> {n} has no reverse connection");
            }
            if let Some(b) = t.bonus {
                let bonus = self.bonus(b).with_context(|| format!("[Map.validate] territory {i} in unknown bonus {b}"))?;
                ensure!(bonus.children.contains(&i), "[Map.validate] bonus {b} does not list territory {i}");
            }
        }
        for (i, b) in self.bonuses.iter().enumerate() {
            ensure!(b.id == i, "[Map.validate] bonus at {i} has id {}", b.id);
            for &c in &b.children {
                let child = self.territory(c).with_context(|| format!("[Map.validate] bonus {i} holds unknown {c}"))?;
                ensure!(child.bonus == Some(i), "[Map.validate] territory {c} does not point back to bonus {i}");
            }
        }
        for (i, s) in self.super_bonuses.iter().enumerate() {
            ensure!(s.id == i, "[Map.validate] super bonus at {i} has id {}", s.id);
            for &c in &s.children {
                let child = self.bonus(c).with_context(|| format!("[Map.validate] super bonus {i} holds unknown {c}"))?;
                ensure!(child.super_bonus == Some(i), "[Map.validate] bonus {c} does not point back to super bonus {i}");
            }
        }
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).context("[Map.to_json_string] serialization failed")
    }

    /// Write the map as JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("[Map.write_json] cannot create {}", path.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)
            .with_context(|| format!("[Map.write_json] cannot write {}", path.display()))
    }
}
