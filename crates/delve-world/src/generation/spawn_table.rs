//! Enemy kinds and the per-theme spawn weight table.

use super::theme::Theme;

/// Enemy archetypes that can occupy a spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnemyKind {
    /// Slow melee blob
    Slime,
    /// Fast, fragile flyer
    Bat,
    /// Melee undead
    Skeleton,
    /// Ranged spirit
    Wraith,
    /// Slow heavy bruiser
    Golem,
}

/// Enemy kinds indexed by their numeric ID.
const KINDS_BY_ID: [EnemyKind; 5] = [
    EnemyKind::Slime,
    EnemyKind::Bat,
    EnemyKind::Skeleton,
    EnemyKind::Wraith,
    EnemyKind::Golem,
];

impl EnemyKind {
    /// Numeric ID used by map and save formats.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a kind by numeric ID.
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        KINDS_BY_ID.get(usize::from(id)).copied()
    }

    /// Every kind, in ID order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &KINDS_BY_ID
    }
}

/// Weighted spawn entries per theme. Weights are relative within a theme.
static SANCTUM_SPAWNS: [(EnemyKind, u32); 1] = [(EnemyKind::Slime, 1)];
static WILDS_SPAWNS: [(EnemyKind, u32); 2] = [(EnemyKind::Slime, 3), (EnemyKind::Bat, 2)];
static RUINS_SPAWNS: [(EnemyKind, u32); 3] = [
    (EnemyKind::Bat, 2),
    (EnemyKind::Skeleton, 4),
    (EnemyKind::Wraith, 1),
];
static DEPTHS_SPAWNS: [(EnemyKind, u32); 3] = [
    (EnemyKind::Skeleton, 2),
    (EnemyKind::Wraith, 3),
    (EnemyKind::Golem, 2),
];

/// Weighted spawn entries for a theme.
#[must_use]
pub fn spawn_weights(theme: Theme) -> &'static [(EnemyKind, u32)] {
    match theme {
        Theme::Sanctum => &SANCTUM_SPAWNS,
        Theme::Wilds => &WILDS_SPAWNS,
        Theme::Ruins => &RUINS_SPAWNS,
        Theme::Depths => &DEPTHS_SPAWNS,
    }
}

/// Draws an enemy kind for a theme.
pub(crate) fn pick_enemy(theme: Theme, rng: &mut fastrand::Rng) -> EnemyKind {
    let table = spawn_weights(theme);
    let total: u32 = table.iter().map(|&(_, weight)| weight).sum();
    let mut roll = rng.u32(0..total);
    for &(kind, weight) in table {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    // Unreachable while every table has a positive total weight.
    table[table.len() - 1].0
}
