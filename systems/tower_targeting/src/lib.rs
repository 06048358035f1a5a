#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that orders in-range enemies for each tower.

use std::cmp::Reverse;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rocket_td_core::{
    Command, EnemyId, EnemyView, Health, TargetingStrategy, TilePoint, TowerSnapshot,
};

/// Configuration parameters required to construct the targeting system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration seeding the shuffle used by
    /// [`TargetingStrategy::Random`].
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: EnemyId,
    health: Health,
}

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug)]
pub struct TowerTargeting {
    rng: ChaCha8Rng,
    candidates: Vec<Candidate>,
    ordered: Vec<EnemyId>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            candidates: Vec::new(),
            ordered: Vec::new(),
        }
    }

    /// Fills `out` with the ids of every targetable enemy within `range` of
    /// `origin`, ordered by the strategy.
    ///
    /// Enemies that were destroyed or finished the path are never candidates.
    /// Health orderings are stable, so ties keep spawn order.
    pub fn select_targets(
        &mut self,
        strategy: TargetingStrategy,
        origin: TilePoint,
        range: f32,
        enemies: &EnemyView,
        out: &mut Vec<EnemyId>,
    ) {
        out.clear();
        self.candidates.clear();

        for enemy in enemies.iter() {
            if !enemy.is_targetable() || origin.distance(enemy.position) > range {
                continue;
            }
            self.candidates.push(Candidate {
                id: enemy.id,
                health: enemy.health,
            });
        }

        match strategy {
            TargetingStrategy::LowestHealth => {
                self.candidates.sort_by_key(|candidate| candidate.health);
            }
            TargetingStrategy::HighestHealth => {
                self.candidates
                    .sort_by_key(|candidate| Reverse(candidate.health));
            }
            TargetingStrategy::Random => self.candidates.shuffle(&mut self.rng),
            TargetingStrategy::InsertionOrder => {}
        }

        out.extend(self.candidates.iter().map(|candidate| candidate.id));
    }

    /// Chooses the enemy a tower should engage next, if any is in range.
    ///
    /// Range is measured from the tower tile's corner, not its centre.
    pub fn acquire(&mut self, tower: &TowerSnapshot, enemies: &EnemyView) -> Option<EnemyId> {
        let origin = TilePoint::new(tower.tile.column() as f32, tower.tile.row() as f32);
        let mut ordered = std::mem::take(&mut self.ordered);
        self.select_targets(
            tower.strategy,
            origin,
            tower.upgrades.range(),
            enemies,
            &mut ordered,
        );
        let target = ordered.first().copied();
        self.ordered = ordered;

        if let Some(enemy) = target {
            tracing::trace!(
                tower = tower.id.get(),
                enemy = enemy.get(),
                strategy = ?tower.strategy,
                "target selected"
            );
        }
        target
    }

    /// Emits an assignment when the tower is not engaged with a live target.
    ///
    /// A target that is missing from `enemies`, destroyed or past the end of
    /// the path counts as no target at all.
    pub fn handle(&mut self, tower: &TowerSnapshot, enemies: &EnemyView, out: &mut Vec<Command>) {
        if is_engaged(tower, enemies) {
            return;
        }
        if let Some(enemy) = self.acquire(tower, enemies) {
            out.push(Command::AssignTarget {
                tower: tower.id,
                enemy,
            });
        }
    }
}

/// Reports whether the tower's current target is still worth shooting at.
#[must_use]
pub fn is_engaged(tower: &TowerSnapshot, enemies: &EnemyView) -> bool {
    tower
        .target
        .and_then(|enemy| enemies.get(enemy))
        .is_some_and(|enemy| enemy.is_targetable())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use rocket_td_core::{
        EnemyKind, EnemySnapshot, Gold, TileCoord, TowerBlueprint, TowerId, TowerKind,
    };

    fn enemy(id: u32, position: (f32, f32), health: u32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Basic,
            position: TilePoint::new(position.0, position.1),
            rotation: 0.0,
            health: Health::new(health),
            max_health: Health::new(100),
            kill_bonus: Gold::new(10),
            path_index: 1,
            destroyed: false,
            finished_path: false,
        }
    }

    fn tower(id: u32, strategy: TargetingStrategy, target: Option<EnemyId>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Rocket,
            tile: TileCoord::new(0, 0),
            strategy,
            target,
            rotation: 0.0,
            reload_left: Duration::ZERO,
            upgrades: TowerBlueprint::rocket().upgrades,
        }
    }

    fn crowd() -> EnemyView {
        EnemyView::from_snapshots(vec![
            enemy(1, (1.5, 0.5), 40),
            enemy(2, (2.5, 0.5), 90),
            enemy(3, (0.5, 2.5), 40),
            enemy(4, (0.5, 1.5), 10),
        ])
    }

    fn ordered(strategy: TargetingStrategy) -> Vec<u32> {
        let mut system = TowerTargeting::new(Config::new(7));
        let mut out = Vec::new();
        system.select_targets(strategy, TilePoint::new(0.0, 0.0), 3.0, &crowd(), &mut out);
        out.into_iter().map(|id| id.get()).collect()
    }

    #[test]
    fn insertion_order_keeps_spawn_order() {
        assert_eq!(ordered(TargetingStrategy::InsertionOrder), vec![1, 2, 3, 4]);
    }

    #[test]
    fn health_orderings_are_stable() {
        assert_eq!(ordered(TargetingStrategy::LowestHealth), vec![4, 1, 3, 2]);
        assert_eq!(ordered(TargetingStrategy::HighestHealth), vec![2, 1, 3, 4]);
    }

    #[test]
    fn random_order_is_a_seeded_permutation() {
        let first = ordered(TargetingStrategy::Random);
        let second = ordered(TargetingStrategy::Random);
        assert_eq!(first, second);

        let mut sorted = first;
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4]);
    }

    #[test]
    fn enemies_out_of_range_or_gone_are_excluded() {
        let mut finished = enemy(2, (1.5, 0.5), 50);
        finished.finished_path = true;
        let mut destroyed = enemy(3, (1.5, 0.5), 0);
        destroyed.destroyed = true;
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, (3.2, 0.5), 50),
            finished,
            destroyed,
            enemy(4, (2.9, 0.5), 50),
        ]);

        let mut system = TowerTargeting::new(Config::new(1));
        let mut out = Vec::new();
        system.select_targets(
            TargetingStrategy::InsertionOrder,
            TilePoint::new(0.0, 0.0),
            3.0,
            &enemies,
            &mut out,
        );

        assert_eq!(out, vec![EnemyId::new(4)]);
    }

    #[test]
    fn range_is_measured_from_the_tile_corner() {
        let mut system = TowerTargeting::new(Config::new(5));
        let idle = tower(0, TargetingStrategy::InsertionOrder, None);

        let beyond = EnemyView::from_snapshots(vec![enemy(1, (3.2, 0.5), 50)]);
        assert_eq!(system.acquire(&idle, &beyond), None);

        let within =
            EnemyView::from_snapshots(vec![enemy(1, (3.2, 0.5), 50), enemy(2, (2.9, 0.5), 50)]);
        assert_eq!(system.acquire(&idle, &within), Some(EnemyId::new(2)));
    }

    #[test]
    fn handle_only_assigns_idle_towers() {
        let mut system = TowerTargeting::new(Config::new(3));
        let towers = [
            tower(0, TargetingStrategy::LowestHealth, None),
            tower(1, TargetingStrategy::HighestHealth, Some(EnemyId::new(1))),
            tower(2, TargetingStrategy::HighestHealth, None),
        ];
        let enemies = crowd();
        let mut out = Vec::new();

        for tower in &towers {
            system.handle(tower, &enemies, &mut out);
        }

        assert_eq!(
            out,
            vec![
                Command::AssignTarget {
                    tower: TowerId::new(0),
                    enemy: EnemyId::new(4),
                },
                Command::AssignTarget {
                    tower: TowerId::new(2),
                    enemy: EnemyId::new(2),
                },
            ]
        );
    }

    #[test]
    fn stale_targets_are_replaced() {
        let mut finished = enemy(1, (1.5, 0.5), 40);
        finished.finished_path = true;
        let mut destroyed = enemy(2, (2.5, 0.5), 0);
        destroyed.destroyed = true;
        let enemies =
            EnemyView::from_snapshots(vec![finished, destroyed, enemy(3, (0.5, 1.5), 70)]);

        let mut system = TowerTargeting::new(Config::new(9));
        let mut out = Vec::new();
        for (id, target) in [(0, 1), (1, 2), (2, 42)] {
            let stale = tower(
                id,
                TargetingStrategy::InsertionOrder,
                Some(EnemyId::new(target)),
            );
            assert!(!is_engaged(&stale, &enemies));
            system.handle(&stale, &enemies, &mut out);
        }

        let engaged = tower(3, TargetingStrategy::InsertionOrder, Some(EnemyId::new(3)));
        assert!(is_engaged(&engaged, &enemies));
        system.handle(&engaged, &enemies, &mut out);

        let assigned: Vec<_> = out
            .iter()
            .map(|command| match command {
                Command::AssignTarget { tower, enemy } => (tower.get(), enemy.get()),
                other => panic!("unexpected command {other:?}"),
            })
            .collect();
        assert_eq!(assigned, vec![(0, 3), (1, 3), (2, 3)]);
    }

    #[test]
    fn empty_level_yields_no_target() {
        let mut system = TowerTargeting::new(Config::new(3));
        let idle = tower(0, TargetingStrategy::Random, None);
        assert_eq!(system.acquire(&idle, &EnemyView::default()), None);
    }
}
