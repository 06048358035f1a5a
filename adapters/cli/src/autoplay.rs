use rocket_td_core::{
    Event, Gold, TargetingStrategy, TileCoord, TileKind, TowerId, TowerKind, UpgradeKind,
};
use rocket_td_system_simulation::Simulation;
use rocket_td_world::{query, Level, World};

use crate::treasury::Treasury;

/// Buildable tiles ordered by Manhattan distance to the spawn.
pub(crate) fn build_sites_near_spawn(level: &Level) -> Vec<TileCoord> {
    let spawn = level.spawn();
    let mut sites: Vec<TileCoord> = level
        .tiles()
        .filter(|(_, tile)| *tile == TileKind::Buildable)
        .map(|(coord, _)| coord)
        .collect();
    sites.sort_by_key(|coord| (coord.manhattan_distance(spawn), *coord));
    sites
}

/// Builds up to `count` rockets near the spawn while gold allows.
pub(crate) fn place_towers(
    simulation: &mut Simulation,
    treasury: &mut Treasury,
    count: usize,
    strategy: TargetingStrategy,
    out_events: &mut Vec<Event>,
) -> usize {
    let sites = build_sites_near_spawn(query::level(simulation.world()));
    let cost = query::tower_build_cost(simulation.world(), TowerKind::Rocket);
    let mut built = 0;
    for tile in sites.into_iter().take(count) {
        if !treasury.try_spend(cost) {
            tracing::info!(gold = treasury.gold().get(), "out of gold for towers");
            break;
        }
        simulation.on_build_tower(TowerKind::Rocket, tile, strategy, out_events);
        built += 1;
    }
    built
}

/// Cheapest upgrade purchase available across all towers.
pub(crate) fn cheapest_upgrade(world: &World) -> Option<(TowerId, UpgradeKind, Gold)> {
    query::tower_view(world)
        .iter()
        .flat_map(|tower| {
            UpgradeKind::ALL.into_iter().filter_map(move |kind| {
                let cost = tower.upgrades.get(kind).next_cost()?;
                Some((tower.id, kind, cost))
            })
        })
        .min_by_key(|(_, _, cost)| *cost)
}

/// Spends gold on upgrades, cheapest first, until nothing is affordable.
pub(crate) fn buy_upgrades(
    simulation: &mut Simulation,
    treasury: &mut Treasury,
    out_events: &mut Vec<Event>,
) -> u32 {
    let mut bought = 0;
    while let Some((tower, upgrade, cost)) = cheapest_upgrade(simulation.world()) {
        if !treasury.try_spend(cost) {
            break;
        }
        simulation.on_upgrade_tower(tower, upgrade, out_events);
        bought += 1;
    }
    bought
}
