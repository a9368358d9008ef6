//! Grid pathfinding for buses
//!
//! Every call reads the live obstacle set, so a blockage created this tick
//! reroutes traffic this tick. Nothing is cached between calls.

use pathfinding::prelude::dijkstra;
use std::collections::HashSet;

use super::city::City;
use super::types::GridPos;

/// Shortest path from `start` to `goal` avoiding blocked cells
///
/// Moves are the four cardinal directions at unit cost. Returns the full
/// cell sequence including both endpoints, `vec![start]` when the two
/// coincide, and an empty vector when no route exists or either endpoint
/// is blocked or off the grid.
pub fn find_path(start: GridPos, goal: GridPos, city: &City) -> Vec<GridPos> {
    if !city.is_valid_position(start) || !city.is_valid_position(goal) {
        return Vec::new();
    }

    let blocked = city.blocked_cells();
    if blocked.contains(&start) || blocked.contains(&goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let result = dijkstra(
        &start,
        |pos| neighbors(*pos, city, &blocked),
        |pos| *pos == goal,
    );

    result.map(|(path, _cost)| path).unwrap_or_default()
}

/// In-bounds, unblocked cardinal neighbors at unit move cost
fn neighbors(pos: GridPos, city: &City, blocked: &HashSet<GridPos>) -> Vec<(GridPos, u32)> {
    const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
    STEPS
        .iter()
        .map(|(dx, dy)| GridPos::new(pos.x + dx, pos.y + dy))
        .filter(|next| city.is_valid_position(*next) && !blocked.contains(next))
        .map(|next| (next, 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_city() -> City {
        City::new(10, 10, vec![]).unwrap()
    }

    #[test]
    fn open_grid_path_has_manhattan_length() {
        let city = open_city();
        let start = GridPos::new(1, 1);
        let goal = GridPos::new(6, 4);
        let path = find_path(start, goal, &city);

        assert_eq!(path.len() as u32, start.manhattan_distance(&goal) + 1);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
    }

    #[test]
    fn consecutive_cells_are_cardinal_neighbors() {
        let city = open_city();
        let path = find_path(GridPos::new(0, 9), GridPos::new(8, 2), &city);
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(&pair[1]), 1);
        }
    }

    #[test]
    fn start_equals_goal_yields_single_cell() {
        let city = open_city();
        let spot = GridPos::new(4, 4);
        assert_eq!(find_path(spot, spot, &city), vec![spot]);
    }

    #[test]
    fn detours_around_a_wall() {
        let mut city = open_city();
        // Wall across x=4 leaving only y=9 open
        city.block_route(GridPos::new(4, 0), GridPos::new(4, 8), 10).unwrap();

        let start = GridPos::new(2, 0);
        let goal = GridPos::new(6, 0);
        let path = find_path(start, goal, &city);

        assert!(!path.is_empty());
        assert!(path.len() > 5, "detour must be longer than the direct walk");
        assert!(path.iter().all(|cell| cell.x != 4 || cell.y == 9));
    }

    #[test]
    fn fully_cut_grid_has_no_path() {
        let mut city = open_city();
        city.block_route(GridPos::new(4, 0), GridPos::new(4, 9), 10).unwrap();
        let path = find_path(GridPos::new(2, 5), GridPos::new(7, 5), &city);
        assert!(path.is_empty());
    }

    #[test]
    fn blocked_endpoints_are_unreachable() {
        let mut city = open_city();
        city.block_route(GridPos::new(3, 3), GridPos::new(3, 3), 10).unwrap();

        assert!(find_path(GridPos::new(3, 3), GridPos::new(0, 0), &city).is_empty());
        assert!(find_path(GridPos::new(0, 0), GridPos::new(3, 3), &city).is_empty());
        assert!(find_path(GridPos::new(3, 3), GridPos::new(3, 3), &city).is_empty());
    }

    #[test]
    fn off_grid_endpoints_have_no_path() {
        let city = open_city();
        assert!(find_path(GridPos::new(-1, 0), GridPos::new(5, 5), &city).is_empty());
        assert!(find_path(GridPos::new(5, 5), GridPos::new(5, 10), &city).is_empty());
    }

    #[test]
    fn expired_blockage_no_longer_diverts() {
        let mut city = open_city();
        city.block_route(GridPos::new(4, 0), GridPos::new(4, 9), 2).unwrap();
        assert!(find_path(GridPos::new(2, 5), GridPos::new(7, 5), &city).is_empty());

        city.age_blocked_routes();
        city.age_blocked_routes();
        let path = find_path(GridPos::new(2, 5), GridPos::new(7, 5), &city);
        assert_eq!(path.len(), 6);
    }
}
