//! Ready-made worlds and catalogs.

use voxbot_core::{BlockId, ItemCatalog, ItemRule, Position, RecipeGrid};
use voxbot_world::{SimConfig, SimWorld};

/// Open flat ground at `y = 0` with the player at the origin.
pub fn flat_world() -> SimWorld {
    SimWorld::new(SimConfig::default())
}

/// Flat ground with a wall of `block` at `x`, spanning `z_from..=z_to` and
/// `height` cells up.
pub fn wall_world(x: i32, z_from: i32, z_to: i32, height: i32, block: &str) -> SimWorld {
    let mut world = flat_world();
    world.fill(
        Position::new(x, 0, z_from),
        Position::new(x, height - 1, z_to),
        block,
    );
    world
}

/// 32x32 arena whose diagonal is cut by a tall stone column at `x = 15`.
pub fn column_arena() -> SimWorld {
    wall_world(15, 0, 24, 4, "stone")
}

/// Flat ground with a row of `count` oak logs starting two cells east of the player.
pub fn forest_world(count: i32) -> SimWorld {
    let mut world = flat_world();
    for i in 0..count {
        world.set_block(Position::new(2 + i * 2, 0, 3), "oak_log");
    }
    world
}

/// Minimal catalog: `oak_log` is mined and `planks` are crafted 1 log to 4.
pub fn planks_catalog() -> ItemCatalog {
    ItemCatalog::new()
        .with_rule(
            "oak_log",
            ItemRule::Mined {
                block: BlockId::new("oak_log"),
                tool: None,
                tier: None,
                yield_per_block: 1,
            },
        )
        .with_rule(
            "planks",
            ItemRule::Crafted {
                recipe: RecipeGrid::from_names([["oak_log", "", ""], ["", "", ""], ["", "", ""]]),
                yield_per_craft: 4,
            },
        )
}

/// Two items crafted from each other.
pub fn cyclic_catalog() -> ItemCatalog {
    ItemCatalog::new()
        .with_rule(
            "egg",
            ItemRule::Crafted {
                recipe: RecipeGrid::from_names([["hen", "", ""], ["", "", ""], ["", "", ""]]),
                yield_per_craft: 1,
            },
        )
        .with_rule(
            "hen",
            ItemRule::Crafted {
                recipe: RecipeGrid::from_names([["egg", "", ""], ["", "", ""], ["", "", ""]]),
                yield_per_craft: 1,
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxbot_world::WorldQuery;

    #[test]
    fn column_blocks_the_diagonal() {
        let world = column_arena();
        assert_eq!(world.block_at(Position::new(15, 3, 12)).unwrap().as_str(), "stone");
        assert!(world.block_at(Position::new(15, 4, 12)).unwrap().is_air());
        assert!(world.block_at(Position::new(15, 0, 25)).unwrap().is_air());
    }

    #[test]
    fn catalogs_resolve_their_items() {
        assert_eq!(planks_catalog().len(), 2);
        assert!(cyclic_catalog().rule(&"egg".into()).is_some());
    }
}
