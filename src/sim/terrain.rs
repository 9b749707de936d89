//! Static terrain: arena walls and obstacles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::rect_vertices;
use super::physics::{BodyHandle, ColliderHandle, Engine, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerrainId(pub u32);

impl TerrainId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An axis-aligned static rectangle
#[derive(Debug, Clone)]
pub struct Terrain {
    pub id: TerrainId,
    pub body: BodyHandle,
    pub collider: ColliderHandle,
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Terrain {
    pub fn spawn(engine: &mut Engine, id: TerrainId, center: Vec2, half_extents: Vec2) -> Self {
        let body = engine.add_static_body(center);
        let collider = engine.add_collider(body, Shape::Rect { half_extents }, false);
        Self {
            id,
            body,
            collider,
            center,
            half_extents,
        }
    }

    pub fn vertices(&self) -> [Vec2; 4] {
        rect_vertices(self.center, self.half_extents)
    }
}

/// Center/half-extent pairs for four walls enclosing a centered arena
pub fn arena_walls(width: f32, height: f32, thickness: f32) -> [(Vec2, Vec2); 4] {
    let (hw, hh, ht) = (width / 2.0, height / 2.0, thickness / 2.0);
    [
        (Vec2::new(0.0, -hh - ht), Vec2::new(hw + thickness, ht)),
        (Vec2::new(0.0, hh + ht), Vec2::new(hw + thickness, ht)),
        (Vec2::new(-hw - ht, 0.0), Vec2::new(ht, hh + thickness)),
        (Vec2::new(hw + ht, 0.0), Vec2::new(ht, hh + thickness)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walls_enclose_arena() {
        let walls = arena_walls(200.0, 100.0, 10.0);
        // Inner faces sit exactly on the arena boundary
        assert_eq!(walls[0].0.y + walls[0].1.y, -50.0);
        assert_eq!(walls[1].0.y - walls[1].1.y, 50.0);
        assert_eq!(walls[2].0.x + walls[2].1.x, -100.0);
        assert_eq!(walls[3].0.x - walls[3].1.x, 100.0);
    }
}
