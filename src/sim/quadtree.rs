//! Quad-tree broad phase
//!
//! Rebuilt from empty every step, so there is no removal and no incremental
//! update. Items whose bounds straddle a split line stay at the parent node,
//! which is why `retrieve` always returns the items of every node on the
//! path down to the query's quadrant.
//!
//! Results are candidates only: callers still run an exact rectangle test.

use super::rect::Rect;
use crate::consts::{QUAD_TREE_MAX_LEVELS, QUAD_TREE_MAX_OBJECTS};

#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    bounds: Rect,
    sub_width: f32,
    sub_height: f32,
    max_objects: usize,
    max_levels: u32,
    level: u32,
    objects: Vec<(T, Rect)>,
    /// Top right, top left, bottom left, bottom right
    nodes: Option<Box<[QuadTree<T>; 4]>>,
}

impl<T: Copy> Default for QuadTree<T> {
    fn default() -> Self {
        Self::new(
            Rect::new(0.0, 0.0, crate::consts::WORLD_WIDTH, crate::consts::WORLD_HEIGHT),
            QUAD_TREE_MAX_OBJECTS,
            QUAD_TREE_MAX_LEVELS,
        )
    }
}

impl<T: Copy> QuadTree<T> {
    pub fn new(bounds: Rect, max_objects: usize, max_levels: u32) -> Self {
        Self::with_level(bounds, max_objects, max_levels, 0)
    }

    fn with_level(bounds: Rect, max_objects: usize, max_levels: u32, level: u32) -> Self {
        Self {
            bounds,
            sub_width: (bounds.width / 2.0).floor(),
            sub_height: (bounds.height / 2.0).floor(),
            max_objects: max_objects.max(1),
            max_levels,
            level,
            objects: Vec::new(),
            nodes: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Drop everything and cover a new region with new tuning
    pub fn reset(&mut self, bounds: Rect, max_objects: usize, max_levels: u32) {
        *self = Self::with_level(bounds, max_objects, max_levels, self.level);
    }

    /// Drop all items and children, keeping bounds and tuning
    pub fn clear(&mut self) {
        self.objects.clear();
        self.nodes = None;
    }

    /// Total number of stored items
    pub fn len(&self) -> usize {
        self.objects.len()
            + self
                .nodes
                .as_ref()
                .map_or(0, |nodes| nodes.iter().map(QuadTree::len).sum())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of levels currently in use (a lone root is depth 1)
    pub fn depth(&self) -> u32 {
        1 + self
            .nodes
            .as_ref()
            .map_or(0, |nodes| nodes.iter().map(QuadTree::depth).max().unwrap_or(0))
    }

    fn split(&mut self) {
        let Rect { x, y, .. } = self.bounds;
        let (w, h) = (self.sub_width, self.sub_height);
        let (max_objects, max_levels, level) = (self.max_objects, self.max_levels, self.level + 1);
        let child = |cx: f32, cy: f32| {
            QuadTree::with_level(Rect::new(cx, cy, w, h), max_objects, max_levels, level)
        };
        let nodes = Box::new([
            child(x + w, y),
            child(x, y),
            child(x, y + h),
            child(x + w, y + h),
        ]);
        self.nodes = Some(nodes);
    }

    /// Quadrant that fully contains `rect`, or `None` if it straddles a split line
    fn index_of(&self, rect: &Rect) -> Option<usize> {
        let vertical_mid = self.bounds.x + self.sub_width;
        let horizontal_mid = self.bounds.y + self.sub_height;

        let top = rect.y < horizontal_mid && rect.bottom() < horizontal_mid;
        let bottom = rect.y > horizontal_mid;

        if rect.x < vertical_mid && rect.right() < vertical_mid {
            if top {
                return Some(1);
            } else if bottom {
                return Some(2);
            }
        } else if rect.x > vertical_mid {
            if top {
                return Some(0);
            } else if bottom {
                return Some(3);
            }
        }
        None
    }

    pub fn insert(&mut self, item: T, bounds: Rect) {
        if let Some(index) = self.index_of(&bounds) {
            if let Some(nodes) = self.nodes.as_mut() {
                nodes[index].insert(item, bounds);
                return;
            }
        }

        self.objects.push((item, bounds));

        if self.objects.len() > self.max_objects && self.level < self.max_levels {
            if self.nodes.is_none() {
                self.split();
            }
            let objects = std::mem::take(&mut self.objects);
            for (item, bounds) in objects {
                match (self.index_of(&bounds), self.nodes.as_mut()) {
                    (Some(index), Some(nodes)) => nodes[index].insert(item, bounds),
                    _ => self.objects.push((item, bounds)),
                }
            }
        }
    }

    /// Insert every `(item, bounds)` pair
    pub fn populate<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (T, Rect)>,
    {
        for (item, bounds) in items {
            self.insert(item, bounds);
        }
    }

    /// Candidates that may overlap `bounds`
    pub fn retrieve(&self, bounds: &Rect) -> Vec<T> {
        let mut out = Vec::new();
        self.retrieve_into(bounds, &mut out);
        out
    }

    /// Like [`QuadTree::retrieve`], appending to a caller-owned buffer
    pub fn retrieve_into(&self, bounds: &Rect, out: &mut Vec<T>) {
        out.extend(self.objects.iter().map(|(item, _)| *item));

        if let Some(nodes) = self.nodes.as_ref() {
            match self.index_of(bounds) {
                Some(index) => nodes[index].retrieve_into(bounds, out),
                None => {
                    for node in nodes.iter() {
                        node.retrieve_into(bounds, out);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tree() -> QuadTree<usize> {
        QuadTree::new(Rect::new(0.0, 0.0, 800.0, 600.0), 2, 4)
    }

    #[test]
    fn test_splits_once_capacity_exceeded() {
        let mut qt = tree();
        qt.insert(0, Rect::new(10.0, 10.0, 5.0, 5.0));
        qt.insert(1, Rect::new(500.0, 10.0, 5.0, 5.0));
        assert_eq!(qt.depth(), 1);

        qt.insert(2, Rect::new(10.0, 400.0, 5.0, 5.0));
        assert_eq!(qt.depth(), 2);
        assert_eq!(qt.len(), 3);

        // Top-left query only reaches the top-left quadrant
        let found = qt.retrieve(&Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn test_straddling_item_stays_at_parent() {
        let mut qt = tree();
        qt.insert(0, Rect::new(390.0, 290.0, 20.0, 20.0));
        qt.insert(1, Rect::new(10.0, 10.0, 5.0, 5.0));
        qt.insert(2, Rect::new(20.0, 10.0, 5.0, 5.0));

        // Any query, anywhere, sees the centre item
        let far = qt.retrieve(&Rect::new(700.0, 500.0, 5.0, 5.0));
        assert_eq!(far, vec![0]);
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut qt = QuadTree::new(Rect::new(0.0, 0.0, 800.0, 600.0), 1, 3);
        for i in 0..50 {
            qt.insert(i, Rect::new(1.0 + i as f32 * 0.01, 1.0, 0.5, 0.5));
        }
        assert_eq!(qt.len(), 50);
        assert!(qt.depth() <= 4);
    }

    #[test]
    fn test_clear_discards_items_and_children() {
        let mut qt = tree();
        for i in 0..10 {
            qt.insert(i, Rect::new(i as f32 * 70.0, i as f32 * 50.0, 5.0, 5.0));
        }
        qt.clear();
        assert!(qt.is_empty());
        assert_eq!(qt.depth(), 1);
    }

    #[test]
    fn test_degenerate_bounds_do_not_panic() {
        let mut qt = tree();
        qt.insert(0, Rect::new(100.0, 100.0, 0.0, 0.0));
        qt.insert(1, Rect::new(f32::NAN, 5.0, 1.0, 1.0));
        qt.insert(2, Rect::new(600.0, 500.0, 0.0, 3.0));
        qt.insert(3, Rect::new(-50.0, -50.0, 10.0, 10.0));

        assert_eq!(qt.len(), 4);
        let all = qt.retrieve(&Rect::new(f32::NAN, f32::NAN, 1.0, 1.0));
        assert!(!all.is_empty());
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-50.0f32..850.0, -50.0f32..650.0, 0.0f32..120.0, 0.0f32..120.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_retrieve_is_superset_of_exact_overlaps(
            rects in prop::collection::vec(arb_rect(), 1..80),
            max_objects in 1usize..6,
            max_levels in 0u32..6,
        ) {
            let mut qt = QuadTree::new(Rect::new(0.0, 0.0, 800.0, 600.0), max_objects, max_levels);
            qt.populate(rects.iter().copied().enumerate());

            for (i, a) in rects.iter().enumerate() {
                let candidates = qt.retrieve(a);
                for (j, b) in rects.iter().enumerate() {
                    if i != j && a.intersects(b) {
                        prop_assert!(candidates.contains(&j), "pair ({}, {}) missing", i, j);
                    }
                }
            }
        }
    }
}
