//! Pure rules for the three-level category hierarchy.
//!
//! Both the service handlers and the client form run these functions over a
//! flat list of one user's categories.

use std::collections::HashMap;

use crate::constants::*;
use crate::models::{Category, CategoryNode};

/// A hierarchy rule a prospective parent assignment would break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeViolation {
    ParentNotFound,
    Circular,
    /// `depth` is the depth the deepest moved node would end up at.
    DepthExceeded { depth: u32 },
}

impl TreeViolation {
    pub fn code(&self) -> &'static str {
        match self {
            TreeViolation::ParentNotFound => CATEGORY_NOT_FOUND,
            TreeViolation::Circular => CATEGORY_CIRCULAR_RELATIONSHIP,
            TreeViolation::DepthExceeded { .. } => CATEGORY_DEPTH_EXCEEDED,
        }
    }
}

pub fn find(all: &[Category], id: i64) -> Option<&Category> {
    all.iter().find(|c| c.id == id)
}

/// Depth of `category` in `all`. A chain that loops or leaves the list stops counting there.
pub fn depth(category: &Category, all: &[Category]) -> u32 {
    let mut depth = 0;
    let mut current = category.parent_id;
    while let Some(parent_id) = current {
        if depth as usize >= all.len() {
            break;
        }
        match find(all, parent_id) {
            Some(parent) => {
                depth += 1;
                current = parent.parent_id;
            }
            None => break,
        }
    }
    depth
}

/// True when walking up from `candidate_id` reaches `ancestor_id`.
pub fn is_descendant(candidate_id: i64, ancestor_id: i64, all: &[Category]) -> bool {
    let mut current = find(all, candidate_id).and_then(|c| c.parent_id);
    let mut steps = 0;
    while let Some(parent_id) = current {
        if parent_id == ancestor_id {
            return true;
        }
        steps += 1;
        if steps > all.len() {
            return false;
        }
        current = find(all, parent_id).and_then(|c| c.parent_id);
    }
    false
}

/// Number of levels below `id`: 0 for a leaf, 1 when it only has leaf children.
pub fn subtree_height(id: i64, all: &[Category]) -> u32 {
    fn height(id: i64, all: &[Category], budget: usize) -> u32 {
        if budget == 0 {
            return 0;
        }
        all.iter()
            .filter(|c| c.parent_id == Some(id))
            .map(|c| 1 + height(c.id, all, budget - 1))
            .max()
            .unwrap_or(0)
    }
    height(id, all, all.len())
}

pub fn has_children(id: i64, all: &[Category]) -> bool {
    all.iter().any(|c| c.parent_id == Some(id))
}

/// Checks that putting `moving` (or a new leaf when `None`) under `parent_id`
/// keeps the tree acyclic and no deeper than [`MAX_CATEGORY_DEPTH`].
pub fn validate_parent(
    moving: Option<&Category>,
    parent_id: Option<i64>,
    all: &[Category],
) -> Result<(), TreeViolation> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let parent = find(all, parent_id).ok_or(TreeViolation::ParentNotFound)?;

    let height = match moving {
        Some(category) => {
            if category.id == parent_id || is_descendant(parent_id, category.id, all) {
                return Err(TreeViolation::Circular);
            }
            subtree_height(category.id, all)
        }
        None => 0,
    };

    let deepest = depth(parent, all) + 1 + height;
    if deepest > MAX_CATEGORY_DEPTH {
        return Err(TreeViolation::DepthExceeded { depth: deepest });
    }
    Ok(())
}

/// Categories that may be offered as a parent for `editing` (or for a new
/// category when `None`): never the category itself or one of its
/// descendants, and never a node that would push the subtree past the depth cap.
pub fn parent_candidates<'a>(all: &'a [Category], editing: Option<&Category>) -> Vec<&'a Category> {
    all.iter()
        .filter(|candidate| validate_parent(editing, Some(candidate.id), all).is_ok())
        .collect()
}

/// Returns `all` with every `depth` field recomputed.
pub fn with_depths(mut all: Vec<Category>) -> Vec<Category> {
    let depths: Vec<u32> = all.iter().map(|c| depth(c, &all)).collect();
    for (category, d) in all.iter_mut().zip(depths) {
        category.depth = d;
    }
    all
}

/// Nests a flat list into root nodes. Siblings are ordered by name, case-insensitively.
pub fn build_tree(all: &[Category]) -> Vec<CategoryNode> {
    let mut by_parent: HashMap<Option<i64>, Vec<&Category>> = HashMap::new();
    for category in all {
        let parent = category
            .parent_id
            .filter(|parent_id| find(all, *parent_id).is_some());
        by_parent.entry(parent).or_default().push(category);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|c| (c.name.to_lowercase(), c.id));
    }

    fn nodes(
        parent: Option<i64>,
        by_parent: &HashMap<Option<i64>, Vec<&Category>>,
        level: u32,
    ) -> Vec<CategoryNode> {
        by_parent
            .get(&parent)
            .map(|siblings| {
                siblings
                    .iter()
                    .map(|category| {
                        let mut category = (*category).clone();
                        category.depth = level;
                        let children = nodes(Some(category.id), by_parent, level + 1);
                        CategoryNode { category, children }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    nodes(None, &by_parent, 0)
}
