//! PDF Page Tree Parser
//!
//! The page tree organizes pages in a PDF document as a hierarchy of
//! `/Pages` nodes with `/Page` leaves:
//!
//! - **Page Tree Nodes**: internal nodes whose `/Kids` hold other nodes or pages
//! - **Page Objects**: leaves representing individual pages
//! - **Inherited Properties**: `/Resources`, `/MediaBox`, `/CropBox` and
//!   `/Rotate` may be set on any ancestor and apply to every page below it

use super::{ParseError, ParseResult};
use crate::objects::{Object, ObjectId};
use std::collections::{BTreeMap, HashSet};

/// Page attributes that may be inherited from ancestor nodes
pub const INHERITABLE_KEYS: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Deepest `/Parent` chain followed when resolving inherited attributes
const MAX_PARENT_DEPTH: usize = 64;

/// Walk the page tree below `root` and return page ids in document order.
///
/// A node reached twice (for example through a `/Kids` entry pointing back
/// at an ancestor) fails with [`ParseError::CircularReference`].
pub fn collect_pages(
    objects: &BTreeMap<ObjectId, Object>,
    root: ObjectId,
) -> ParseResult<Vec<ObjectId>> {
    let mut pages = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            return Err(ParseError::CircularReference(id));
        }

        let dict = objects
            .get(&id)
            .ok_or_else(|| ParseError::dangling(id))?
            .as_dict()
            .ok_or_else(|| {
                ParseError::syntax(0, format!("Page tree node {id} is not a dictionary"))
            })?;

        let kids = dict.get("Kids").and_then(Object::as_array);
        let is_node = dict.has_type("Pages") || (!dict.has_type("Page") && kids.is_some());

        if !is_node {
            pages.push(id);
            continue;
        }

        // Push in reverse so the first kid is visited first
        for kid in kids.into_iter().flatten().rev() {
            match kid {
                Object::Reference(kid_id) => stack.push(*kid_id),
                other => tracing::warn!(
                    "Ignoring {} in /Kids of page tree node {}",
                    other.type_name(),
                    id
                ),
            }
        }
    }

    tracing::debug!("Page tree has {} pages", pages.len());
    Ok(pages)
}

/// Look up `key` on `page`, falling back to its ancestors for the
/// inheritable attributes.
pub fn inherited_attribute<'a>(
    objects: &'a BTreeMap<ObjectId, Object>,
    page: ObjectId,
    key: &str,
) -> Option<&'a Object> {
    let mut current = objects.get(&page)?.as_dict()?;
    if let Some(value) = current.get(key) {
        return Some(value);
    }
    if !INHERITABLE_KEYS.contains(&key) {
        return None;
    }

    for _ in 0..MAX_PARENT_DEPTH {
        let parent = current.get_reference("Parent")?;
        current = objects.get(&parent)?.as_dict()?;
        if let Some(value) = current.get(key) {
            return Some(value);
        }
    }
    None
}
