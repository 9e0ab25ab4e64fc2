//! Nested transparent media along one primary ray.
//!
//! The stack is a persistent cons list: pushing or popping returns a new
//! stack that shares its tail with the old one, so sibling branches of the
//! recursion each keep their own history without copying.

use std::rc::Rc;

/// Refractive index of the space outside every object.
pub const VACUUM_INDEX: f32 = 1.0;

#[derive(Debug)]
struct Entry {
    object_id: usize,
    index: f32,
    below: Option<Rc<Entry>>,
}

/// Stack of objects the ray is currently inside, innermost on top.
#[derive(Debug, Clone, Default)]
pub struct MediumStack {
    top: Option<Rc<Entry>>,
}

/// Result of crossing a surface.
#[derive(Debug, Clone)]
pub struct Crossing {
    /// Medium history on the far side of the surface
    pub stack: MediumStack,
    /// Index of the medium being left
    pub from_index: f32,
    /// Index of the medium being entered
    pub to_index: f32,
}

impl Crossing {
    /// Relative index `from / to` used by Snell's law.
    pub fn mu(&self) -> f32 {
        self.from_index / self.to_index
    }
}

impl MediumStack {
    /// Empty stack: the ray starts in vacuum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the innermost medium, or vacuum.
    pub fn current_index(&self) -> f32 {
        self.top.as_ref().map_or(VACUUM_INDEX, |e| e.index)
    }

    /// Object the ray is innermost inside.
    pub fn top_object(&self) -> Option<usize> {
        self.top.as_ref().map(|e| e.object_id)
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.top.as_deref();
        while let Some(entry) = cursor {
            depth += 1;
            cursor = entry.below.as_deref();
        }
        depth
    }

    #[must_use]
    pub fn push(&self, object_id: usize, index: f32) -> Self {
        Self {
            top: Some(Rc::new(Entry {
                object_id,
                index,
                below: self.top.clone(),
            })),
        }
    }

    #[must_use]
    pub fn pop(&self) -> Self {
        Self {
            top: self.top.as_ref().and_then(|e| e.below.clone()),
        }
    }

    /// Cross the surface of `object_id`.
    ///
    /// Hitting the object on top of the stack means leaving it; anything
    /// else means entering a new medium of `material_index`.
    pub fn cross(&self, object_id: usize, material_index: f32) -> Crossing {
        let from_index = self.current_index();
        if self.top_object() == Some(object_id) {
            let stack = self.pop();
            let to_index = stack.current_index();
            Crossing {
                stack,
                from_index,
                to_index,
            }
        } else {
            Crossing {
                stack: self.push(object_id, material_index),
                from_index,
                to_index: material_index,
            }
        }
    }
}
