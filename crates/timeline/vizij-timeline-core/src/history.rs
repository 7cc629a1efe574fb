//! Append-only history with structural sharing.
//!
//! `push` returns a new history that shares every existing node with the old
//! one, so a Scene and all Scenes branched from it can hold their histories
//! side by side without copying.

use std::rc::Rc;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<Rc<Node<T>>>,
}

#[derive(Debug)]
pub struct History<T> {
    head: Option<Rc<Node<T>>>,
    len: usize,
}

impl<T> Clone for History<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self { head: None, len: 0 }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// New history with `value` appended; `self` is left untouched.
    pub fn push(&self, value: T) -> Self {
        Self {
            head: Some(Rc::new(Node {
                value,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries in append order.
    pub fn to_vec(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            out.push(&node.value);
            cursor = node.prev.as_deref();
        }
        out.reverse();
        out
    }

    /// Entry at `index` in append order.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let mut cursor = self.head.as_deref();
        for _ in 0..(self.len - 1 - index) {
            cursor = cursor.and_then(|node| node.prev.as_deref());
        }
        cursor.map(|node| &node.value)
    }
}

impl<T> Drop for History<T> {
    // Unlink iteratively so long histories do not overflow the stack on drop.
    fn drop(&mut self) {
        let mut cursor = self.head.take();
        while let Some(node) = cursor {
            match Rc::try_unwrap(node) {
                Ok(mut node) => cursor = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}
