use crate::error::{Error, Result};
use crate::tree::Tree;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A [`Tree`] that can be shared between threads.
///
/// Insertion, assignment and teardown hold the write lock for their whole run, so no
/// reader ever sees a half-finished rotation. Searches and traversals share the read
/// lock. Node indices never leave the lock; lookups hand back keys instead.
///
/// A writer that panics leaves the lock poisoned and the tree possibly torn; every
/// later call then fails with [`Error::Poisoned`].
#[derive(Debug)]
pub struct SyncTree<K> {
    inner: RwLock<Tree<K>>,
}

impl<K> SyncTree<K> {
    pub fn new() -> Self {
        SyncTree {
            inner: RwLock::new(Tree::new()),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    pub fn into_inner(self) -> Result<Tree<K>> {
        self.inner.into_inner().map_err(|_| Error::Poisoned)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tree<K>>> {
        self.inner.read().map_err(|_| Error::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tree<K>>> {
        self.inner.write().map_err(|_| Error::Poisoned)
    }
}

impl<K: Ord + fmt::Debug> SyncTree<K> {
    pub fn insert(&self, key: K) -> Result<()> {
        self.write()?.insert(key);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.read()?.validate()
    }
}

impl<K: PartialEq> SyncTree<K> {
    /// Same root-only matching as [`Tree::contains`].
    pub fn contains(&self, key: &K) -> Result<bool> {
        Ok(self.read()?.contains(key))
    }
}

impl<K: Ord + Clone> SyncTree<K> {
    /// Returns a copy of the stored key equal to `key`, if any.
    pub fn find(&self, key: &K) -> Result<Option<K>> {
        let tree = self.read()?;
        Ok(tree
            .find(key)
            .and_then(|node| tree.node(node))
            .map(|node| node.key().clone()))
    }
}

impl<K: Clone> SyncTree<K> {
    pub fn in_order(&self) -> Result<Option<Vec<K>>> {
        Ok(self.read()?.in_order())
    }

    /// Deep copy of the current contents.
    pub fn snapshot(&self) -> Result<Tree<K>> {
        Ok(self.read()?.clone())
    }

    /// Replace the contents with a deep copy of `source`.
    pub fn assign(&self, source: &Tree<K>) -> Result<()> {
        self.write()?.clone_from(source);
        Ok(())
    }
}

impl<K> Default for SyncTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> From<Tree<K>> for SyncTree<K> {
    fn from(tree: Tree<K>) -> Self {
        SyncTree {
            inner: RwLock::new(tree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_inserts() {
        let tree = Arc::new(SyncTree::new());

        let writers: Vec<_> = (0..4)
            .map(|worker| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..100 {
                        tree.insert(i * 4 + worker).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(tree.len().unwrap(), 400);
        assert_eq!(tree.validate(), Ok(()));
        assert_eq!(tree.in_order().unwrap(), Some((0..400).collect()));
        assert_eq!(tree.find(&123).unwrap(), Some(123));
        assert_eq!(tree.find(&400).unwrap(), None);
    }

    #[test]
    fn readers_see_whole_trees() {
        let tree = Arc::new(SyncTree::new());

        let writer = {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                for i in 0..500 {
                    tree.insert(i).unwrap();
                }
            })
        };
        let reader = {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(tree.validate(), Ok(()));
                    let snapshot = tree.snapshot().unwrap();
                    assert_eq!(snapshot.validate(), Ok(()));
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();

        assert_eq!(tree.len().unwrap(), 500);
    }

    #[test]
    fn assign_and_clear() {
        let tree = SyncTree::from(vec![5, 1, 9].into_iter().collect::<Tree<i32>>());
        assert!(tree.contains(&5).unwrap());

        let source: Tree<i32> = (10..15).collect();
        tree.assign(&source).unwrap();
        assert_eq!(tree.in_order().unwrap(), Some(vec![10, 11, 12, 13, 14]));

        tree.clear().unwrap();
        assert!(tree.is_empty().unwrap());
        assert_eq!(tree.in_order().unwrap(), None);
        assert!(tree.into_inner().unwrap().is_empty());
    }

    #[test]
    fn panicking_writer_poisons_the_tree() {
        let tree = Arc::new(SyncTree::<i32>::new());
        tree.insert(1).unwrap();

        let poisoner = {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let _guard = tree.inner.write().unwrap();
                panic!("writer died mid-update");
            })
        };
        assert!(poisoner.join().is_err());

        assert_eq!(tree.insert(2), Err(Error::Poisoned));
        assert_eq!(tree.len(), Err(Error::Poisoned));
        assert_eq!(tree.in_order(), Err(Error::Poisoned));
    }
}
