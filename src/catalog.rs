//! Catalog cache: the data descriptions fetched once per connection
//!
//! The catalog is published through a watch channel holding
//! `Option<Arc<Catalog>>`. Publishing swaps the whole pointer, so a reader on
//! the delivery thread sees either the previous catalog or the new one, never
//! a partially filled list, and never has to lock against a fetch.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::types::{
    AssetDescription, DataDescription, RigidBodyDescription, SkeletonDescription, descriptor,
};

/// An immutable snapshot of the server's data descriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    descriptions: Vec<DataDescription>,
    /// Publish counter, starts at 1 for the first catalog of a cache.
    generation: u64,
}

impl Catalog {
    pub fn new(descriptions: Vec<DataDescription>, generation: u64) -> Self {
        Self { descriptions, generation }
    }

    pub fn descriptions(&self) -> &[DataDescription] {
        &self.descriptions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataDescription> {
        self.descriptions.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DataDescription> {
        self.descriptions.get(index)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Top-level rigid body by streaming id.
    pub fn rigid_body(&self, id: i32) -> Option<&RigidBodyDescription> {
        self.iter().find_map(|description| match description {
            DataDescription::RigidBody(rb) if rb.id == id => Some(rb),
            _ => None,
        })
    }

    pub fn skeleton(&self, id: i32) -> Option<&SkeletonDescription> {
        self.iter().find_map(|description| match description {
            DataDescription::Skeleton(sk) if sk.id == id => Some(sk),
            _ => None,
        })
    }

    pub fn asset(&self, id: i32) -> Option<&AssetDescription> {
        self.iter().find_map(|description| match description {
            DataDescription::Asset(asset) if asset.id == id => Some(asset),
            _ => None,
        })
    }

    /// First entry with this display name.
    pub fn find_by_name(&self, name: &str) -> Option<&DataDescription> {
        self.iter().find(|description| description.name() == Some(name))
    }

    /// Number of entries with the given descriptor tag.
    pub fn count_of(&self, type_code: i32) -> usize {
        self.iter().filter(|description| description.type_code() == type_code).count()
    }

    /// Number of rigid body entries.
    pub fn rigid_body_count(&self) -> usize {
        self.count_of(descriptor::RIGID_BODY)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a DataDescription;
    type IntoIter = std::slice::Iter<'a, DataDescription>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owner side of the catalog: publishes and releases snapshots.
#[derive(Debug)]
pub struct CatalogCache {
    tx: watch::Sender<Option<Arc<Catalog>>>,
    generation: u64,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, generation: 0 }
    }

    /// Replace the catalog with `descriptions` in one step and return the snapshot.
    pub fn publish(&mut self, descriptions: Vec<DataDescription>) -> Arc<Catalog> {
        self.generation += 1;
        let catalog = Arc::new(Catalog::new(descriptions, self.generation));
        self.tx.send_replace(Some(Arc::clone(&catalog)));
        debug!(generation = self.generation, entries = catalog.len(), "Catalog published");
        catalog
    }

    /// Drop the current catalog. Readers holding a snapshot keep it alive.
    pub fn clear(&mut self) {
        if self.tx.send_replace(None).is_some() {
            debug!("Catalog released");
        }
    }

    pub fn current(&self) -> Option<Arc<Catalog>> {
        self.tx.borrow().clone()
    }

    /// Read handle for other threads and tasks.
    pub fn reader(&self) -> CatalogReader {
        CatalogReader { rx: self.tx.subscribe() }
    }
}

/// Cheap, clonable read handle on the published catalog.
#[derive(Debug, Clone)]
pub struct CatalogReader {
    rx: watch::Receiver<Option<Arc<Catalog>>>,
}

impl CatalogReader {
    /// Latest published catalog, `None` before the first fetch or after release.
    pub fn current(&self) -> Option<Arc<Catalog>> {
        self.rx.borrow().clone()
    }

    /// Catalog snapshots as they are published, starting with the current one.
    pub fn updates(&self) -> impl Stream<Item = Arc<Catalog>> + 'static {
        WatchStream::new(self.rx.clone()).filter_map(|catalog| async move { catalog })
    }
}
