//! The variable store and its size-bounded eviction cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::debug;
use validation_common::{GridVariable, GriddedDataset, NdArray, Result, ValidationError};

use crate::config::StoreConfig;

/// Shared handle to a cached array.
///
/// The cache stores the same handle it returns, so in-place edits made by a
/// caller are visible to every later read within the cache lifetime. This is
/// an intentional contract: cached arrays are handles to shared backing
/// storage, not copies.
pub type VariableHandle = Arc<RwLock<NdArray>>;

/// One cached read of a variable.
struct CacheEntry {
    data: VariableHandle,
    /// `None` for a full-variable read, `Some((origin, shape))` for a slice.
    region: Option<(Vec<usize>, Vec<usize>)>,
    /// Byte-size estimate used for budget comparisons.
    estimated_bytes: usize,
}

/// Counters describing cache behaviour, for monitoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub estimated_bytes: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lazily loads named variables from one or two backing gridded datasets and
/// caches the arrays under a configured memory budget.
///
/// Lookup order is model dataset first, then the reference dataset when one
/// is attached; a name is `NotFound` only when absent from both.
///
/// Not designed for concurrent access: callers running the store from
/// multiple threads must add their own synchronization.
pub struct VariableStore {
    model: Box<dyn GriddedDataset>,
    reference: Option<Box<dyn GriddedDataset>>,
    cache: HashMap<String, CacheEntry>,
    budget_bytes: usize,
    current_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    closed: bool,
}

impl VariableStore {
    /// Create a store over a single model dataset.
    pub fn new(model: Box<dyn GriddedDataset>, config: StoreConfig) -> Self {
        Self {
            model,
            reference: None,
            cache: HashMap::new(),
            budget_bytes: config.cache_size_bytes(),
            current_bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            closed: false,
        }
    }

    /// Create a store over a model dataset and a separate reference dataset.
    pub fn with_reference(
        model: Box<dyn GriddedDataset>,
        reference: Box<dyn GriddedDataset>,
        config: StoreConfig,
    ) -> Self {
        let mut store = Self::new(model, config);
        store.reference = Some(reference);
        store
    }

    /// The backing model dataset.
    pub fn model_dataset(&self) -> &dyn GriddedDataset {
        self.model.as_ref()
    }

    /// The backing reference dataset, if one is attached.
    pub fn reference_dataset(&self) -> Option<&dyn GriddedDataset> {
        self.reference.as_deref()
    }

    /// The dataset holding reference observations: the attached reference
    /// dataset when present, otherwise the model dataset.
    pub fn observation_dataset(&self) -> &dyn GriddedDataset {
        match &self.reference {
            Some(reference) => reference.as_ref(),
            None => self.model.as_ref(),
        }
    }

    /// Metadata for a named variable from whichever dataset declares it.
    pub fn variable(&self, name: &str) -> Option<GridVariable> {
        self.model
            .get_variable(name)
            .or_else(|| self.reference.as_ref().and_then(|r| r.get_variable(name)))
    }

    /// Size of a named dimension from whichever dataset declares it.
    pub fn dimension_size(&self, name: &str) -> Option<usize> {
        self.model
            .dimension_size(name)
            .or_else(|| self.reference.as_ref().and_then(|r| r.dimension_size(name)))
    }

    /// Units string of a named variable, if declared.
    pub fn units_of(&self, name: &str) -> Option<String> {
        self.variable(name).and_then(|v| v.units)
    }

    /// Read and cache the full extent of a variable.
    ///
    /// A variable that is already fully cached is returned without touching
    /// the backing dataset. The returned handle is the cached storage itself,
    /// not a copy.
    pub fn read(&mut self, name: &str) -> Result<VariableHandle> {
        if let Some(entry) = self.cache.get(name) {
            if entry.region.is_none() {
                self.hits += 1;
                debug!(variable = name, "variable cache hit");
                return Ok(Arc::clone(&entry.data));
            }
        }
        self.misses += 1;

        let array = {
            let (dataset, _) = self
                .dataset_for(name)
                .ok_or_else(|| ValidationError::not_found(name))?;
            dataset.read_all(name)?
        };
        debug!(variable = name, elements = array.len(), "read full variable");
        Ok(self.insert(name, array, None))
    }

    /// Read and cache exactly one hyper-rectangular slice of a variable.
    ///
    /// Re-requesting the identical previously-cached slice returns the cache;
    /// any other slice triggers a fresh read that replaces the entry. The
    /// cache does not merge overlapping partial reads.
    pub fn read_slice(
        &mut self,
        name: &str,
        origin: &[usize],
        shape: &[usize],
    ) -> Result<VariableHandle> {
        if let Some(entry) = self.cache.get(name) {
            if let Some((cached_origin, cached_shape)) = &entry.region {
                if cached_origin == origin && cached_shape == shape {
                    self.hits += 1;
                    debug!(variable = name, "slice cache hit");
                    return Ok(Arc::clone(&entry.data));
                }
            }
        }
        self.misses += 1;

        let array = {
            let (dataset, var) = self
                .dataset_for(name)
                .ok_or_else(|| ValidationError::not_found(name))?;
            if origin.len() != var.rank() || shape.len() != var.rank() {
                return Err(ValidationError::shape_mismatch(
                    name,
                    origin.len().max(shape.len()),
                    var.rank(),
                ));
            }
            dataset.read_slice(name, origin, shape)?
        };
        Ok(self.insert(name, array, Some((origin.to_vec(), shape.to_vec()))))
    }

    /// Read a variable fully and return a copy of its values.
    ///
    /// Convenience over [`read`](Self::read) for callers that only need the
    /// numbers, such as axis lookups.
    pub fn read_values(&mut self, name: &str) -> Result<Vec<f64>> {
        let handle = self.read(name)?;
        let guard = handle.read().expect("variable lock poisoned");
        Ok(guard.values().to_vec())
    }

    /// Read the single cell of a variable at the given index tuple.
    pub fn read_cell(&mut self, name: &str, origin: &[usize]) -> Result<f64> {
        let shape = vec![1; origin.len()];
        let handle = self.read_slice(name, origin, &shape)?;
        let guard = handle.read().expect("variable lock poisoned");
        Ok(guard.values()[0])
    }

    /// Current cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            entries: self.cache.len(),
            estimated_bytes: self.current_bytes,
        }
    }

    /// Drop every cached entry.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.current_bytes = 0;
    }

    /// Release backing dataset handles. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.clear_cache();
        self.model.close();
        if let Some(reference) = self.reference.as_mut() {
            reference.close();
        }
        self.closed = true;
    }

    fn dataset_for(&self, name: &str) -> Option<(&dyn GriddedDataset, GridVariable)> {
        if let Some(var) = self.model.get_variable(name) {
            return Some((self.model.as_ref(), var));
        }
        if let Some(reference) = &self.reference {
            if let Some(var) = reference.get_variable(name) {
                return Some((reference.as_ref(), var));
            }
        }
        None
    }

    fn insert(
        &mut self,
        name: &str,
        array: NdArray,
        region: Option<(Vec<usize>, Vec<usize>)>,
    ) -> VariableHandle {
        let estimated_bytes = array.len() * std::mem::size_of::<f64>();
        let handle: VariableHandle = Arc::new(RwLock::new(array));

        if let Some(old) = self.cache.remove(name) {
            self.current_bytes = self.current_bytes.saturating_sub(old.estimated_bytes);
        }
        self.ensure_capacity(estimated_bytes);

        // An entry larger than the whole budget is never cached; the array is
        // still returned and will be re-read on the next access.
        if estimated_bytes <= self.budget_bytes {
            self.cache.insert(
                name.to_string(),
                CacheEntry {
                    data: Arc::clone(&handle),
                    region,
                    estimated_bytes,
                },
            );
            self.current_bytes += estimated_bytes;
        } else {
            debug!(
                variable = name,
                bytes = estimated_bytes,
                "variable exceeds cache budget, not cached"
            );
        }

        handle
    }

    /// Evict cached entries, largest estimated size first, until the incoming
    /// size fits within the budget or the cache is empty.
    fn ensure_capacity(&mut self, incoming_bytes: usize) {
        while !self.cache.is_empty()
            && self.current_bytes.saturating_add(incoming_bytes) > self.budget_bytes
        {
            let victim = self
                .cache
                .iter()
                .max_by_key(|(_, entry)| entry.estimated_bytes)
                .map(|(name, _)| name.clone());
            let Some(name) = victim else {
                return;
            };
            if let Some(entry) = self.cache.remove(&name) {
                self.current_bytes = self.current_bytes.saturating_sub(entry.estimated_bytes);
                self.evictions += 1;
                debug!(
                    variable = %name,
                    bytes = entry.estimated_bytes,
                    "evicted cached variable"
                );
            }
        }
    }
}

impl Drop for VariableStore {
    fn drop(&mut self) {
        self.close();
    }
}
