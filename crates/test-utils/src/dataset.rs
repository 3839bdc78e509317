//! In-memory `GriddedDataset` implementation for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use validation_common::{GridVariable, GriddedDataset, NdArray, Result, ValidationError};

/// Definition of one variable for the in-memory dataset builder.
#[derive(Debug, Clone)]
pub struct VariableDef {
    name: String,
    dimensions: Vec<String>,
    values: Vec<f64>,
    fill_value: Option<f64>,
    units: Option<String>,
    attributes: HashMap<String, String>,
}

impl VariableDef {
    /// Create a variable definition with row-major values.
    pub fn new(name: &str, dimensions: &[&str], values: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            values: values.to_vec(),
            fill_value: None,
            units: None,
            attributes: HashMap::new(),
        }
    }

    /// Set the fill/missing value sentinel.
    pub fn fill(mut self, fill_value: f64) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    /// Set the physical units string.
    pub fn units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    /// Mark the variable as a reference/observation variable by attaching a
    /// `coordinates` attribute naming its coordinate variables.
    pub fn coordinates(mut self, coordinates: &str) -> Self {
        self.attributes
            .insert("coordinates".to_string(), coordinates.to_string());
        self
    }

    /// Attach an arbitrary string attribute.
    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

struct StoredVariable {
    meta: GridVariable,
    attributes: HashMap<String, String>,
    data: NdArray,
}

/// A `GriddedDataset` backed entirely by memory.
///
/// Counts backing reads so tests can assert that the variable cache avoids
/// re-touching the dataset.
pub struct InMemoryDataset {
    path: String,
    dimensions: Vec<(String, usize)>,
    variables: Vec<StoredVariable>,
    global_attributes: HashMap<String, String>,
    reads: Arc<AtomicU64>,
    closed: bool,
}

impl InMemoryDataset {
    /// Start building a dataset with the given path identifier.
    pub fn builder(path: &str) -> InMemoryDatasetBuilder {
        InMemoryDatasetBuilder {
            path: path.to_string(),
            dimensions: Vec::new(),
            variables: Vec::new(),
            global_attributes: HashMap::new(),
        }
    }

    /// How many times the backing data has been read.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Shared handle to the read counter, usable after the dataset has been
    /// moved behind a `dyn GriddedDataset`.
    pub fn read_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.reads)
    }

    fn stored(&self, name: &str) -> Option<&StoredVariable> {
        self.variables.iter().find(|v| v.meta.name == name)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(ValidationError::backing_dataset(
                &self.path,
                "dataset is closed",
            ));
        }
        Ok(())
    }
}

impl GriddedDataset for InMemoryDataset {
    fn path(&self) -> &str {
        &self.path
    }

    fn dimension_size(&self, name: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, size)| *size)
    }

    fn global_attribute(&self, name: &str) -> Option<String> {
        self.global_attributes.get(name).cloned()
    }

    fn get_variable(&self, name: &str) -> Option<GridVariable> {
        self.stored(name).map(|v| v.meta.clone())
    }

    fn variable_attribute(&self, name: &str, attr: &str) -> Option<String> {
        self.stored(name)?.attributes.get(attr).cloned()
    }

    fn dimension_names_of(&self, name: &str) -> Option<Vec<String>> {
        self.stored(name).map(|v| v.meta.dimensions.clone())
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.meta.name.clone()).collect()
    }

    fn read_slice(&self, name: &str, origin: &[usize], shape: &[usize]) -> Result<NdArray> {
        self.check_open()?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        let stored = self
            .stored(name)
            .ok_or_else(|| ValidationError::not_found(name))?;
        stored.data.slice(origin, shape).ok_or_else(|| {
            ValidationError::backing_dataset(
                &self.path,
                format!(
                    "slice origin {:?} shape {:?} outside variable '{}' shape {:?}",
                    origin,
                    shape,
                    name,
                    stored.meta.shape
                ),
            )
        })
    }

    fn read_all(&self, name: &str) -> Result<NdArray> {
        self.check_open()?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        let stored = self
            .stored(name)
            .ok_or_else(|| ValidationError::not_found(name))?;
        Ok(stored.data.clone())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Builder for [`InMemoryDataset`].
pub struct InMemoryDatasetBuilder {
    path: String,
    dimensions: Vec<(String, usize)>,
    variables: Vec<VariableDef>,
    global_attributes: HashMap<String, String>,
}

impl InMemoryDatasetBuilder {
    /// Declare a dimension.
    pub fn dimension(mut self, name: &str, size: usize) -> Self {
        self.dimensions.push((name.to_string(), size));
        self
    }

    /// Declare a coordinate axis: a dimension plus the 1-D variable of the
    /// same name holding the axis values.
    pub fn coordinate(mut self, name: &str, values: &[f64]) -> Self {
        self.dimensions.push((name.to_string(), values.len()));
        self.variables.push(VariableDef::new(name, &[name], values));
        self
    }

    /// Add a variable.
    ///
    /// # Panics
    /// Panics if the definition names an undeclared dimension or its value
    /// count disagrees with the dimension sizes (a broken test fixture).
    pub fn variable(mut self, def: VariableDef) -> Self {
        self.variables.push(def);
        self
    }

    /// Set a global attribute.
    pub fn global_attribute(mut self, name: &str, value: &str) -> Self {
        self.global_attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Finish building.
    pub fn build(self) -> InMemoryDataset {
        let mut variables = Vec::with_capacity(self.variables.len());
        for def in self.variables {
            let shape: Vec<usize> = def
                .dimensions
                .iter()
                .map(|dim| {
                    self.dimensions
                        .iter()
                        .find(|(n, _)| n == dim)
                        .map(|(_, size)| *size)
                        .unwrap_or_else(|| panic!("undeclared dimension '{}'", dim))
                })
                .collect();
            let data = NdArray::new(shape.clone(), def.values);
            variables.push(StoredVariable {
                meta: GridVariable {
                    name: def.name,
                    dimensions: def.dimensions,
                    shape,
                    fill_value: def.fill_value,
                    units: def.units,
                },
                attributes: def.attributes,
                data,
            });
        }
        InMemoryDataset {
            path: self.path,
            dimensions: self.dimensions,
            variables,
            global_attributes: self.global_attributes,
            reads: Arc::new(AtomicU64::new(0)),
            closed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> InMemoryDataset {
        InMemoryDataset::builder("memory:test")
            .coordinate("lat", &[10.0, 20.0])
            .coordinate("lon", &[0.0, 1.0, 2.0])
            .variable(
                VariableDef::new("sst", &["lat", "lon"], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
                    .fill(-999.0)
                    .units("K"),
            )
            .global_attribute("title", "test grid")
            .build()
    }

    #[test]
    fn test_metadata() {
        let ds = dataset();
        assert_eq!(ds.dimension_size("lat"), Some(2));
        assert_eq!(ds.dimension_size("missing"), None);
        assert_eq!(ds.global_attribute("title").as_deref(), Some("test grid"));

        let var = ds.get_variable("sst").unwrap();
        assert_eq!(var.shape, vec![2, 3]);
        assert_eq!(var.units.as_deref(), Some("K"));
        assert_eq!(var.fill_value, Some(-999.0));
        assert_eq!(
            ds.dimension_names_of("sst"),
            Some(vec!["lat".to_string(), "lon".to_string()])
        );
    }

    #[test]
    fn test_variable_classification() {
        let ds = InMemoryDataset::builder("memory:ref")
            .dimension("record", 2)
            .variable(VariableDef::new("lat_ref", &["record"], &[1.0, 2.0]))
            .variable(
                VariableDef::new("chl_ref", &["record"], &[0.1, 0.2]).coordinates("lat_ref"),
            )
            .build();

        assert!(ds.is_coordinate_variable("lat_ref"));
        assert!(!ds.has_coordinates_attribute("lat_ref"));
        assert!(ds.has_coordinates_attribute("chl_ref"));
    }

    #[test]
    fn test_read_counts() {
        let ds = dataset();
        assert_eq!(ds.read_count(), 0);
        ds.read_all("sst").unwrap();
        ds.read_slice("sst", &[0, 1], &[2, 1]).unwrap();
        assert_eq!(ds.read_count(), 2);
    }

    #[test]
    fn test_read_slice_values() {
        let ds = dataset();
        let slice = ds.read_slice("sst", &[1, 0], &[1, 3]).unwrap();
        assert_eq!(slice.values(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_read_after_close_fails() {
        let mut ds = dataset();
        ds.close();
        ds.close(); // idempotent
        assert!(ds.read_all("sst").is_err());
    }
}
