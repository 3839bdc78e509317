//! The gridded dataset collaborator interface.
//!
//! The core does not define a file format itself; it depends only on this
//! contract, which a self-describing gridded format (NetCDF and friends)
//! implements in glue code outside this workspace.

use serde::{Deserialize, Serialize};

use crate::array::{element_count, NdArray};
use crate::error::Result;

/// Metadata describing one variable of a gridded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridVariable {
    /// Variable name as it appears in the dataset.
    pub name: String,
    /// Ordered dimension names, outermost first.
    pub dimensions: Vec<String>,
    /// Dimension sizes, matching `dimensions`.
    pub shape: Vec<usize>,
    /// Fill/missing value sentinel, if declared.
    pub fill_value: Option<f64>,
    /// Physical units string, if declared.
    pub units: Option<String>,
}

impl GridVariable {
    /// The number of dimensions.
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// The total number of elements.
    pub fn element_count(&self) -> usize {
        element_count(&self.shape)
    }

    /// Whether a value is a real observation rather than the fill sentinel.
    pub fn is_valid(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        match self.fill_value {
            Some(fill) => value != fill,
            None => true,
        }
    }
}

/// Read access to a self-describing gridded dataset.
///
/// All reads are ordinary blocking calls; the core is single-threaded and
/// performs no asynchronous I/O.
pub trait GriddedDataset {
    /// Identifier used in error messages (a file path for file-backed
    /// datasets).
    fn path(&self) -> &str;

    /// Size of a named dimension, if present.
    fn dimension_size(&self, name: &str) -> Option<usize>;

    /// A global (dataset-level) string attribute.
    fn global_attribute(&self, name: &str) -> Option<String>;

    /// Metadata for a named variable, or `None` if absent.
    fn get_variable(&self, name: &str) -> Option<GridVariable>;

    /// A per-variable string attribute.
    fn variable_attribute(&self, name: &str, attr: &str) -> Option<String>;

    /// Ordered dimension names of a variable.
    fn dimension_names_of(&self, name: &str) -> Option<Vec<String>>;

    /// Names of every variable, in dataset order.
    fn variable_names(&self) -> Vec<String>;

    /// Read a hyper-rectangular slice of a variable.
    fn read_slice(&self, name: &str, origin: &[usize], shape: &[usize]) -> Result<NdArray>;

    /// Read the full extent of a variable.
    fn read_all(&self, name: &str) -> Result<NdArray>;

    /// Whether the named variable is a plain 1-D coordinate axis.
    fn is_coordinate_variable(&self, name: &str) -> bool {
        self.get_variable(name).map(|v| v.rank() == 1).unwrap_or(false)
    }

    /// Whether the named variable carries a `coordinates` attribute, which
    /// marks it as a reference/observation variable rather than an axis.
    fn has_coordinates_attribute(&self, name: &str) -> bool {
        self.variable_attribute(name, "coordinates").is_some()
    }

    /// Release backing handles. Must be idempotent.
    fn close(&mut self);
}
