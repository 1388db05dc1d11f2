//! Restriction and extension operators
//!
//! The restriction `R_k` of a region is the `(|region|, N)` boolean matrix
//! whose row `i` holds a single 1 in the column of the region's `i`-th DOF.
//! It is stored implicitly as the list of global indices; the explicit CSR
//! form is available for inspection and testing. The extension operator is
//! `R_k^T`: it scatters a local vector into the global space, zero outside
//! the region.

use super::error::{Result, SchwarzError};
use super::partition::Region;
use crate::sparse::{CsrBuilder, CsrMatrix};
use crate::traits::{LinearOperator, RealField};
use ndarray::Array1;

/// Boolean restriction from the global DOF space onto one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionOperator {
    name: String,
    global_size: usize,
    indices: Vec<usize>,
}

impl RestrictionOperator {
    /// Build the restriction of `region` inside a global space of `global_size` DOFs
    pub fn new(global_size: usize, region: &Region) -> Result<Self> {
        if let Some(&dof) = region.dofs().iter().find(|&&dof| dof >= global_size) {
            return Err(SchwarzError::dimension(
                format!("DOF {dof} of {}", region.name()),
                global_size,
                dof + 1,
            ));
        }

        Ok(Self {
            name: region.name().to_string(),
            global_size,
            indices: region.dofs().to_vec(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows: the region size
    pub fn local_size(&self) -> usize {
        self.indices.len()
    }

    /// Number of columns: the global DOF count
    pub fn global_size(&self) -> usize {
        self.global_size
    }

    /// Global index of every local DOF
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// `R v`: gather the region's entries of a global vector
    pub fn restrict<T: RealField>(&self, global: &Array1<T>) -> Result<Array1<T>> {
        self.check_global(global.len())?;
        Ok(self.gather(global))
    }

    /// `R^T v`: scatter a local vector into a fresh global vector
    pub fn extend<T: RealField>(&self, local: &Array1<T>) -> Result<Array1<T>> {
        self.extend_add(Array1::from_elem(self.global_size, T::zero()), local)
    }

    /// `x + R^T v`: add a local correction to a global vector and hand it back
    pub fn extend_add<T: RealField>(
        &self,
        mut global: Array1<T>,
        local: &Array1<T>,
    ) -> Result<Array1<T>> {
        self.check_global(global.len())?;
        self.check_local(local.len())?;
        for (&g, &value) in self.indices.iter().zip(local.iter()) {
            global[g] += value;
        }
        Ok(global)
    }

    /// `R^T R v`: keep the region's entries and zero the rest
    pub fn project<T: RealField>(&self, global: &Array1<T>) -> Result<Array1<T>> {
        let local = self.restrict(global)?;
        self.extend(&local)
    }

    /// Explicit restriction matrix
    pub fn to_csr<T: RealField>(&self) -> CsrMatrix<T> {
        let mut builder =
            CsrBuilder::with_capacity(self.local_size(), self.global_size, self.local_size());
        for &g in &self.indices {
            builder.add_row_entries(std::iter::once((g, T::one())));
        }
        builder.finish()
    }

    /// Explicit extension matrix, the transpose of [`Self::to_csr`]
    pub fn extension_csr<T: RealField>(&self) -> CsrMatrix<T> {
        self.to_csr::<T>().transpose()
    }

    fn gather<T: RealField>(&self, global: &Array1<T>) -> Array1<T> {
        Array1::from_iter(self.indices.iter().map(|&g| global[g]))
    }

    fn check_global(&self, len: usize) -> Result<()> {
        if len != self.global_size {
            return Err(SchwarzError::dimension(
                format!("global vector for {}", self.name),
                self.global_size,
                len,
            ));
        }
        Ok(())
    }

    fn check_local(&self, len: usize) -> Result<()> {
        if len != self.local_size() {
            return Err(SchwarzError::dimension(
                format!("local vector for {}", self.name),
                self.local_size(),
                len,
            ));
        }
        Ok(())
    }
}

impl<T: RealField> LinearOperator<T> for RestrictionOperator {
    fn num_rows(&self) -> usize {
        self.local_size()
    }

    fn num_cols(&self) -> usize {
        self.global_size
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.global_size, "Input vector size mismatch");
        self.gather(x)
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.local_size(), "Input vector size mismatch");
        let mut y = Array1::from_elem(self.global_size, T::zero());
        for (&g, &value) in self.indices.iter().zip(x.iter()) {
            y[g] += value;
        }
        y
    }
}

/// One restriction per region, in region order
pub fn build_restrictions(
    global_size: usize,
    regions: &[Region],
) -> Result<Vec<RestrictionOperator>> {
    regions
        .iter()
        .map(|region| RestrictionOperator::new(global_size, region))
        .collect()
}
