//! Geometric partitioning of degrees of freedom into regions
//!
//! DOFs are cut into `k` bands along one coordinate axis. Bands either hold
//! the same number of DOFs ([`BandPolicy::EqualCount`]) or span the same
//! coordinate width ([`BandPolicy::EqualWidth`]). Every DOF lands in exactly
//! one band, so the union of regions always covers the whole DOF set. A
//! positive overlap width then grows each band by every DOF whose coordinate
//! lies within that distance of the band's extent.
//!
//! [`extend_by_layers`] grows a region algebraically instead, by layers of
//! neighbours in the matrix graph.

use super::error::{Result, SchwarzError};
use crate::sparse::CsrMatrix;
use crate::traits::RealField;
use std::collections::HashSet;

/// Coordinate axis used to cut bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// How band boundaries are placed along the axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandPolicy {
    /// Sort by coordinate and cut into chunks of near-equal size (never empty)
    #[default]
    EqualCount,
    /// Cut the coordinate range into equal intervals (fails on an empty interval)
    EqualWidth,
}

/// Partitioner settings
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionConfig {
    /// Number of regions `k`
    pub num_regions: usize,
    /// Geometric overlap width added on both sides of every band (0 = none)
    pub overlap: f64,
    /// Axis along which bands are cut
    pub axis: Axis,
    /// Band placement policy
    pub policy: BandPolicy,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            num_regions: 2,
            overlap: 0.0,
            axis: Axis::Y,
            policy: BandPolicy::EqualCount,
        }
    }
}

impl PartitionConfig {
    pub fn new(num_regions: usize) -> Self {
        Self {
            num_regions,
            ..Self::default()
        }
    }

    pub fn with_overlap(mut self, overlap: f64) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_policy(mut self, policy: BandPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Degree-of-freedom indices paired with their spatial positions
///
/// Positions are stored as `[x, y, z]`; 2D problems use `z = 0`.
#[derive(Debug, Clone)]
pub struct DofSet {
    indices: Vec<usize>,
    positions: Vec<[f64; 3]>,
}

impl DofSet {
    /// Create a DOF set from explicit indices. Indices must form a permutation of `0..N`.
    pub fn new(indices: Vec<usize>, positions: Vec<[f64; 3]>) -> Result<Self> {
        if indices.len() != positions.len() {
            return Err(SchwarzError::dimension(
                "DOF positions",
                indices.len(),
                positions.len(),
            ));
        }

        let n = indices.len();
        let mut seen = vec![false; n];
        for &dof in &indices {
            if dof >= n || seen[dof] {
                return Err(SchwarzError::Configuration(format!(
                    "DOF indices must be a permutation of 0..{n} (offending index {dof})"
                )));
            }
            seen[dof] = true;
        }

        Ok(Self { indices, positions })
    }

    /// DOF `i` sits at `positions[i]`
    pub fn from_positions(positions: Vec<[f64; 3]>) -> Self {
        Self {
            indices: (0..positions.len()).collect(),
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    /// Iterate over `(dof, position)` pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64; 3])> + '_ {
        self.indices.iter().copied().zip(self.positions.iter())
    }
}

/// A named set of DOF indices
///
/// Regions are non-empty and never contain duplicates, but may overlap each
/// other. The order of `dofs` fixes the local numbering of the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    name: String,
    dofs: Vec<usize>,
}

impl Region {
    pub fn new(name: impl Into<String>, dofs: Vec<usize>) -> Result<Self> {
        let name = name.into();
        if dofs.is_empty() {
            return Err(SchwarzError::Configuration(format!(
                "region {name} has no DOFs"
            )));
        }
        let mut seen = HashSet::with_capacity(dofs.len());
        if let Some(&dup) = dofs.iter().find(|&&dof| !seen.insert(dof)) {
            return Err(SchwarzError::Configuration(format!(
                "region {name} lists DOF {dup} more than once"
            )));
        }
        Ok(Self { name, dofs })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    pub fn len(&self) -> usize {
        self.dofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }

    pub fn contains(&self, dof: usize) -> bool {
        self.dofs.contains(&dof)
    }
}

/// Split the DOF set into `config.num_regions` bands
///
/// Regions are returned in band order along the axis, each with its DOFs
/// sorted by global index.
pub fn partition(dofs: &DofSet, config: &PartitionConfig) -> Result<Vec<Region>> {
    let n = dofs.len();
    let k = config.num_regions;

    if k == 0 {
        return Err(SchwarzError::Configuration(
            "at least one region is required".to_string(),
        ));
    }
    if k > n {
        return Err(SchwarzError::Configuration(format!(
            "cannot split {n} DOFs into {k} regions"
        )));
    }
    if !config.overlap.is_finite() || config.overlap < 0.0 {
        return Err(SchwarzError::Configuration(format!(
            "overlap width must be finite and non-negative, got {}",
            config.overlap
        )));
    }

    let axis = config.axis.index();
    let coords: Vec<f64> = dofs.positions().iter().map(|p| p[axis]).collect();
    if let Some(slot) = coords.iter().position(|c| !c.is_finite()) {
        return Err(SchwarzError::Configuration(format!(
            "DOF {} has a non-finite coordinate",
            dofs.indices()[slot]
        )));
    }

    let bands = match config.policy {
        BandPolicy::EqualCount => equal_count_bands(&coords, k),
        BandPolicy::EqualWidth => equal_width_bands(&coords, k)?,
    };

    let regions = bands
        .iter()
        .enumerate()
        .map(|(b, band)| {
            let slots: Vec<usize> = if config.overlap > 0.0 {
                let (lo, hi) = band_extent(&coords, band);
                let (lo, hi) = (lo - config.overlap, hi + config.overlap);
                (0..n)
                    .filter(|&s| coords[s] >= lo && coords[s] <= hi)
                    .collect()
            } else {
                band.clone()
            };

            let mut members: Vec<usize> = slots.iter().map(|&s| dofs.indices()[s]).collect();
            members.sort_unstable();
            Region {
                name: format!("region-{b}"),
                dofs: members,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Partitioned {} DOFs into {} regions along {:?} (overlap {}): sizes {:?}",
        n,
        k,
        config.axis,
        config.overlap,
        regions.iter().map(Region::len).collect::<Vec<_>>()
    );

    Ok(regions)
}

/// DOFs of `0..n` that no region contains
pub fn uncovered_dofs(regions: &[Region], n: usize) -> Vec<usize> {
    let mut covered = vec![false; n];
    for region in regions {
        for &dof in region.dofs() {
            if dof < n {
                covered[dof] = true;
            }
        }
    }
    (0..n).filter(|&dof| !covered[dof]).collect()
}

/// Grow a region by `layers` rings of matrix-graph neighbours
pub fn extend_by_layers<T: RealField>(
    region: &Region,
    matrix: &CsrMatrix<T>,
    layers: usize,
) -> Result<Region> {
    let n = matrix.num_rows;
    if let Some(&dof) = region.dofs().iter().find(|&&dof| dof >= n) {
        return Err(SchwarzError::dimension(
            format!("DOF {dof} of {}", region.name()),
            n,
            dof + 1,
        ));
    }

    let mut in_region = vec![false; n];
    for &dof in region.dofs() {
        in_region[dof] = true;
    }

    let mut frontier: Vec<usize> = region.dofs().to_vec();
    for _ in 0..layers {
        let mut next = Vec::new();
        for &dof in &frontier {
            for (neighbor, _) in matrix.row_entries(dof) {
                if !in_region[neighbor] {
                    in_region[neighbor] = true;
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(Region {
        name: region.name.clone(),
        dofs: (0..n).filter(|&i| in_region[i]).collect(),
    })
}

fn equal_count_bands(coords: &[f64], k: usize) -> Vec<Vec<usize>> {
    let n = coords.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| coords[a].total_cmp(&coords[b]).then(a.cmp(&b)));

    let base = n / k;
    let remainder = n % k;

    let mut bands = Vec::with_capacity(k);
    let mut start = 0;
    for b in 0..k {
        let size = base + usize::from(b < remainder);
        bands.push(order[start..start + size].to_vec());
        start += size;
    }
    bands
}

fn equal_width_bands(coords: &[f64], k: usize) -> Result<Vec<Vec<usize>>> {
    let min = coords.iter().copied().fold(f64::INFINITY, f64::min);
    let max = coords.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / k as f64;

    let mut bands = vec![Vec::new(); k];
    for (slot, &c) in coords.iter().enumerate() {
        let band = if width > 0.0 {
            (((c - min) / width).floor() as usize).min(k - 1)
        } else {
            0
        };
        bands[band].push(slot);
    }

    if let Some(empty) = bands.iter().position(Vec::is_empty) {
        return Err(SchwarzError::Configuration(format!(
            "band {empty} of {k} contains no DOFs; use fewer regions or equal-count bands"
        )));
    }
    Ok(bands)
}

fn band_extent(coords: &[f64], band: &[usize]) -> (f64, f64) {
    band.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
        (lo.min(coords[s]), hi.max(coords[s]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid_dofs(nx: usize, ny: usize) -> DofSet {
        let mut positions = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                positions.push([
                    i as f64 / (nx - 1) as f64,
                    j as f64 / (ny - 1) as f64,
                    0.0,
                ]);
            }
        }
        DofSet::from_positions(positions)
    }

    #[test]
    fn test_row_bands_on_grid() {
        let dofs = grid_dofs(4, 4);
        let regions = partition(&dofs, &PartitionConfig::new(2)).expect("partition");

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].dofs(), &(0..8).collect::<Vec<_>>()[..]);
        assert_eq!(regions[1].dofs(), &(8..16).collect::<Vec<_>>()[..]);
        assert_eq!(regions[1].name(), "region-1");
    }

    #[test]
    fn test_equal_width_matches_equal_count_on_uniform_grid() {
        let dofs = grid_dofs(4, 4);
        let count = partition(&dofs, &PartitionConfig::new(2)).expect("count");
        let width = partition(
            &dofs,
            &PartitionConfig::new(2).with_policy(BandPolicy::EqualWidth),
        )
        .expect("width");
        assert_eq!(count, width);
    }

    #[test]
    fn test_coverage_for_many_region_counts() {
        let dofs = grid_dofs(7, 5);
        for k in 1..=dofs.len() {
            for axis in [Axis::X, Axis::Y] {
                let config = PartitionConfig::new(k).with_axis(axis);
                let regions = partition(&dofs, &config).expect("partition");
                assert_eq!(regions.len(), k);
                assert!(regions.iter().all(|r| !r.is_empty()));
                assert!(uncovered_dofs(&regions, dofs.len()).is_empty());
            }
        }
    }

    #[test]
    fn test_overlap_adds_neighbouring_rows() {
        let dofs = grid_dofs(4, 4);
        let regions =
            partition(&dofs, &PartitionConfig::new(2).with_overlap(0.4)).expect("partition");

        assert_eq!(regions[0].dofs(), &(0..12).collect::<Vec<_>>()[..]);
        assert_eq!(regions[1].dofs(), &(4..16).collect::<Vec<_>>()[..]);
    }

    #[test]
    fn test_too_many_regions_is_configuration_error() {
        let dofs = grid_dofs(2, 2);
        let err = partition(&dofs, &PartitionConfig::new(5)).unwrap_err();
        assert!(err.is_configuration_error());

        let err = partition(&dofs, &PartitionConfig::new(0)).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_invalid_overlap_is_rejected() {
        let dofs = grid_dofs(3, 3);
        for overlap in [-0.1, f64::NAN, f64::INFINITY] {
            let config = PartitionConfig::new(2).with_overlap(overlap);
            assert!(partition(&dofs, &config).unwrap_err().is_configuration_error());
        }
    }

    #[test]
    fn test_equal_width_reports_empty_band() {
        // Two clusters with a gap: the middle band of three is empty
        let dofs = DofSet::from_positions(vec![
            [0.0, 0.0, 0.0],
            [0.0, 0.1, 0.0],
            [0.0, 0.9, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let config = PartitionConfig::new(3).with_policy(BandPolicy::EqualWidth);
        assert!(partition(&dofs, &config).unwrap_err().is_configuration_error());

        let regions = partition(&dofs, &PartitionConfig::new(3)).expect("equal count");
        assert!(regions.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn test_permuted_dof_indices_are_carried_through() {
        let dofs = DofSet::new(
            vec![2, 0, 1],
            vec![[0.0, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 1.0, 0.0]],
        )
        .expect("valid dof set");
        let regions = partition(&dofs, &PartitionConfig::new(3)).expect("partition");
        let firsts: Vec<usize> = regions.iter().map(|r| r.dofs()[0]).collect();
        assert_eq!(firsts, vec![2, 0, 1]);
    }

    #[test]
    fn test_dof_set_validation() {
        assert!(
            DofSet::new(vec![0, 1], vec![[0.0; 3]])
                .unwrap_err()
                .is_dimension_error()
        );
        assert!(
            DofSet::new(vec![0, 0], vec![[0.0; 3], [1.0, 0.0, 0.0]])
                .unwrap_err()
                .is_configuration_error()
        );
    }

    #[test]
    fn test_region_rejects_empty_dof_list() {
        let err = Region::new("empty", Vec::new()).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_region_rejects_duplicates() {
        let err = Region::new("r", vec![1, 2, 1]).unwrap_err();
        assert!(err.to_string().contains("DOF 1"));
        assert!(Region::new("r", vec![3, 1, 2]).expect("valid").contains(1));
    }

    #[test]
    fn test_extend_by_layers_follows_matrix_graph() {
        // 1D chain 0-1-2-3-4
        let dense = array![
            [2.0_f64, -1.0, 0.0, 0.0, 0.0],
            [-1.0, 2.0, -1.0, 0.0, 0.0],
            [0.0, -1.0, 2.0, -1.0, 0.0],
            [0.0, 0.0, -1.0, 2.0, -1.0],
            [0.0, 0.0, 0.0, -1.0, 2.0]
        ];
        let matrix = CsrMatrix::from_dense(&dense, 0.0);
        let region = Region::new("left", vec![0, 1]).expect("region");

        let one = extend_by_layers(&region, &matrix, 1).expect("extend");
        assert_eq!(one.dofs(), &[0, 1, 2]);
        assert_eq!(one.name(), "left");

        let many = extend_by_layers(&region, &matrix, 10).expect("extend");
        assert_eq!(many.dofs(), &[0, 1, 2, 3, 4]);

        let outside = Region::new("bad", vec![7]).expect("region");
        assert!(
            extend_by_layers(&outside, &matrix, 1)
                .unwrap_err()
                .is_dimension_error()
        );
    }
}
