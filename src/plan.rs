//! Migration path planning.
//!
//! A plan is the ordered chain of adjacent-version hops between the
//! detected version (exclusive) and the target (inclusive). The planner
//! never skips: even if a catalog somehow declared a non-adjacent mapping,
//! every intermediate structural change is applied and validated on its
//! own hop.

use crate::catalog::{SchemaCatalog, SchemaVersion};
use crate::errors::{MigrationError, MigrationResult};

/// One adjacent-version migration step.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
}

/// Immutable, ordered sequence of hops, consumed left to right.
///
/// # Example
///
/// ```
/// use stepstore::catalog::{MappingSpec, SchemaCatalog, SchemaVersion};
/// use stepstore::plan::MigrationPlan;
///
/// let catalog = SchemaCatalog::new(
///     "demo",
///     vec![
///         SchemaVersion::new("V1", 1),
///         SchemaVersion::new("V2", 2),
///         SchemaVersion::new("V3", 3),
///     ],
///     vec![MappingSpec::new("V1", "V2"), MappingSpec::new("V2", "V3")],
/// )
/// .unwrap();
///
/// let plan = MigrationPlan::plan(
///     &catalog.versions()[0],
///     catalog.latest(),
///     &catalog,
/// )
/// .unwrap();
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan.destinations(), ["V2", "V3"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    hops: Vec<Hop>,
}

impl MigrationPlan {
    /// Compute the hop chain from `current` to `target`.
    ///
    /// `current == target` yields an empty plan (a successful no-op).
    /// A target that precedes `current` fails with
    /// [`MigrationError::InvalidTarget`]; versions foreign to the catalog
    /// fail with a catalog error.
    pub fn plan(
        current: &SchemaVersion,
        target: &SchemaVersion,
        catalog: &SchemaCatalog,
    ) -> MigrationResult<Self> {
        let current_pos = catalog.position(current)?;
        let target_pos = catalog.position(target)?;

        if target_pos < current_pos {
            return Err(MigrationError::InvalidTarget {
                current: current.name().to_string(),
                target: target.name().to_string(),
            });
        }

        let hops = catalog.versions()[current_pos..=target_pos]
            .windows(2)
            .map(|pair| Hop {
                from: pair[0].clone(),
                to: pair[1].clone(),
            })
            .collect();
        Ok(Self { hops })
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Destination version names in traversal order; this is exactly the
    /// list a successful migration reports.
    pub fn destinations(&self) -> Vec<String> {
        self.hops.iter().map(|h| h.to.name().to_string()).collect()
    }
}
