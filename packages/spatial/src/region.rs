//! Region membership predicates.
//!
//! Densification needs two things from a region: an outer bounding box to
//! walk candidate grid coordinates across, and a membership test to reject
//! candidates that fall outside the real boundary (a county polygon, a
//! state outline, or just the box itself).

use envrisk_spatial_models::{BoundingBox, LonLat, ScalarSample};

/// A geographic region that grid candidates can be tested against.
pub trait Region: Send + Sync {
    /// Outer extent of the region.
    fn bounds(&self) -> BoundingBox;

    /// Returns `true` if the point lies inside the region.
    fn contains(&self, point: LonLat) -> bool;
}

impl Region for BoundingBox {
    fn bounds(&self) -> BoundingBox {
        *self
    }

    fn contains(&self, point: LonLat) -> bool {
        Self::contains(self, point)
    }
}

/// A region defined by a bounding box plus an arbitrary predicate.
///
/// Lets callers plug in ad hoc membership rules (e.g. "inside the box and
/// east of the Cascades") without writing a dedicated type.
pub struct PredicateRegion<F> {
    bounds: BoundingBox,
    predicate: F,
}

impl<F> PredicateRegion<F>
where
    F: Fn(LonLat) -> bool + Send + Sync,
{
    #[must_use]
    pub const fn new(bounds: BoundingBox, predicate: F) -> Self {
        Self { bounds, predicate }
    }
}

impl<F> Region for PredicateRegion<F>
where
    F: Fn(LonLat) -> bool + Send + Sync,
{
    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn contains(&self, point: LonLat) -> bool {
        self.bounds.contains(point) && (self.predicate)(point)
    }
}

/// Keeps only the samples that fall inside `region`, unchanged.
///
/// This is the non-interpolated column mode: each county centre becomes
/// one column, and out-of-region centres are dropped.
#[must_use]
pub fn direct_samples(samples: &[ScalarSample], region: &dyn Region) -> Vec<ScalarSample> {
    let kept: Vec<ScalarSample> = samples
        .iter()
        .filter(|s| region.contains(s.position))
        .copied()
        .collect();

    log::debug!(
        "Direct conversion kept {} of {} samples inside region",
        kept.len(),
        samples.len()
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_region_requires_both_box_and_predicate() {
        let region = PredicateRegion::new(BoundingBox::WASHINGTON, |p: LonLat| p.lon > -120.0);
        assert!(region.contains(LonLat::new(-118.0, 47.0)));
        assert!(!region.contains(LonLat::new(-122.0, 47.0)));
        assert!(!region.contains(LonLat::new(-110.0, 47.0)));
    }

    #[test]
    fn direct_samples_filters_out_of_region() {
        let samples = vec![
            ScalarSample::new(-122.3, 47.6, 0.4),
            ScalarSample::new(-80.0, 35.0, 0.9),
        ];
        let kept = direct_samples(&samples, &BoundingBox::WASHINGTON);
        assert_eq!(kept, vec![samples[0]]);
    }
}
