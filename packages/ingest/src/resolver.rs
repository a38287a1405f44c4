//! Area resolution strategies.
//!
//! A station is attributed to an area either by the code declared on the
//! record or by testing its coordinates against the area boundaries. Both
//! are [`AreaResolver`]s; a [`ResolverChain`] tries them in order and the
//! first one that has the data it needs and finds a match wins.

use std::collections::BTreeSet;

use evision_charging_models::{AreaCode, ResolutionMethod};
use evision_spatial::SpatialIndex;

/// What a resolver may look at for one station.
#[derive(Debug, Clone, Copy)]
pub struct StationCandidate<'a> {
    /// Station identifier, for logging.
    pub id: &'a str,
    /// Declared area code, if it parsed and lies in the region range.
    pub declared: Option<&'a AreaCode>,
    /// `(latitude, longitude)` if both parsed and fall inside the region's
    /// bounding box.
    pub coordinates: Option<(f64, f64)>,
}

/// A strategy for attributing a station to an area.
pub trait AreaResolver {
    /// How areas found by this resolver are labelled.
    fn method(&self) -> ResolutionMethod;

    /// Returns the owning area, or `None` if this strategy lacks the data
    /// it needs or finds no match.
    fn resolve(&self, candidate: &StationCandidate<'_>) -> Option<AreaCode>;
}

/// Accepts the declared code when it names a known area.
pub struct DeclaredKeyResolver<'a> {
    known: &'a BTreeSet<AreaCode>,
}

impl<'a> DeclaredKeyResolver<'a> {
    /// Creates a resolver over the set of known area codes.
    #[must_use]
    pub const fn new(known: &'a BTreeSet<AreaCode>) -> Self {
        Self { known }
    }
}

impl AreaResolver for DeclaredKeyResolver<'_> {
    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::DeclaredKey
    }

    fn resolve(&self, candidate: &StationCandidate<'_>) -> Option<AreaCode> {
        candidate
            .declared
            .filter(|code| self.known.contains(*code))
            .cloned()
    }
}

/// Finds the area whose boundary contains the station's coordinates.
pub struct PolygonResolver<'a> {
    index: &'a SpatialIndex,
}

impl<'a> PolygonResolver<'a> {
    /// Creates a resolver over a built spatial index.
    #[must_use]
    pub const fn new(index: &'a SpatialIndex) -> Self {
        Self { index }
    }
}

impl AreaResolver for PolygonResolver<'_> {
    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::PointInPolygon
    }

    fn resolve(&self, candidate: &StationCandidate<'_>) -> Option<AreaCode> {
        let (lat, lon) = candidate.coordinates?;
        self.index.lookup_area(lon, lat).cloned()
    }
}

/// Ordered list of resolvers; the first match wins.
#[derive(Default)]
pub struct ResolverChain<'a> {
    resolvers: Vec<Box<dyn AreaResolver + 'a>>,
}

impl<'a> ResolverChain<'a> {
    /// Creates an empty chain, which resolves nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver.
    #[must_use]
    pub fn with(mut self, resolver: impl AreaResolver + 'a) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Declared key first, then point-in-polygon.
    #[must_use]
    pub fn standard(known: &'a BTreeSet<AreaCode>, index: &'a SpatialIndex) -> Self {
        Self::new()
            .with(DeclaredKeyResolver::new(known))
            .with(PolygonResolver::new(index))
    }

    /// Runs the resolvers in order.
    #[must_use]
    pub fn resolve(&self, candidate: &StationCandidate<'_>) -> Option<(AreaCode, ResolutionMethod)> {
        self.resolvers.iter().find_map(|resolver| {
            let code = resolver.resolve(candidate)?;
            log::debug!(
                "Station {} resolved to {code} via {}",
                candidate.id,
                resolver.method()
            );
            Some((code, resolver.method()))
        })
    }
}
