use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverError {
    #[error("geometry cannot be covered: {0}")]
    InvalidGeometry(String),
}

/// Turns a geometry into the set of trixel names whose union
/// approximates it (spec §4.A `cover`). The real cover generator
/// (geometry parsing, spherical triangulation) is explicitly out of
/// this core's scope; the core only depends on this contract.
///
/// An empty result is a valid outcome for a degenerate geometry and
/// must be treated by callers as "no match", not an error (spec §4.A
/// "Failure mode").
pub trait CoverGenerator {
    /// Opaque geometry representation; the real generator would parse
    /// EWKT/GeoJSON into something richer than a tag.
    type Geometry;

    fn cover(
        &self,
        geometry: &Self::Geometry,
        partials: bool,
        error: f64,
    ) -> Result<Vec<String>, CoverError>;
}

/// A generator that always returns an empty cover. Useful as the
/// default when no real geometry backend is wired in, and for testing
/// the empty-cover contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCover;

impl CoverGenerator for NullCover {
    type Geometry = ();

    fn cover(&self, _geometry: &(), _partials: bool, _error: f64) -> Result<Vec<String>, CoverError> {
        Ok(Vec::new())
    }
}
