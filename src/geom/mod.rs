mod bbox;
mod border;
mod geom;
mod proj;
mod repair;
mod union;

use std::panic::{self, AssertUnwindSafe};

use geo::{Area, MultiPolygon};

pub use border::{Border, BorderExtractor, BorderFallback};
pub use geom::Boundaries;
pub use proj::{Projector, SourceCrs};
pub use repair::repair;
pub use union::{Coverage, CoverageEngine, Deadline, UnionFallback};

/// True if the shape has no polygons or no positive area.
pub(crate) fn is_degenerate(shape: &MultiPolygon<f64>) -> bool {
    shape.0.is_empty() || !(shape.unsigned_area() > 0.0)
}

/// Run a geometry operation, turning a panic in the overlay backend into an
/// error message so one bad unit cannot take down the whole run.
///
/// The process panic hook still runs first, so with the default hook each
/// absorbed panic also prints a `panicked at` line on stderr next to the
/// caller's `warn!`. The hook is process-wide and left to the binary; a
/// caller that wants one stream can install a hook that forwards to
/// `tracing`, as the `covermap` CLI does.
pub(crate) fn guarded<T>(op: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        payload.downcast_ref::<&str>().map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "geometry operation panicked".into())
    })
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    #[test]
    fn guarded_passes_values_through() {
        assert_eq!(guarded(|| 2 + 2), Ok(4));
    }

    #[test]
    fn guarded_turns_panics_into_messages() {
        assert_eq!(guarded(|| -> i32 { panic!("static message") }), Err("static message".to_string()));
        let region = "Campinas";
        assert_eq!(guarded(|| -> i32 { panic!("bad ring in {region}") }), Err("bad ring in Campinas".to_string()));
    }

    #[test]
    fn degenerate_shapes() {
        assert!(is_degenerate(&MultiPolygon::new(vec![])));
        assert!(is_degenerate(&MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]])));
        assert!(!is_degenerate(&MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]])));
    }
}
