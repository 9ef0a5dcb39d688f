pub mod fit;
pub mod path;

pub use fit::{fit_to_view, FitTransform, DEFAULT_MARGIN};
pub use path::{reconstruct, ReconstructedPath};
