mod spherical;
pub use spherical::{RangeGrid, SphericalProjection};

mod densify;
pub use densify::{dense_rows, interpolate_rows, suppress_artifacts, DenseGrid, Densifier};

mod variance;
pub use variance::VarianceFilter;

mod reconstruct;
pub use reconstruct::Reconstructor;

mod builder;
pub use builder::RangeImageBuilder;
