// Policy rates — irregular series ingestion and alignment to speech dates.

pub mod align;
pub mod models;

pub use align::{align_rates, forward_fill, native_observations};
pub use models::{read_rate_file, AlignedRate, RateObservation, RateSeries, RawRateRow};
