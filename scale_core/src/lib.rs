pub mod clock;
pub mod error;
pub mod gauge;
pub mod histogram;
pub mod meter;
pub mod metric;

pub use clock::{Clock, DynClock, ManualClock, SystemClock};
pub use error::{Result, ScaleError};
pub use gauge::{DynGaugeSource, Gauge, GaugeSnapshot, GaugeSource};
pub use histogram::{HistogramSnapshot, Retention, WindowedHistogram, MIN_WINDOW};
pub use meter::{MeterSnapshot, RateMeter};
pub use metric::{Metric, MetricSnapshot};
