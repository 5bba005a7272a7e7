pub mod aggregate;
pub mod observation;
pub mod selection;
pub mod variable;

pub use aggregate::{
    AggregateRow, AggregateTable, BucketLabel, Extreme, ExtremumSummary, Granularity, Reduction,
};
pub use observation::{Measurements, Observation, ObservationTable, QualityFlags};
pub use selection::{parse_month, Selection, SelectionLevel};
pub use variable::Variable;
