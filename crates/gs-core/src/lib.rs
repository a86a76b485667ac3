//! Gift score analysis core library.
//!
//! Turns raw per-stream gift records into normalized metrics, fits the
//! piecewise-linear expected-score model by segmented least squares, and
//! assigns each record a performance band.
//!
//! Pipeline: [`load`] → [`normalize`] → [`validation`] → [`filter`] →
//! [`fit`] / [`classify`] → [`summary`].

pub mod classify;
pub mod exclusion;
pub mod exit_codes;
pub mod filter;
pub mod fit;
pub mod load;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod summary;
pub mod validation;

pub use classify::{assign_classes, classify, classify_record, BandClass};
pub use exclusion::is_excluded;
pub use exit_codes::ExitCode;
pub use filter::{parse_condition, partition_by_total, sort_records, Predicate, Slice};
pub use fit::{compare_feature_sets, fit, FitOptions, FitReport};
pub use load::load_paths;
pub use model::{evaluate_model, sample_x, PiecewiseModel};
pub use normalize::{normalize, normalize_groups};
pub use summary::{class_table, ClassRow};
pub use validation::{validate_all, Validator};
