mod sweep;

pub use sweep::{run_sensitivity, SensitivityRow, SensitivityTable};
