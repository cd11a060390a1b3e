mod recession;

pub use recession::{apply_recession, RecessionOverrides};
