pub mod scenario;
pub mod util;

pub use util::{parse_flag, split_csv};
