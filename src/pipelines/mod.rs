pub mod review;
pub mod stats;
pub mod utils;
