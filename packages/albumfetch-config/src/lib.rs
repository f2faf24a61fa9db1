pub mod dir_rule;
pub mod options;

pub use dir_rule::DirRule;
pub use options::{FailPolicy, Options};
