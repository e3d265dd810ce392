//! Layer merging

pub(crate) mod merge_policy;
