mod provision;

pub use provision::provision;
