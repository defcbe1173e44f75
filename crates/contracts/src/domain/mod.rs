pub mod a001_dimension;
pub mod a002_subdimension;
pub mod a003_indicator;
