pub mod d100_kpis;
pub mod d101_dimension_detail;
