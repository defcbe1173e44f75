pub mod p001_indicator_result;
