//! Tests for the TIFF module

mod byte_order_tests;
mod types_tests;
