//! Unit test harness for the public API.

mod pipeline_tests;
mod property_tests;
mod snapshot_package_tests;
