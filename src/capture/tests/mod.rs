
mod batch_tests;
