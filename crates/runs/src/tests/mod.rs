mod reader_tests;
mod writer_tests;
