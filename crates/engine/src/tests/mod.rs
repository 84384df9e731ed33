mod helpers;

mod count_tests;
