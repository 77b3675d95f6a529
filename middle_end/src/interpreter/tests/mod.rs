mod execution_tests;
