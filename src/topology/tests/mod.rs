mod debug_invariants;
mod validation_tests;
