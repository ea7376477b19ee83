pub mod difficulty_lookup;
