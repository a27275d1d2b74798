mod group_cache_tests;
mod identity_tests;
mod persistence_tests;
mod recent_tests;
