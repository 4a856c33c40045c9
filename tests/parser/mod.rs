mod tests_ambiguity;
mod tests_incremental;
