use super::test_helpers::*;
use super::*;
use crate::error::{BatchError, FetchError};
use std::time::{Duration, Instant};


fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}
