pub mod mytime;
#[cfg(test)]
pub mod test_utils;
