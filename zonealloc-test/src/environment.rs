//! Knobs of the tests, read from the environment.

/// Reads the number stored in the environment variable `name`, or returns `default`.
///
/// The value picked is printed, to be captured alongside the output of the test.
pub fn read_number(name: &str, default: usize) -> usize {
    if let Some(result) = std::env::var(name).ok().and_then(|value| value.parse().ok()) {
        println!("read_number - {}: {}", name, result);
        return result;
    }

    println!("read_number - {}: {} (default)", name, default);
    default
}

// mod tests
