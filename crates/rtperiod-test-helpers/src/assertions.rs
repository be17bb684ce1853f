//! Assertion macros for timing data.

/// Assert that a value lies in an inclusive range.
///
/// ```rust
/// use rtperiod_test_helpers::assert_in_range;
///
/// assert_in_range!(5_040u64, 5_000, 5_200);
/// ```
#[macro_export]
macro_rules! assert_in_range {
    ($value:expr, $min:expr, $max:expr $(,)?) => {
        let value = $value;
        let min = $min;
        let max = $max;
        if value < min || value > max {
            panic!(
                "assertion failed: `{:?}` not in [{:?}, {:?}]",
                value, min, max
            );
        }
    };
    ($value:expr, $min:expr, $max:expr, $($arg:tt)+) => {
        let value = $value;
        let min = $min;
        let max = $max;
        if value < min || value > max {
            panic!(
                "assertion failed: `{:?}` not in [{:?}, {:?}]: {}",
                value, min, max, format_args!($($arg)+)
            );
        }
    };
}

/// Assert that a collection is sorted in ascending order.
///
/// ```rust
/// use rtperiod_test_helpers::assert_sorted;
///
/// assert_sorted!(&[100, 200, 200, 300]);
/// ```
#[macro_export]
macro_rules! assert_sorted {
    ($collection:expr $(,)?) => {
        let collection = $collection;
        let mut iter = collection.iter();
        if let Some(mut prev) = iter.next() {
            for (i, curr) in iter.enumerate() {
                if prev > curr {
                    panic!(
                        "assertion failed: collection is not sorted\n  first unsorted pair at index {}: {:?} > {:?}",
                        i, prev, curr
                    );
                }
                prev = curr;
            }
        }
    };
}

/// Assert that consecutive values differ by exactly `step`.
///
/// ```rust
/// use rtperiod_test_helpers::assert_uniform_step;
///
/// assert_uniform_step!(&[10_000i64, 20_000, 30_000], 10_000);
/// ```
#[macro_export]
macro_rules! assert_uniform_step {
    ($collection:expr, $step:expr $(,)?) => {
        let collection = $collection;
        let step = $step;
        for (i, pair) in collection.windows(2).enumerate() {
            if let [prev, curr] = pair {
                if *curr - *prev != step {
                    panic!(
                        "assertion failed: step at index {} is {:?}, expected {:?}",
                        i,
                        *curr - *prev,
                        step
                    );
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_in_range_passes() {
        assert_in_range!(5, 1, 10);
        assert_in_range!(1, 1, 1, "degenerate range");
    }

    #[test]
    #[should_panic(expected = "not in")]
    fn test_assert_in_range_fails() {
        assert_in_range!(11, 1, 10);
    }

    #[test]
    #[should_panic(expected = "not sorted")]
    fn test_assert_sorted_fails() {
        assert_sorted!(&[1, 3, 2]);
    }

    #[test]
    #[should_panic(expected = "step at index 1")]
    fn test_assert_uniform_step_fails() {
        assert_uniform_step!(&[0, 10, 25], 10);
    }
}
