/// Asserts two floats differ by less than an absolute precision.
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}

/// Asserts two floats agree to within a relative tolerance.
#[macro_export]
macro_rules! assert_relative_eq {
    ($a:expr, $b:expr, $max_relative:expr $(,)?) => {
        if !$crate::numeric::relative_eq($a, $b, $max_relative) {
            panic!(
                "assertion failed: `left ≈ right` within relative {:e}, (left: `{}`, right: `{}`)",
                $max_relative, $a, $b
            );
        }
    };
}
