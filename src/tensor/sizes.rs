/// Returns the number of components of a symmetric tensor in the space dimension `n`
///
/// Returns 0 if `n` is not 1, 2 or 3.
pub const fn stensor_dime_to_size(n: usize) -> usize {
    match n {
        1 => 3,
        2 => 4,
        3 => 6,
        _ => 0,
    }
}

/// Returns the number of components of an unsymmetric tensor in the space dimension `n`
///
/// Returns 0 if `n` is not 1, 2 or 3.
pub const fn tensor_dime_to_size(n: usize) -> usize {
    match n {
        1 => 3,
        2 => 5,
        3 => 9,
        _ => 0,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
