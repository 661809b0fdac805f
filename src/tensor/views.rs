use super::stensor_dime_to_size;
use crate::StrError;
use nalgebra::{DMatrix, DVector};
use std::ops::{Index, IndexMut};

/// Checks the space dimension and returns the number of components of a symmetric tensor
fn checked_stensor_size(n: usize) -> Result<usize, StrError> {
    match stensor_dime_to_size(n) {
        0 => Err("space dimension must be 1, 2 or 3"),
        size => Ok(size),
    }
}

/// Implements a read-only symmetric tensor overlay onto a caller-owned buffer
///
/// The components follow the TFEL ordering `xx, yy, zz, √2·xy, √2·xz, √2·yz`
/// (truncated to the number of components of the space dimension `N`).
#[derive(Clone, Copy, Debug)]
pub struct ConstStensorView<'a, const N: usize> {
    data: &'a [f64],
}

impl<'a, const N: usize> ConstStensorView<'a, N> {
    /// Allocates a new view
    ///
    /// The buffer must hold at least `stensor_dime_to_size(N)` values.
    pub fn new(buffer: &'a [f64]) -> Result<Self, StrError> {
        let size = checked_stensor_size(N)?;
        if buffer.len() < size {
            return Err("buffer is too small for a symmetric tensor view");
        }
        Ok(ConstStensorView { data: &buffer[..size] })
    }

    /// Returns the number of components
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the components
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.data
    }

    /// Returns a copy of the components
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(self.data)
    }
}

impl<'a, const N: usize> Index<usize> for ConstStensorView<'a, N> {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

/// Implements a mutable symmetric tensor overlay onto a caller-owned buffer
#[derive(Debug)]
pub struct StensorView<'a, const N: usize> {
    data: &'a mut [f64],
}

impl<'a, const N: usize> StensorView<'a, N> {
    /// Allocates a new view
    ///
    /// The buffer must hold at least `stensor_dime_to_size(N)` values.
    pub fn new(buffer: &'a mut [f64]) -> Result<Self, StrError> {
        let size = checked_stensor_size(N)?;
        if buffer.len() < size {
            return Err("buffer is too small for a symmetric tensor view");
        }
        Ok(StensorView {
            data: &mut buffer[..size],
        })
    }

    /// Returns the number of components
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the components
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.data
    }

    /// Returns a copy of the components
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(self.data)
    }

    /// Copies values into the underlying buffer
    pub fn assign(&mut self, values: &[f64]) -> Result<(), StrError> {
        if values.len() != self.data.len() {
            return Err("values must have the size of the symmetric tensor");
        }
        self.data.copy_from_slice(values);
        Ok(())
    }
}

impl<'a, const N: usize> Index<usize> for StensorView<'a, N> {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl<'a, const N: usize> IndexMut<usize> for StensorView<'a, N> {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.data[i]
    }
}

/// Implements a read-only overlay of a fourth-order operator on symmetric tensors
///
/// The buffer is read row-major: `get(i,j) = buffer[i·size + j]`.
#[derive(Clone, Copy, Debug)]
pub struct ConstST2toST2View<'a, const N: usize> {
    data: &'a [f64],
    size: usize,
}

impl<'a, const N: usize> ConstST2toST2View<'a, N> {
    /// Allocates a new view
    ///
    /// The buffer must hold at least `stensor_dime_to_size(N)²` values.
    pub fn new(buffer: &'a [f64]) -> Result<Self, StrError> {
        let size = checked_stensor_size(N)?;
        if buffer.len() < size * size {
            return Err("buffer is too small for a fourth-order tensor view");
        }
        Ok(ConstST2toST2View {
            data: &buffer[..size * size],
            size,
        })
    }

    /// Returns the number of rows (and columns)
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the (i,j) component
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// Returns a copy as a matrix
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.size, self.size, self.data)
    }
}

impl<'a, const N: usize> Index<(usize, usize)> for ConstST2toST2View<'a, N> {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.size + j]
    }
}

/// Implements a mutable overlay of a fourth-order operator on symmetric tensors
#[derive(Debug)]
pub struct ST2toST2View<'a, const N: usize> {
    data: &'a mut [f64],
    size: usize,
}

impl<'a, const N: usize> ST2toST2View<'a, N> {
    /// Allocates a new view
    ///
    /// The buffer must hold at least `stensor_dime_to_size(N)²` values.
    pub fn new(buffer: &'a mut [f64]) -> Result<Self, StrError> {
        let size = checked_stensor_size(N)?;
        if buffer.len() < size * size {
            return Err("buffer is too small for a fourth-order tensor view");
        }
        Ok(ST2toST2View {
            data: &mut buffer[..size * size],
            size,
        })
    }

    /// Returns the number of rows (and columns)
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the (i,j) component
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// Sets the (i,j) component
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.size + j] = value;
    }

    /// Returns a copy as a matrix
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.size, self.size, self.data)
    }

    /// Copies a matrix into the underlying buffer
    pub fn assign(&mut self, matrix: &DMatrix<f64>) -> Result<(), StrError> {
        if matrix.nrows() != self.size || matrix.ncols() != self.size {
            return Err("matrix must have the size of the fourth-order tensor");
        }
        for i in 0..self.size {
            for j in 0..self.size {
                self.data[i * self.size + j] = matrix[(i, j)];
            }
        }
        Ok(())
    }
}

impl<'a, const N: usize> Index<(usize, usize)> for ST2toST2View<'a, N> {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.size + j]
    }
}

impl<'a, const N: usize> IndexMut<(usize, usize)> for ST2toST2View<'a, N> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.size + j]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ConstST2toST2View, ConstStensorView, ST2toST2View, StensorView};
    use nalgebra::DMatrix;

    #[test]
    fn stensor_views_work() {
        let buffer = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let v = ConstStensorView::<2>::new(&buffer).unwrap();
        assert_eq!(v.size(), 4);
        assert_eq!(v[3], 4.0);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v.to_vector().len(), 4);

        let mut buffer = [0.0; 6];
        {
            let mut v = StensorView::<3>::new(&mut buffer).unwrap();
            v[5] = 1.5;
            assert_eq!(v.size(), 6);
            assert_eq!(v[5], 1.5);
        }
        assert_eq!(buffer[5], 1.5);
        let mut v = StensorView::<1>::new(&mut buffer).unwrap();
        v.assign(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(v.assign(&[1.0]).err(), Some("values must have the size of the symmetric tensor"));
        assert_eq!(buffer[..4], [1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn stensor_views_capture_errors() {
        let buffer = [0.0; 3];
        assert_eq!(
            ConstStensorView::<2>::new(&buffer).err(),
            Some("buffer is too small for a symmetric tensor view")
        );
        assert_eq!(
            ConstStensorView::<4>::new(&buffer).err(),
            Some("space dimension must be 1, 2 or 3")
        );
        let mut buffer = [0.0; 5];
        assert_eq!(
            StensorView::<3>::new(&mut buffer).err(),
            Some("buffer is too small for a symmetric tensor view")
        );
    }

    #[test]
    fn st2tost2_views_work() {
        let buffer: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let d = ConstST2toST2View::<2>::new(&buffer).unwrap();
        assert_eq!(d.size(), 4);
        assert_eq!(d.get(1, 2), 6.0);
        assert_eq!(d[(3, 0)], 12.0);
        assert_eq!(d.to_matrix()[(0, 3)], 3.0);

        let mut buffer = vec![0.0; 9];
        {
            let mut d = ST2toST2View::<1>::new(&mut buffer).unwrap();
            d.set(0, 2, 1.0);
            d[(2, 0)] = 2.0;
            assert_eq!(d.get(2, 0), 2.0);
            assert_eq!(d.to_matrix()[(0, 2)], 1.0);
        }
        assert_eq!(buffer[2], 1.0);
        assert_eq!(buffer[6], 2.0);

        let mut d = ST2toST2View::<1>::new(&mut buffer).unwrap();
        d.assign(&DMatrix::identity(3, 3)).unwrap();
        assert_eq!(
            d.assign(&DMatrix::identity(4, 4)).err(),
            Some("matrix must have the size of the fourth-order tensor")
        );
        assert_eq!(buffer, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            ConstST2toST2View::<3>::new(&[0.0; 35]).err(),
            Some("buffer is too small for a fourth-order tensor view")
        );
    }
}
