use super::ConfigError;

use ndarray::{Array1, ArrayView1, ArrayViewMut1};

/// Adapter trait for reading contiguous 1D input.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing contiguous 1D output.
pub trait Write1D<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Write1D<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

// Strided views (e.g. one channel of an interleaved recording) are rejected rather than copied.
impl<T> Read1D<T> for Array1<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<T> Write1D<T> for Array1<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<T> Read1D<T> for ArrayView1<'_, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array_view" })
    }
}

impl<T> Write1D<T> for ArrayViewMut1<'_, T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut().ok_or(ConfigError::NonContiguous {
            arg: "array_view_mut",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Read1D, Write1D};
    use ndarray::{array, s, Array1};

    #[test]
    fn slice_vec_and_fixed_arrays_read() {
        let frame = [0.5f64, -0.25, 0.125];
        assert_eq!(frame.read_slice().expect("array adapter").len(), 3);

        let samples = vec![1.0f64, 2.0, 3.0, 4.0];
        assert_eq!(samples.read_slice().expect("vec adapter")[3], 4.0);

        let s: &[f64] = &samples[1..];
        assert_eq!(s.read_slice().expect("slice adapter"), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn ndarray_output_buffer_is_writable() {
        let mut out = Array1::<f64>::zeros(3);
        out.write_slice_mut()
            .expect("array1 write")
            .copy_from_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(out, array![4.0, 5.0, 6.0]);
    }

    #[test]
    fn strided_channel_view_is_rejected() {
        // Two interleaved channels; column 1 is a strided view.
        let stereo = array![[1.0f64, -1.0], [2.0, -2.0], [3.0, -3.0]];
        let right = stereo.slice(s![.., 1]);
        assert_eq!(
            right.read_slice().expect_err("strided view"),
            ConfigError::NonContiguous { arg: "array_view" }
        );

        let owned = right.to_owned();
        assert_eq!(owned.read_slice().expect("owned copy"), &[-1.0, -2.0, -3.0]);
    }
}
