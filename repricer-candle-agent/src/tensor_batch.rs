use candle_core::{error::Result, Device, IndexOp, Tensor};
use repricer_core::generic_replay_buffer::BatchBase;

/// A buffer consisting of a [`Tensor`].
///
/// The internal buffer is lazily initialized on the first push, taking its
/// row shape and dtype from the pushed data.
///
/// [`Tensor`]: https://docs.rs/candle-core/0.8.4/candle_core/struct.Tensor.html
#[derive(Clone, Debug)]
pub struct TensorBatch {
    buf: Option<Tensor>,
    capacity: usize,
}

impl TensorBatch {
    /// Wraps an existing tensor whose first dimension is the batch size.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.dims()[0] as _;
        Self {
            buf: Some(t),
            capacity,
        }
    }

    /// Moves the internal buffer to the given device.
    pub fn to(&mut self, device: &Device) -> Result<()> {
        if let Some(buf) = &self.buf {
            self.buf = Some(buf.to_device(device)?);
        }
        Ok(())
    }
}

impl BatchBase for TensorBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity,
        }
    }

    /// Pushes given data.
    ///
    /// If the internal buffer is empty, it will be initialized with the shape
    /// `[capacity, data.buf.dims()[1..]]`.
    fn push(&mut self, index: usize, data: Self) {
        if data.buf.is_none() {
            return;
        }

        let batch_size = data.buf.as_ref().unwrap().dims()[0];
        if batch_size == 0 {
            return;
        }

        if self.buf.is_none() {
            let mut shape = data.buf.as_ref().unwrap().dims().to_vec();
            shape[0] = self.capacity;
            let dtype = data.buf.as_ref().unwrap().dtype();
            let device = Device::Cpu;
            self.buf = Some(Tensor::zeros(shape, dtype, &device).unwrap());
        }

        if index + batch_size > self.capacity {
            // Wrap around the end of the ring.
            let batch_size = self.capacity - index;
            let data = &data.buf.unwrap();
            let data1 = data.i((..batch_size,)).unwrap();
            let data2 = data.i((batch_size..,)).unwrap();
            self.buf
                .as_mut()
                .unwrap()
                .slice_set(&data1, 0, index)
                .unwrap();
            self.buf.as_mut().unwrap().slice_set(&data2, 0, 0).unwrap();
        } else {
            self.buf
                .as_mut()
                .unwrap()
                .slice_set(&data.buf.unwrap(), 0, index)
                .unwrap();
        }
    }

    fn sample(&self, ixs: &Vec<usize>) -> Self {
        let capacity = ixs.len();
        let ixs = {
            let device = self.buf.as_ref().unwrap().device();
            let ixs = ixs.iter().map(|x| *x as u32).collect();
            Tensor::from_vec(ixs, &[capacity], device).unwrap()
        };
        let buf = Some(self.buf.as_ref().unwrap().index_select(&ixs, 0).unwrap());
        Self { buf, capacity }
    }
}

impl From<TensorBatch> for Tensor {
    fn from(b: TensorBatch) -> Self {
        b.buf.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    #[test]
    fn push_and_sample_round_trip() {
        let mut batch = TensorBatch::new(4);
        for i in 0..6 {
            let t = Tensor::from_slice(&[i as f32, 2.0 * i as f32], (1, 2), &Device::Cpu).unwrap();
            batch.push(i % 4, TensorBatch::from_tensor(t));
        }

        let sampled = batch.sample(&vec![0, 1]);
        let t: Tensor = sampled.into();
        let rows = t.to_vec2::<f32>().unwrap();
        assert_eq!(rows, vec![vec![4.0, 8.0], vec![5.0, 10.0]]);
    }

    #[test]
    fn dtype_follows_pushed_data() {
        let mut batch = TensorBatch::new(2);
        let t = Tensor::from_slice(&[7i64], (1, 1), &Device::Cpu).unwrap();
        batch.push(0, TensorBatch::from_tensor(t));
        let sampled = batch.sample(&vec![0]);
        let t: Tensor = sampled.into();
        assert_eq!(t.dtype(), DType::I64);
    }
}
