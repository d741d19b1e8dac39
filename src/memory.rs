use std::sync::Mutex;

use ndarray::Array2;

/// An array slot that keeps its allocation between frames.
#[derive(Clone, Debug)]
pub enum Array2Recycle<T> {
    Empty,
    Recycle(Array2<T>),
}

impl<T> Default for Array2Recycle<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> Array2Recycle<T>
where
    T: num::Zero + Clone,
{
    /// Returns an array of `required_dim` where every cell is zero. The previous allocation is
    /// reused when its shape matches, so no value from an earlier frame survives.
    pub fn get(self, required_dim: (usize, usize)) -> Array2<T> {
        match self {
            Self::Recycle(mut current) if current.dim() == required_dim => {
                current.fill(T::zero());
                current
            }
            _ => Array2::<T>::zeros(required_dim),
        }
    }

    /// Zero-filled array in place of the slot, same as [`Array2Recycle::get`].
    pub fn take(&mut self, required_dim: (usize, usize)) -> Array2<T> {
        std::mem::take(self).get(required_dim)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Scratch grids for one frame. Whoever holds a `&mut FrameBuffers` is its only writer; the
/// pipeline never shares one between two frames in flight.
#[derive(Debug, Default)]
pub struct FrameBuffers {
    pub range: Array2Recycle<f32>,
    pub height: Array2Recycle<f32>,
    pub dense_range: Array2Recycle<f32>,
    pub dense_height: Array2Recycle<f32>,
    pub suppressed: Array2Recycle<f32>,
}

impl FrameBuffers {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Pool of [`FrameBuffers`]. Each checkout hands out an exclusive instance, so concurrent
/// frames never write to the same grids.
#[derive(Debug, Default)]
pub struct GridPool {
    free: Mutex<Vec<FrameBuffers>>,
}

impl GridPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> FrameBuffers {
        self.free
            .lock()
            .ok()
            .and_then(|mut free| free.pop())
            .unwrap_or_default()
    }

    pub fn release(&self, buffers: FrameBuffers) {
        if let Ok(mut free) = self.free.lock() {
            free.push(buffers);
        }
    }

    /// Number of idle buffer sets.
    pub fn idle(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }
}
