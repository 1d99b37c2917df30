use crate::backend::{Float, TensorData};
use crate::error::{Error, Result};

/// Scratch record for one function application.
///
/// Holds copies of the forward inputs the backward rule reads. Values are
/// written once during forward and read back by position during backward.
#[derive(Debug, Clone)]
pub struct Context<T>
where
    T: Float,
{
    saved_values: Vec<TensorData<T>>,
    saved: bool,
    released: bool,
}

impl<T> Default for Context<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Context<T>
where
    T: Float,
{
    pub fn new() -> Self {
        Self {
            saved_values: Vec::new(),
            saved: false,
            released: false,
        }
    }

    pub fn save_for_backwards(&mut self, values: &[&TensorData<T>]) -> Result<()> {
        if self.saved {
            return Err(Error::ContextAlreadySaved);
        }
        self.saved_values = values.iter().map(|&v| v.clone()).collect();
        self.saved = true;
        Ok(())
    }

    pub fn saved(&self, index: usize) -> Result<&TensorData<T>> {
        if self.released {
            return Err(Error::ContextReleased);
        }
        self.saved_values.get(index).ok_or(Error::UnsavedContext {
            index,
            saved: self.saved_values.len(),
        })
    }

    pub fn num_saved(&self) -> usize {
        self.saved_values.len()
    }

    /// Drops the saved values. Later reads fail with `ContextReleased`.
    pub fn release(&mut self) {
        self.saved_values.clear();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
