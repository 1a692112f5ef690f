//! Sparse Adagrad.

use ndarray::{ArrayView1, ArrayViewMut1, Zip};

/// Starting value of every accumulator slot.
pub const INITIAL_ACCUMULATOR: f32 = 0.1;

/// Adagrad applied row by row, so only the rows a batch touched move.
///
/// ```text
/// acc   += g^2
/// theta -= lr * g / sqrt(acc)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Adagrad {
    learning_rate: f32,
}

impl Adagrad {
    /// Creates an optimizer with the given learning rate.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }

    /// Learning rate.
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Updates one parameter row and its accumulator row.
    pub fn update_row(
        &self,
        param: ArrayViewMut1<f32>,
        accum: ArrayViewMut1<f32>,
        grad: ArrayView1<f32>,
    ) {
        let lr = self.learning_rate;
        Zip::from(param)
            .and(accum)
            .and(grad)
            .for_each(|p, a, &g| {
                *a += g * g;
                *p -= lr * g / a.sqrt();
            });
    }

    /// Updates a single scalar parameter.
    #[inline]
    pub fn update_scalar(&self, param: &mut f32, accum: &mut f32, grad: f32) {
        *accum += grad * grad;
        *param -= self.learning_rate * grad / accum.sqrt();
    }
}
