//! Fixed-capacity rolling window over the most recent values of one metric

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Window<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T> Window<T> {
    /// Create an empty window holding at most `capacity` values.
    ///
    /// A capacity of zero is raised to one: an empty window could never
    /// report a mean for the reading that was just appended.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting and returning the oldest one when full
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Values oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }
}

impl<T> Window<T>
where
    T: Copy + Into<f64>,
{
    /// Arithmetic mean of the current contents, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let len = self.values.len() as f64;
        let sum: f64 = self.values.iter().map(|v| Into::<f64>::into(*v)).sum();
        if sum.is_finite() {
            return Some(sum / len);
        }
        // Finite values near f64::MAX overflow the plain sum
        Some(self.values.iter().map(|v| Into::<f64>::into(*v) / len).sum())
    }
}
