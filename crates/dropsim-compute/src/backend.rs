//! Backend selection and the deterministic map primitives.

use serde::{Deserialize, Serialize};

/// Strategy for executing independent work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Sequential loop on the calling thread.
    #[default]
    Scalar,
    /// Work-stealing parallel loop on the rayon global pool.
    ///
    /// Without the `parallel` feature this runs sequentially.
    Parallel,
}

impl Backend {
    /// Returns the backend name.
    pub fn name(&self) -> &str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Parallel => "parallel",
        }
    }

    /// True when work actually fans out across threads.
    pub fn is_parallel(&self) -> bool {
        matches!(self, Backend::Parallel) && cfg!(feature = "parallel")
    }

    /// Number of threads work is spread over.
    pub fn threads(&self) -> usize {
        if self.is_parallel() {
            worker_threads()
        } else {
            1
        }
    }

    /// Evaluates `f(0..count)` and returns the results in index order.
    ///
    /// On failure the error of the lowest failing index is returned,
    /// whichever thread found it first.
    pub fn try_map<R, E, F>(&self, count: usize, f: F) -> Result<Vec<R>, E>
    where
        R: Send,
        E: Send,
        F: Fn(usize) -> Result<R, E> + Sync + Send,
    {
        if self.is_parallel() {
            parallel_map(count, f).into_iter().collect()
        } else {
            (0..count).map(f).collect()
        }
    }

    /// Evaluates `f(0..count)` and returns the results in index order.
    pub fn map<R, F>(&self, count: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        if self.is_parallel() {
            parallel_map(count, f)
        } else {
            (0..count).map(f).collect()
        }
    }

    /// Applies `f` to every item of `items` in place.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        if self.is_parallel() {
            parallel_for_each(items, f);
        } else {
            items.iter_mut().enumerate().for_each(|(i, item)| f(i, item));
        }
    }

    /// Sum of `f(0..count)`, accumulated in index order.
    pub fn sum<F>(&self, count: usize, f: F) -> f64
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        self.map(count, f).into_iter().sum()
    }
}

#[cfg(feature = "parallel")]
fn worker_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn worker_threads() -> usize {
    1
}

#[cfg(feature = "parallel")]
fn parallel_map<R, F>(count: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn parallel_map<R, F>(count: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    (0..count).map(f).collect()
}

#[cfg(feature = "parallel")]
fn parallel_for_each<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    use rayon::prelude::*;
    items.par_iter_mut().enumerate().for_each(|(i, item)| f(i, item));
}

#[cfg(not(feature = "parallel"))]
fn parallel_for_each<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    items.iter_mut().enumerate().for_each(|(i, item)| f(i, item));
}
