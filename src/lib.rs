// MIT License
//
// Copyright (c) 2025 Jai Veilleux
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Dynamic weighted random sampling.
//!
//! A [ProbabilityDistribution] holds unique elements $x_i$ with positive
//! weights $w_i$ and draws $x_j$ with probability $\dfrac{w_j}{\sum_i w_i}$.
//! Elements can be added and removed between draws.
//!
//! Three interchangeable backings implement the same trait:
//!
//! | backing | add | remove | sample |
//! |---|---|---|---|
//! | [ArrayDistribution] | $\mathcal{O}(1)$ | $\mathcal{O}(1)$ | $\mathcal{O}(n)$ |
//! | [LinkedListDistribution] | $\mathcal{O}(1)$ | $\mathcal{O}(1)$ | $\mathcal{O}(n)$ |
//! | [TreeDistribution] | $\mathcal{O}(d)$ | $\mathcal{O}(d)$ | $\mathcal{O}(d)$ |
//!
//! where $d$ is the depth of the weight tree, close to $\log_2 n$ in practice.
//!
//! Each instance owns a PCG32 generator. Use `with_seed` for reproducible
//! sample streams.

// Only compiles the module if py_bind feature is enabled
#[cfg(feature = "py_bind")]
mod py_bind;
#[cfg(feature = "py_bind")]
use pyo3::{pymodule, types::PyModule, Bound, PyResult};

mod array_distribution;
mod binary_tree;
pub mod distribution;
mod linked_list_distribution;
mod node_ref;
mod tree_distribution;

pub use array_distribution::ArrayDistribution;
pub use distribution::{DistError, DistResult, ProbabilityDistribution};
pub use linked_list_distribution::LinkedListDistribution;
pub use tree_distribution::TreeDistribution;

#[cfg(feature = "py_bind")]
#[pymodule]
fn probdist_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    py_bind::register_py(m)?;

    Ok(())
}
