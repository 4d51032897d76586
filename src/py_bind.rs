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

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyAny;

use std::hash::Hash;

use crate::distribution::{DistError, ProbabilityDistribution};
use crate::{ArrayDistribution, LinkedListDistribution, TreeDistribution};

impl From<DistError> for PyErr {
    fn from(err: DistError) -> Self {
        match err {
            DistError::EmptyDistribution | DistError::InvalidWeight(_) => {
                PyErr::new::<PyValueError, _>(err.to_string())
            }
            DistError::InconsistentState(_) => PyErr::new::<PyRuntimeError, _>(err.to_string()),
        }
    }
}

const BACKINGS: [&str; 3] = ["array", "linked_list", "tree"];

/// Builds the requested backing behind the shared trait.
fn make_backing<T>(backing: &str, seed: Option<u64>) -> PyResult<Box<dyn ProbabilityDistribution<T>>>
where
    T: Clone + Eq + Hash + 'static,
{
    let dist: Box<dyn ProbabilityDistribution<T>> = match backing {
        "array" => Box::new(seed.map_or_else(ArrayDistribution::<T>::new, ArrayDistribution::with_seed)),
        "linked_list" => Box::new(
            seed.map_or_else(LinkedListDistribution::<T>::new, LinkedListDistribution::with_seed),
        ),
        "tree" => Box::new(seed.map_or_else(TreeDistribution::<T>::new, TreeDistribution::with_seed)),
        _ => {
            return Err(PyErr::new::<PyValueError, _>(format!(
                "Unsupported backing: {backing}, expected one of: {}",
                BACKINGS.join(", ")
            )));
        }
    };
    Ok(dist)
}

// Declare all supported element types in one pass
macro_rules! dist_variants {
    ( $( ($ty:ty, $Variant:ident, $kind_str:literal) ),+ $(,)?) => {

        enum Inner {
            $( $Variant(Box<dyn ProbabilityDistribution<$ty>>), )+
        }

        impl Inner {
            fn new(kind: &str, backing: &str, seed: Option<u64>) -> PyResult<Self> {
                match kind {
                    $( $kind_str => Ok(Inner::$Variant(make_backing::<$ty>(backing, seed)?)), )+
                    _ => Err(PyErr::new::<PyValueError, _>(format!("Unsupported kind: {kind}, expected one of: {}",
                                                       [$( $kind_str ),+].join(", ")))),
                }
            }

            fn size(&self) -> usize {
                match self { $( Inner::$Variant(d) => d.size(), )+ }
            }

            fn empty(&self) -> bool {
                match self { $( Inner::$Variant(d) => d.is_empty(), )+ }
            }

            fn contains(&self, key: &Bound<'_, PyAny>) -> PyResult<bool> {
                Ok(match self {
                    $( Inner::$Variant(d) => d.contains(&key.extract::<$ty>()?), )+
                })
            }

            fn total_weight(&self) -> f64 {
                match self { $( Inner::$Variant(d) => d.total_weight(), )+ }
            }

            fn weight(&self, key: &Bound<'_, PyAny>) -> PyResult<Option<f64>> {
                Ok(match self {
                    $( Inner::$Variant(d) => d.weight(&key.extract::<$ty>()?), )+
                })
            }

            fn add(&mut self, key: &Bound<'_, PyAny>, weight: f64) -> PyResult<bool> {
                match self {
                    $( Inner::$Variant(d) => {
                        let k: $ty = key.extract()?;
                        d.add(k, weight).map_err(Into::into)
                    } )+
                }
            }

            fn set_weight(&mut self, key: &Bound<'_, PyAny>, weight: f64) -> PyResult<()> {
                match self {
                    $( Inner::$Variant(d) => {
                        let k: $ty = key.extract()?;
                        d.set_weight(k, weight).map_err(Into::into)
                    } )+
                }
            }

            fn remove(&mut self, key: &Bound<'_, PyAny>) -> PyResult<bool> {
                match self {
                    $( Inner::$Variant(d) => {
                        let k: $ty = key.extract()?;
                        Ok(d.remove(&k))
                    } )+
                }
            }

            fn seed(&mut self, seed: u64) {
                match self { $( Inner::$Variant(d) => d.seed(seed), )+ }
            }

            fn sample<'py>(&mut self, py: Python<'py>) -> PyResult<PyObject> {
                match self {
                    $( Inner::$Variant(d) => {
                        let k = d.sample()?;
                        let obj: PyObject = k.into_pyobject(py)
                            .map_err(|e| PyErr::new::<PyValueError, _>(
                                format!("cannot convert sampled element: {e}")))?
                            .into_any()
                            .unbind();
                        Ok(obj)
                    } ),+
                }
            }

            fn clear(&mut self) {
                match self { $( Inner::$Variant(d) => d.clear(), )+ }
            }

            #[inline]
            fn kind_str(&self) -> &'static str {
                match self { $( Inner::$Variant(_) => $kind_str, )+ }
            }
        }
    };
}

// Element kinds exposed to Python
dist_variants! {
    (u64, U64, "u64"),
    ((u64, u64), Tuple2Int, "tuple2int"),
    (String, Str, "str"),
    ((String, String), Tuple2Str, "tuple2str"),
}

#[pyclass(
    name = "ProbabilityDistribution",
    // The backings are built on Rc node handles and cannot cross threads
    unsendable,
)]
struct PyProbabilityDistribution {
    inner: Inner,
    backing: &'static str,
}

#[pymethods]
impl PyProbabilityDistribution {
    #[new]
    #[pyo3(signature = (kind, backing = "tree", seed = None))]
    pub fn new(kind: &str, backing: &str, seed: Option<u64>) -> PyResult<Self> {
        let inner = Inner::new(kind, backing, seed)?;
        let backing = BACKINGS
            .iter()
            .copied()
            .find(|b| *b == backing)
            .unwrap_or("tree");
        Ok(PyProbabilityDistribution { inner, backing })
    }

    #[pyo3(name = "size")]
    fn py_size(&self) -> usize {
        self.inner.size()
    }

    #[pyo3(name = "empty")]
    fn py_empty(&self) -> bool {
        self.inner.empty()
    }

    #[pyo3(name = "contains")]
    fn py_contains(&self, key: &Bound<'_, PyAny>) -> PyResult<bool> {
        self.inner.contains(key)
    }

    #[pyo3(name = "total_weight")]
    fn py_total_weight(&self) -> f64 {
        self.inner.total_weight()
    }

    #[pyo3(name = "weight")]
    fn py_weight(&self, key: &Bound<'_, PyAny>) -> PyResult<Option<f64>> {
        self.inner.weight(key)
    }

    #[pyo3(name = "add")]
    fn py_add(&mut self, key: &Bound<'_, PyAny>, weight: f64) -> PyResult<bool> {
        self.inner.add(key, weight)
    }

    #[pyo3(name = "set_weight")]
    fn py_set_weight(&mut self, key: &Bound<'_, PyAny>, weight: f64) -> PyResult<()> {
        self.inner.set_weight(key, weight)
    }

    #[pyo3(name = "remove")]
    fn py_remove(&mut self, key: &Bound<'_, PyAny>) -> PyResult<bool> {
        self.inner.remove(key)
    }

    #[pyo3(name = "seed")]
    fn py_seed(&mut self, seed: u64) {
        self.inner.seed(seed)
    }

    #[pyo3(name = "sample")]
    fn py_sample<'py>(&mut self, py: Python<'py>) -> PyResult<PyObject> {
        self.inner.sample(py)
    }

    #[pyo3(name = "clear")]
    fn py_clear(&mut self) {
        self.inner.clear()
    }

    fn __contains__(&self, item: &Bound<'_, PyAny>) -> PyResult<bool> {
        self.inner.contains(item)
    }

    fn __len__(&self) -> usize {
        self.py_size()
    }

    fn __repr__(&self) -> String {
        format!(
            "ProbabilityDistribution(kind={}, backing={}, size={}, total_weight={})",
            self.inner.kind_str(),
            self.backing,
            self.inner.size(),
            self.inner.total_weight()
        )
    }
}

pub(crate) fn register_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyProbabilityDistribution>()?;
    Ok(())
}
