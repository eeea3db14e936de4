// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Instrumentation
//!
//! Three ways to time a callable, all built on [`time_call`]:
//!
//! - [`profiled!`](crate::profiled!) instruments functions where they are
//!   defined, keeping their signature.
//! - [`profiled`] wraps any `Fn` value into a [`Profiled`] whose
//!   [`call`](Profiled::call) takes the arguments as a tuple.
//! - [`time_call`] times a single closure under an explicit identifier.
//!
//! Every call checks for an active [`Profiler`](crate::Profiler). Without
//! one the callable runs directly. With one, the call is timed with a
//! monotonic clock and recorded once it returns; a call that panics records
//! nothing and the panic propagates unchanged.
//!
//! With the `profiling` feature disabled all of this compiles down to a
//! plain call.

#[cfg(feature = "profiling")]
use std::time::Instant;

use crate::function_id::FunctionId;

/// Run `f`, recording its duration under `function_id` if a profiler is
/// active
///
/// # Example
///
/// ```
/// use profiled::{FunctionId, Profiler, time_call};
///
/// static PARSE: FunctionId = FunctionId::from_static("parse");
///
/// let profiler = Profiler::new();
/// let tokens = profiler.scope(|| time_call(&PARSE, || "a b c".split(' ').count()));
///
/// assert_eq!(tokens, 3);
/// # if cfg!(feature = "profiling") {
/// assert_eq!(profiler.compute_stats()["parse"].num, 1);
/// # }
/// ```
#[inline]
pub fn time_call<R>(function_id: &FunctionId, f: impl FnOnce() -> R) -> R {
    #[cfg(feature = "profiling")]
    {
        let Some(profiler) = crate::context::current() else {
            return f();
        };
        let start = Instant::now();
        let result = f();
        profiler.record(function_id, start.elapsed());
        result
    }

    #[cfg(not(feature = "profiling"))]
    {
        let _ = function_id;
        f()
    }
}

/// Callables [`Profiled::call`] can invoke with a tuple of arguments
///
/// Implemented for every `Fn` taking up to eight arguments.
pub trait Callable<Args> {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg),*> Callable<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            #[inline]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Ret {
                (self)($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A);
impl_callable!(A, B);
impl_callable!(A, B, C);
impl_callable!(A, B, C, D);
impl_callable!(A, B, C, D, E);
impl_callable!(A, B, C, D, E, G);
impl_callable!(A, B, C, D, E, G, H);
impl_callable!(A, B, C, D, E, G, H, I);

/// A callable that records its calls into the active profiler
#[derive(Debug, Clone)]
pub struct Profiled<F> {
    id: FunctionId,
    func: F,
}

impl<F> Profiled<F> {
    /// Wrap `func`, recording under `id`
    pub fn new(id: impl Into<FunctionId>, func: F) -> Self {
        Self {
            id: id.into(),
            func,
        }
    }

    /// Identifier calls are recorded under
    pub fn id(&self) -> &FunctionId {
        &self.id
    }

    /// The wrapped callable
    pub fn inner(&self) -> &F {
        &self.func
    }

    /// Unwrap into the original callable
    pub fn into_inner(self) -> F {
        self.func
    }

    /// Invoke the wrapped callable with `args` as a tuple
    ///
    /// ```
    /// use profiled::profiled;
    ///
    /// fn add(a: u32, b: u32) -> u32 {
    ///     a + b
    /// }
    ///
    /// let add = profiled(add);
    /// assert_eq!(add.call((2, 3)), 5);
    /// assert_eq!(add.id().as_str(), "add");
    /// ```
    #[inline]
    pub fn call<Args>(&self, args: Args) -> F::Output
    where
        F: Callable<Args>,
    {
        time_call(&self.id, || self.func.invoke(args))
    }
}

/// Wrap a callable, deriving its identifier from its definition path
///
/// Free functions get their name (`get_answer`), methods and associated
/// functions `Type.name`, closures `enclosing_fn.<closure>`.
pub fn profiled<F>(func: F) -> Profiled<F> {
    Profiled {
        id: FunctionId::of(&func),
        func,
    }
}

/// Wrap a callable under an explicit identifier
pub fn profiled_as<F>(id: impl Into<FunctionId>, func: F) -> Profiled<F> {
    Profiled::new(id, func)
}

/// Instrument functions at their definition
///
/// Free functions are recorded under their name; functions inside an
/// `impl Type { ... }` block under `Type.name`, whether they take `self`
/// or not. The identifier is a `static`, computed at compile time.
///
/// ```
/// use profiled::{Profiler, profiled};
///
/// profiled! {
///     /// Always 42
///     pub fn get_answer() -> u32 {
///         42
///     }
/// }
///
/// struct AnswerFactory {
///     answer: u32,
/// }
///
/// profiled! {
///     impl AnswerFactory {
///         fn create() -> Self {
///             AnswerFactory { answer: 42 }
///         }
///
///         fn call(&self) -> u32 {
///             self.answer
///         }
///     }
/// }
///
/// let profiler = Profiler::new();
/// profiler.scope(|| {
///     get_answer();
///     AnswerFactory::create().call();
/// });
///
/// let report = profiler.compute_stats();
/// # if cfg!(feature = "profiling") {
/// assert!(report.contains("get_answer"));
/// assert!(report.contains("AnswerFactory.create"));
/// assert!(report.contains("AnswerFactory.call"));
/// # }
/// ```
///
/// Generic, `const`, `async` and `unsafe` functions are not accepted; use
/// [`time_call`] inside their body instead.
#[macro_export]
macro_rules! profiled {
    (
        impl $ty:ident {
            $(
                $(#[$meta:meta])*
                $vis:vis fn $name:ident ( $($params:tt)* ) $(-> $ret:ty)? $body:block
            )*
        }
    ) => {
        impl $ty {
            $(
                $(#[$meta])*
                $vis fn $name($($params)*) $(-> $ret)? {
                    static FUNCTION_ID: $crate::FunctionId = $crate::FunctionId::from_static(
                        concat!(stringify!($ty), ".", stringify!($name)),
                    );
                    $crate::time_call(&FUNCTION_ID, move || $(-> $ret)? { $body })
                }
            )*
        }
    };
    (
        $(
            $(#[$meta:meta])*
            $vis:vis fn $name:ident ( $($params:tt)* ) $(-> $ret:ty)? $body:block
        )*
    ) => {
        $(
            $(#[$meta])*
            $vis fn $name($($params)*) $(-> $ret)? {
                static FUNCTION_ID: $crate::FunctionId =
                    $crate::FunctionId::from_static(stringify!($name));
                $crate::time_call(&FUNCTION_ID, move || $(-> $ret)? { $body })
            }
        )*
    };
}
