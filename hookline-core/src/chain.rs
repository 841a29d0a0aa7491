//! Single-use abortable task chain
//!
//! An [`AbortChain`] threads one value through a sequence of async steps and
//! unifies three distinct exit styles under a single primitive: a normal final
//! value, a thrown business error, and a deliberate short-circuit. Every
//! consumer gets the same guarantees about ordering and exactly-once
//! finalization without hand-rolled `try/finally` scaffolding.
//!
//! Steps do not throw; they return `Result<T, Halt<R, E>>` and use the
//! [`Controller`] to build the short-circuit variants:
//!
//! ```rust
//! use hookline_core::chain::AbortChain;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let res: Result<i32, &str> = AbortChain::new(1)
//!     .next(|v, _ctl| async move { Ok(v + 1) })
//!     .next(|v, ctl| async move {
//!         if v > 100 {
//!             return Err(ctl.abort(0));
//!         }
//!         Ok(v * 2)
//!     })
//!     .done()
//!     .await;
//! assert_eq!(res, Ok(4));
//! # }
//! ```

use futures::future::BoxFuture;
use std::future::Future;
use std::marker::PhantomData;
use thiserror::Error;

/// Early exit raised by a chain step.
///
/// `R` is the chain's final value type, `E` its error type. An abort carries a
/// substitute outcome of the *final* type even when raised by an intermediate
/// step, which is what lets a coordination step answer directly from a cache.
#[derive(Debug)]
pub enum Halt<R, E> {
    /// Short-circuit with a substitute successful result.
    Abort(R),
    /// Short-circuit with a substitute failure.
    AbortError(E),
    /// Never settle: the chain's future stays pending forever.
    Stall,
    /// A genuine business error from a step.
    Error(E),
}

impl<R, E> From<E> for Halt<R, E> {
    fn from(reason: E) -> Self {
        Halt::Error(reason)
    }
}

/// Per-execution capability handed to every step.
///
/// Constructs the deliberate [`Halt`] variants; a step raises one by returning
/// `Err(ctl.abort(..))` and the chain skips all remaining steps.
pub struct Controller<R, E> {
    _outcome: PhantomData<fn() -> (R, E)>,
}

impl<R, E> Controller<R, E> {
    /// Abort the chain, resolving it to `value`.
    pub fn abort(&self, value: R) -> Halt<R, E> {
        Halt::Abort(value)
    }

    /// Abort the chain, rejecting it with `reason`.
    pub fn abort_error(&self, reason: E) -> Halt<R, E> {
        Halt::AbortError(reason)
    }

    /// Stop the chain without ever settling its future.
    ///
    /// The caller awaiting [`AbortChain::done`] will hang forever; this is a
    /// deliberate opt-in escape hatch for adapters that must not resolve.
    pub fn stall(&self) -> Halt<R, E> {
        Halt::Stall
    }
}

impl<R, E> Clone for Controller<R, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, E> Copy for Controller<R, E> {}

impl<R, E> Default for Controller<R, E> {
    fn default() -> Self {
        Self {
            _outcome: PhantomData,
        }
    }
}

/// What an aborted chain carried when it stopped.
#[derive(Debug)]
pub enum AbortPayload<R, E> {
    /// The chain resolved early via [`Controller::abort`].
    Resolved(R),
    /// The chain rejected early via [`Controller::abort_error`].
    Rejected(E),
}

/// Registration-time misuse of the chain builder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// A singleton handler slot was registered twice on one chain.
    #[error("`{0}` handler is already registered")]
    AlreadyRegistered(&'static str),
}

impl From<ChainError> for hookline_common::Error {
    fn from(err: ChainError) -> Self {
        hookline_common::Error::HookConflict(err.to_string())
    }
}

type CaptureFn<'a, R, E> =
    Box<dyn FnOnce(E, Controller<R, E>) -> BoxFuture<'a, Result<R, Halt<R, E>>> + Send + 'a>;
type CompletedFn<'a, R, E> =
    Box<dyn FnOnce(Controller<R, E>) -> BoxFuture<'a, Result<(), Halt<R, E>>> + Send + 'a>;
type AbortFn<'a, R, E> = Box<
    dyn FnOnce(AbortPayload<R, E>) -> BoxFuture<'a, Result<AbortPayload<R, E>, Halt<R, E>>>
        + Send
        + 'a,
>;

/// A single-use sequential pipeline of async steps over one value.
///
/// `T` is the current value type, `R` the final one; [`AbortChain::done`] is
/// only available once the two coincide. Besides the ordered `next` steps, a
/// chain holds at most one error interceptor (`capture`), one finalizer
/// (`completed`), and one abort observer (`abort`); registering any of them a
/// second time fails immediately with [`ChainError::AlreadyRegistered`].
pub struct AbortChain<'a, T, R, E> {
    pending: BoxFuture<'a, Result<T, Halt<R, E>>>,
    on_capture: Option<CaptureFn<'a, R, E>>,
    on_completed: Option<CompletedFn<'a, R, E>>,
    on_abort: Option<AbortFn<'a, R, E>>,
}

enum Terminal<R, E> {
    Value(R),
    AbortValue(R),
    AbortError(E),
    Failure(E),
    Stall,
}

impl<R, E> Terminal<R, E> {
    fn from_halt(halt: Halt<R, E>) -> Self {
        match halt {
            Halt::Abort(value) => Terminal::AbortValue(value),
            Halt::AbortError(reason) => Terminal::AbortError(reason),
            Halt::Stall => Terminal::Stall,
            Halt::Error(reason) => Terminal::Failure(reason),
        }
    }
}

impl<'a, T, R, E> AbortChain<'a, T, R, E>
where
    T: Send + 'a,
    R: Send + 'a,
    E: Send + 'a,
{
    /// Start a chain with an initial value.
    pub fn new(initial: T) -> Self {
        Self {
            pending: Box::pin(async move { Ok(initial) }),
            on_capture: None,
            on_completed: None,
            on_abort: None,
        }
    }

    /// Append an async transform; steps run strictly in append order.
    pub fn next<U, F, Fut>(self, step: F) -> AbortChain<'a, U, R, E>
    where
        U: Send + 'a,
        F: FnOnce(T, Controller<R, E>) -> Fut + Send + 'a,
        Fut: Future<Output = Result<U, Halt<R, E>>> + Send + 'a,
    {
        let pending = self.pending;
        AbortChain {
            pending: Box::pin(async move {
                let value = pending.await?;
                step(value, Controller::default()).await
            }),
            on_capture: self.on_capture,
            on_completed: self.on_completed,
            on_abort: self.on_abort,
        }
    }

    /// Register the single error interceptor.
    ///
    /// It runs only for `Halt::Error` outcomes; its result supersedes the
    /// chain's, and it may itself raise an abort or a stall.
    pub fn capture<F, Fut>(mut self, on_capture: F) -> Result<Self, ChainError>
    where
        F: FnOnce(E, Controller<R, E>) -> Fut + Send + 'a,
        Fut: Future<Output = Result<R, Halt<R, E>>> + Send + 'a,
    {
        if self.on_capture.is_some() {
            return Err(ChainError::AlreadyRegistered("capture"));
        }
        self.on_capture = Some(Box::new(move |reason, ctl| {
            Box::pin(on_capture(reason, ctl))
        }));
        Ok(self)
    }

    /// Register the single finalizer, invoked exactly once for every terminal
    /// outcome. A `Halt` raised here supersedes the outcome and skips the
    /// abort observer; its errors propagate to the caller of `done`.
    pub fn completed<F, Fut>(mut self, on_completed: F) -> Result<Self, ChainError>
    where
        F: FnOnce(Controller<R, E>) -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), Halt<R, E>>> + Send + 'a,
    {
        if self.on_completed.is_some() {
            return Err(ChainError::AlreadyRegistered("completed"));
        }
        self.on_completed = Some(Box::new(move |ctl| Box::pin(on_completed(ctl))));
        Ok(self)
    }

    /// Register the single abort observer, invoked only when the terminal
    /// outcome was an abort (value- or error-flavored). It receives the
    /// carried payload and may transform it.
    pub fn abort<F, Fut>(mut self, on_abort: F) -> Result<Self, ChainError>
    where
        F: FnOnce(AbortPayload<R, E>) -> Fut + Send + 'a,
        Fut: Future<Output = Result<AbortPayload<R, E>, Halt<R, E>>> + Send + 'a,
    {
        if self.on_abort.is_some() {
            return Err(ChainError::AlreadyRegistered("abort"));
        }
        self.on_abort = Some(Box::new(move |payload| Box::pin(on_abort(payload))));
        Ok(self)
    }
}

impl<R, E> AbortChain<'_, R, R, E>
where
    R: Send,
    E: Send,
{
    /// Freeze the chain and execute it.
    ///
    /// Resolves with the folded value (or an abort's substitute value),
    /// rejects with a business or abort error, and never settles after a
    /// stall.
    pub async fn done(self) -> Result<R, E> {
        let AbortChain {
            pending,
            on_capture,
            on_completed,
            on_abort,
        } = self;

        let mut terminal = match pending.await {
            Ok(value) => Terminal::Value(value),
            Err(halt) => Terminal::from_halt(halt),
        };

        // Error interceptor: only for genuine errors, never for aborts.
        terminal = match terminal {
            Terminal::Failure(reason) => match on_capture {
                Some(capture) => match capture(reason, Controller::default()).await {
                    Ok(value) => Terminal::Value(value),
                    Err(halt) => Terminal::from_halt(halt),
                },
                None => Terminal::Failure(reason),
            },
            other => other,
        };

        // Finalizer: always runs, exactly once. A halt here wins outright.
        if let Some(completed) = on_completed {
            if let Err(halt) = completed(Controller::default()).await {
                return settle(Terminal::from_halt(halt)).await;
            }
        }

        // Abort observer: only for abort-flavored terminals.
        if let Some(observer) = on_abort {
            terminal = match terminal {
                Terminal::AbortValue(value) => {
                    observe(observer, AbortPayload::Resolved(value)).await
                }
                Terminal::AbortError(reason) => {
                    observe(observer, AbortPayload::Rejected(reason)).await
                }
                other => other,
            };
        }

        settle(terminal).await
    }
}

async fn observe<R, E>(observer: AbortFn<'_, R, E>, payload: AbortPayload<R, E>) -> Terminal<R, E> {
    match observer(payload).await {
        Ok(AbortPayload::Resolved(value)) => Terminal::AbortValue(value),
        Ok(AbortPayload::Rejected(reason)) => Terminal::AbortError(reason),
        Err(halt) => Terminal::from_halt(halt),
    }
}

async fn settle<R, E>(terminal: Terminal<R, E>) -> Result<R, E> {
    match terminal {
        Terminal::Value(value) | Terminal::AbortValue(value) => Ok(value),
        Terminal::AbortError(reason) | Terminal::Failure(reason) => Err(reason),
        Terminal::Stall => std::future::pending().await,
    }
}
