//! Step functions and the context they receive

use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::type_name;
use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stepbind_model::{StepArgument, TableRow};

/// Outcome of one step function
pub type StepResult = anyhow::Result<()>;

/// Future returned by a step function
pub type StepFuture = BoxFuture<'static, StepResult>;

/// Type-erased step function
pub type StepFn = Arc<dyn Fn(StepContext) -> StepFuture + Send + Sync>;

/// Erase an async closure into a [`StepFn`]
pub fn step_fn<F, Fut>(function: F) -> StepFn
where
    F: Fn(StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    Arc::new(move |ctx| function(ctx).boxed())
}

/// Arguments and controls handed to a step function
///
/// Positional arguments come from the matcher's capture groups, followed by
/// the step's attached table or doc string when present.
#[derive(Debug, Clone)]
pub struct StepContext {
    args: Vec<String>,
    argument: Option<StepArgument>,
    pending: Arc<AtomicBool>,
    probe: bool,
}

impl StepContext {
    /// Context for a real run
    #[must_use]
    pub fn new(args: Vec<String>, argument: Option<StepArgument>) -> Self {
        Self {
            args,
            argument,
            pending: Arc::new(AtomicBool::new(false)),
            probe: false,
        }
    }

    /// Context used to detect pending steps before registration
    #[must_use]
    pub fn probe() -> Self {
        Self {
            args: Vec::new(),
            argument: None,
            pending: Arc::new(AtomicBool::new(false)),
            probe: true,
        }
    }

    /// Captured arguments
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Captured argument at `index`
    ///
    /// # Errors
    /// Fails if the matcher captured fewer arguments
    pub fn arg(&self, index: usize) -> anyhow::Result<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| anyhow::anyhow!("step has no argument #{index} ({} captured)", self.args.len()))
    }

    /// Captured argument at `index`, parsed
    ///
    /// # Errors
    /// Fails if the argument is missing or does not parse as `T`
    pub fn parse_arg<T>(&self, index: usize) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.arg(index)?;
        raw.parse::<T>().map_err(|e| {
            anyhow::anyhow!(
                "argument #{index} ({raw:?}) is not a valid {}: {e}",
                type_name::<T>()
            )
        })
    }

    /// Attached table or doc string
    #[inline]
    #[must_use]
    pub fn argument(&self) -> Option<&StepArgument> {
        self.argument.as_ref()
    }

    /// Attached data table
    ///
    /// # Errors
    /// Fails if the step has no table attached
    pub fn table(&self) -> anyhow::Result<&[TableRow]> {
        self.argument
            .as_ref()
            .and_then(StepArgument::as_table)
            .ok_or_else(|| anyhow::anyhow!("step has no data table"))
    }

    /// Attached doc string
    ///
    /// # Errors
    /// Fails if the step has no doc string attached
    pub fn doc_string(&self) -> anyhow::Result<&str> {
        self.argument
            .as_ref()
            .and_then(StepArgument::as_doc_string)
            .ok_or_else(|| anyhow::anyhow!("step has no doc string"))
    }

    /// Number of values the step receives
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len() + usize::from(self.argument.is_some())
    }

    /// Mark the scenario as pending
    ///
    /// Called during the probe, this makes the scenario register as a
    /// disabled test. Called during a real run it only records the flag.
    pub fn pending(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Check if [`pending`](Self::pending) was called
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Check if this is the registration-time probe rather than a real run
    #[inline]
    #[must_use]
    pub fn is_probe(&self) -> bool {
        self.probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn typed_arguments() {
        let ctx = StepContext::new(vec!["42".to_string(), "x".to_string()], None);
        assert_eq!(ctx.parse_arg::<u32>(0).unwrap(), 42);
        let err = ctx.parse_arg::<u32>(1).unwrap_err();
        assert!(err.to_string().contains("argument #1 (\"x\")"));
        assert!(ctx.arg(2).is_err());
    }

    #[test]
    fn attached_argument_counts_toward_arity() {
        let table = StepArgument::table(&["name"], vec![vec!["Mars"]]);
        let ctx = StepContext::new(vec!["1".to_string()], Some(table));
        assert_eq!(ctx.arity(), 2);
        assert_eq!(ctx.table().unwrap()[0]["name"], "Mars");
        assert!(ctx.doc_string().is_err());
    }

    #[test]
    fn pending_flag_is_shared_between_clones() {
        let ctx = StepContext::probe();
        let observer = ctx.clone();
        ctx.pending();
        assert!(observer.is_pending());
        assert!(observer.is_probe());
    }

    #[test]
    fn step_fn_erases_async_closure() {
        let function = step_fn(|ctx: StepContext| async move {
            anyhow::ensure!(ctx.arg(0)? == "ok", "unexpected argument");
            Ok(())
        });
        assert!(block_on(function(StepContext::new(vec!["ok".to_string()], None))).is_ok());
        assert!(block_on(function(StepContext::new(vec!["no".to_string()], None))).is_err());
    }
}
