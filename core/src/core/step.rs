// core/src/core/step.rs

use super::ContextData;
use std::sync::Arc;

/// Evaluated right before a step runs; `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// A named step. Optional steps without handlers are skipped instead of failing the run.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

/// Builds a skip condition from a plain closure.
pub fn skip_when<TData, F>(f: F) -> Option<SkipCondition<TData>>
where
  TData: 'static + Send + Sync,
  F: Fn(&TData) -> bool + Send + Sync + 'static,
{
  Some(Arc::new(move |ctx: ContextData<TData>| {
    let guard = ctx.read();
    f(&guard)
  }))
}
