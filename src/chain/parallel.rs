//! # Parallel group step.
//!
//! [`AllAction`] is the synthetic action appended by [`Chain::all`](crate::Chain::all).
//! When its turn comes it launches every member against the shared context
//! and rejoins them through a [`Latch`] sized to the member count.
//!
//! ```text
//!                   ┌──► member 1 ──► true  ──► latch.complete()
//! group.execute ────┼──► member 2 ──► true  ──► latch.complete() ──► (N of N) resolve(true)
//!                   └──► member N ──► false ──► resolve(false)   (first failure wins)
//! ```
//!
//! ## Rules
//! - The group result is resolved at most once: the first `false` (with its
//!   reason, if any), or the last `true`.
//! - Members still in flight after a failure are not cancelled; their results are dropped.
//! - A member returning `Err` or panicking stops launching the remaining members
//!   and fails the step through the chain's error path.
//! - An empty group fails with the latch's invalid-count error.

use std::sync::{Arc, Mutex, PoisonError};

use crate::actions::{Action, ActionRef, OnResult};
use crate::context::Context;
use crate::error::ActionError;
use crate::latch::Latch;

/// Group result slot shared by every member callback; emptied by the first resolution.
type Slot = Arc<Mutex<Option<OnResult>>>;

/// Runs its members concurrently; succeeds when all succeed.
pub(crate) struct AllAction {
    name: String,
    members: Vec<ActionRef>,
}

impl AllAction {
    pub fn new(members: Vec<ActionRef>) -> Self {
        let names: Vec<&str> = members.iter().map(|a| a.name()).collect();
        Self {
            name: format!("all[{}]", names.join(",")),
            members,
        }
    }
}

impl Action for AllAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: Context, on_result: OnResult) -> Result<(), ActionError> {
        let slot: Slot = Arc::new(Mutex::new(Some(on_result)));

        let on_all = Arc::clone(&slot);
        let latch = Arc::new(Latch::new(self.members.len(), move || {
            resolve(&on_all, true, None)
        })?);

        for member in &self.members {
            let latch = Arc::clone(&latch);
            let slot = Arc::clone(&slot);
            let done = OnResult::with_reason(move |success, reason| {
                if !success {
                    resolve(&slot, false, reason);
                } else if let Err(e) = latch.complete() {
                    tracing::debug!(error = %e, "extra completion in parallel group");
                }
            });
            member.execute(ctx.clone(), done)?;
        }
        Ok(())
    }
}

fn resolve(slot: &Mutex<Option<OnResult>>, success: bool, reason: Option<String>) {
    let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(on_result) = taken {
        on_result.forward(success, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionFn;
    use std::sync::mpsc;

    fn instant(name: &'static str, ok: bool) -> ActionRef {
        ActionFn::arc(name, move |ctx: Context, done: OnResult| {
            ctx.push("order", name);
            done.resolve(ok);
            Ok(())
        })
    }

    fn collect() -> (OnResult, mpsc::Receiver<bool>) {
        let (tx, rx) = mpsc::channel();
        (
            OnResult::new(move |ok| {
                let _ = tx.send(ok);
            }),
            rx,
        )
    }

    #[test]
    fn test_name_lists_members() {
        let group = AllAction::new(vec![instant("a", true), instant("b", true)]);
        assert_eq!(group.name(), "all[a,b]");
    }

    #[test]
    fn test_all_success_resolves_once() {
        let group = AllAction::new(vec![instant("a", true), instant("b", true)]);
        let (done, rx) = collect();

        group.execute(Context::new(), done).unwrap();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![true]);
    }

    #[test]
    fn test_first_failure_wins() {
        let group = AllAction::new(vec![
            instant("a", false),
            instant("b", false),
            instant("c", true),
        ]);
        let ctx = Context::new();
        let (done, rx) = collect();

        group.execute(ctx.clone(), done).unwrap();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![false]);
        assert_eq!(ctx.get("order"), Some(serde_json::json!(["a", "b", "c"])));
    }

    #[test]
    fn test_failure_reason_is_forwarded() {
        let explain: ActionRef = ActionFn::arc("explain", |_ctx: Context, done: OnResult| {
            done.fail_with("out of stock");
            Ok(())
        });
        let group = AllAction::new(vec![instant("a", true), explain]);
        let (tx, rx) = mpsc::channel();
        let done = OnResult::with_reason(move |ok, reason| {
            let _ = tx.send((ok, reason));
        });

        group.execute(Context::new(), done).unwrap();
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![(false, Some("out of stock".to_string()))]
        );
    }

    #[test]
    fn test_member_error_stops_launching() {
        let failing: ActionRef = ActionFn::arc("bad", |_ctx: Context, _done: OnResult| {
            Err(ActionError::fail("no"))
        });
        let group = AllAction::new(vec![failing, instant("never", true)]);
        let ctx = Context::new();
        let (done, rx) = collect();

        assert!(group.execute(ctx.clone(), done).is_err());
        assert!(!ctx.contains_key("order"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_empty_group_is_latch_error() {
        let group = AllAction::new(Vec::new());
        let (done, _rx) = collect();
        let err = group.execute(Context::new(), done).unwrap_err();
        assert_eq!(err.as_label(), "latch_invalid_count");
    }
}
