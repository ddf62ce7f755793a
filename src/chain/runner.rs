//! # Run a single step of a chain.
//!
//! Executes the action at the chain's current position, and turns its result
//! into the next transition.
//!
//! ## Event flow
//! ```text
//! Success:
//!   publish StepStarting → execute → resolve(true)  → publish StepSucceeded
//!                                                    ├─ more steps → run_soon(next step)
//!                                                    └─ last step  → settle(Succeeded)
//! Logical failure:
//!   publish StepStarting → execute → resolve(false) | fail_with(reason)
//!                                                   → publish StepFailed → settle(Failed)
//!
//! Error / panic:
//!   publish StepStarting → execute → Err(e) | panic → ctx["failure"] = message
//!                                                   → publish StepFailed → settle(Failed)
//! ```
//!
//! ## Rules
//! - The next step is always scheduled, never called directly.
//! - A result arriving after the chain became terminal is ignored, reason included.
//! - "Last step" is decided when the result arrives, so actions appended while
//!   the chain runs are still executed.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::actions::OnResult;
use crate::error::panic_message;
use crate::events::{Event, EventKind};

use super::inner::{Inner, Terminal};
use super::state::Outcome;

impl Inner {
    /// Executes the step at the current position, if the chain is still running.
    pub(crate) fn run_step(self: &Arc<Self>) {
        let Some((step, action)) = self.lock().next_step() else {
            return;
        };
        let name: Arc<str> = Arc::from(action.name());

        self.publish(
            Event::new(EventKind::StepStarting)
                .with_step(step)
                .with_action(Arc::clone(&name)),
        );

        let chain = Arc::clone(self);
        let step_name = Arc::clone(&name);
        let on_result = OnResult::with_reason(move |success, reason| {
            chain.on_result(step, &step_name, success, reason)
        });

        let res = catch_unwind(AssertUnwindSafe(|| {
            action.execute(self.ctx.clone(), on_result)
        }));
        let reason = match res {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic_err) => {
                let msg = panic_message(&*panic_err);
                tracing::debug!(chain = self.id, step, action = &*name, %msg, "action panicked");
                msg
            }
        };

        if self.lock().outcome().is_terminal() {
            return;
        }
        self.publish(
            Event::new(EventKind::StepFailed)
                .with_step(step)
                .with_action(name)
                .with_reason(reason.clone()),
        );
        self.fail(reason, false);
    }

    /// Handles the result reported for `step`.
    ///
    /// An explicit `reason` replaces whatever the context holds; without one, a
    /// reason the action wrote itself is kept.
    fn on_result(
        self: &Arc<Self>,
        step: usize,
        action: &Arc<str>,
        success: bool,
        reason: Option<String>,
    ) {
        if !success {
            if self.lock().outcome().is_terminal() {
                return;
            }
            let mut ev = Event::new(EventKind::StepFailed)
                .with_step(step)
                .with_action(Arc::clone(action));
            if let Some(reason) = &reason {
                ev = ev.with_reason(reason.as_str());
            }
            self.publish(ev);
            match reason {
                Some(reason) => self.fail(reason, false),
                None => self.fail(format!("action '{action}' reported failure"), true),
            }
            return;
        }

        let finished = {
            let mut st = self.lock();
            if st.outcome().is_terminal() {
                return;
            }
            if st.exhausted() {
                st.finish(Outcome::Succeeded)
            } else {
                None
            }
        };

        self.publish(
            Event::new(EventKind::StepSucceeded)
                .with_step(step)
                .with_action(Arc::clone(action)),
        );
        match finished {
            Some(finished) => self.settle(finished, Terminal::Succeeded),
            None => self.schedule_step(),
        }
    }
}
