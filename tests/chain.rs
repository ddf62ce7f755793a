use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use taskchain::{
    ActionError, ActionFn, ActionRef, AsyncActionFn, Chain, ChainError, ChainFactory, Config,
    Context, EventKind, OnResult, Outcome, TokioScheduler, FAILURE_KEY,
};

fn factory() -> ChainFactory {
    ChainFactory::new(Arc::new(TokioScheduler::current()))
}

fn push(n: i64) -> ActionRef {
    ActionFn::arc(format!("push-{n}"), move |ctx: Context, done: OnResult| {
        ctx.push("order", n);
        done.success();
        Ok(())
    })
}

fn delayed(n: i64, ms: u64) -> ActionRef {
    AsyncActionFn::arc(format!("delayed-{n}"), move |ctx: Context| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        ctx.push("order", n);
        Ok::<_, ActionError>(true)
    })
}

fn refuse(name: &'static str) -> ActionRef {
    ActionFn::arc(name, |_ctx: Context, done: OnResult| {
        done.failure();
        Ok(())
    })
}

/// Wires both terminal callbacks to one channel.
fn outcomes(chain: &Chain) -> mpsc::UnboundedReceiver<&'static str> {
    let (tx, rx) = mpsc::unbounded_channel();
    let on_fail = tx.clone();
    chain
        .done(move |_| {
            let _ = tx.send("done");
        })
        .except(move |_| {
            let _ = on_fail.send("except");
        });
    rx
}

fn order(chain: &Chain) -> serde_json::Value {
    chain.context().get("order").unwrap_or(json!([]))
}

#[tokio::test(start_paused = true)]
async fn serial_actions_run_in_order() {
    let chain = factory().create_serial(vec![push(1), delayed(2, 10), push(5)]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("done"));
    assert_eq!(order(&chain), json!([1, 2, 5]));
    assert!(chain.completed());
    assert!(chain.succeeded());
    assert_eq!(chain.outcome(), Outcome::Succeeded);
}

#[tokio::test]
async fn eval_never_runs_inline() {
    let chain = factory().create_serial(vec![push(1)]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert!(!chain.context().contains_key("order"));
    assert!(chain.is_evaluated());
    assert!(!chain.completed());

    assert_eq!(rx.recv().await, Some("done"));
    assert_eq!(order(&chain), json!([1]));
}

#[tokio::test(start_paused = true)]
async fn first_failure_stops_the_chain() {
    let chain = factory().create_serial(vec![push(1), refuse("bad"), push(3)]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(order(&chain), json!([1]));
    assert!(rx.try_recv().is_err());
    assert!(chain.completed());
    assert!(!chain.succeeded());
    assert_eq!(
        chain.context().failure().as_deref(),
        Some("action 'bad' reported failure")
    );
}

#[tokio::test(start_paused = true)]
async fn logical_failure_keeps_reason_set_by_action() {
    let explain: ActionRef = ActionFn::arc("explain", |ctx: Context, done: OnResult| {
        ctx.put(FAILURE_KEY, "quota exceeded");
        done.failure();
        Ok(())
    });
    let chain = factory().create_serial(vec![explain]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert_eq!(chain.context().failure().as_deref(), Some("quota exceeded"));
}

#[tokio::test(start_paused = true)]
async fn parallel_group_rejoins_before_next_step() {
    let chain = factory().create();
    chain
        .then(push(0))
        .unwrap()
        .all(vec![delayed(1, 30), delayed(2, 10), push(3)])
        .unwrap()
        .then(push(9))
        .unwrap();
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("done"));
    assert_eq!(order(&chain), json!([0, 3, 2, 1, 9]));
}

#[tokio::test(start_paused = true)]
async fn parallel_failure_ignores_stragglers() {
    let chain = factory().create_parallel(vec![delayed(1, 50), refuse("no")]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));

    // the slow sibling still finishes, but no second callback fires
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(order(&chain), json!([1]));
    assert!(rx.try_recv().is_err());
    assert_eq!(chain.outcome(), Outcome::Failed);
}

#[tokio::test(start_paused = true)]
async fn all_in_order_is_serial() {
    let chain = factory().create();
    chain
        .all_in_order(vec![delayed(1, 30), delayed(2, 10)])
        .unwrap();
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("done"));
    assert_eq!(order(&chain), json!([1, 2]));
}

#[tokio::test(start_paused = true)]
async fn timeout_fails_a_slow_chain() {
    let chain = factory().create_serial(vec![delayed(1, 5_000)]);
    chain.timeout(Duration::from_secs(1)).unwrap();
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    let failure = chain.context().failure().unwrap();
    assert!(failure.contains("timed out"), "{failure}");

    // late success of the slow action is ignored
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(chain.outcome(), Outcome::Failed);
}

fn late_error(name: &'static str, ms: u64) -> ActionRef {
    AsyncActionFn::arc(name, move |_ctx: Context| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Err::<bool, _>(ActionError::fail("late backend error"))
    })
}

#[tokio::test(start_paused = true)]
async fn late_error_keeps_timeout_reason() {
    let chain = factory().create_serial(vec![late_error("slow", 5_000)]);
    chain.timeout(Duration::from_secs(1)).unwrap();
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));

    tokio::time::sleep(Duration::from_secs(10)).await;
    let failure = chain.context().failure().unwrap();
    assert!(failure.contains("timed out"), "{failure}");
}

#[tokio::test(start_paused = true)]
async fn late_sibling_error_keeps_first_reason() {
    let chain = factory().create_parallel(vec![late_error("slow", 100), refuse("fast")]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        chain.context().failure().as_deref(),
        Some("action 'all[slow,fast]' reported failure")
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_is_cancelled_on_success() {
    let sched = Arc::new(TokioScheduler::current());
    let factory = ChainFactory::new(sched.clone());
    let chain = factory.create_serial(vec![delayed(1, 10)]);
    chain.timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(sched.pending_timers(), 1);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("done"));
    assert_eq!(sched.pending_timers(), 0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(rx.try_recv().is_err());
    assert!(!chain.context().contains_key(FAILURE_KEY));
}

#[tokio::test(start_paused = true)]
async fn timeout_replaces_previous_timer() {
    let sched = Arc::new(TokioScheduler::current());
    let chain = ChainFactory::new(sched.clone()).create_serial(vec![delayed(1, 500)]);
    chain
        .timeout(Duration::from_millis(100))
        .unwrap()
        .timeout(Duration::from_secs(10))
        .unwrap();
    assert_eq!(sched.pending_timers(), 1);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("done"));
}

#[tokio::test(start_paused = true)]
async fn factory_timeout_applies_to_created_chains() {
    let config = Config {
        timeout: Duration::from_millis(200),
        ..Config::default()
    };
    let factory = ChainFactory::builder(config).build();
    let chain = factory.create_serial(vec![delayed(1, 1_000)]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert!(chain.context().failure().unwrap().contains("timed out"));
}

#[tokio::test]
async fn usage_errors() {
    let factory = factory();

    let empty = factory.create();
    assert!(empty.is_empty());
    assert_eq!(empty.eval().unwrap_err(), ChainError::Empty);
    // a rejected empty eval does not consume the chain
    empty.then(push(1)).unwrap();
    assert!(!empty.is_empty());
    empty.eval().unwrap();

    let chain = factory.create_serial(vec![push(1)]);
    let mut rx = outcomes(&chain);
    chain.eval().unwrap();
    assert_eq!(chain.eval().unwrap_err(), ChainError::AlreadyEvaluated);
    assert_eq!(rx.recv().await, Some("done"));

    assert_eq!(chain.then(push(2)).unwrap_err(), ChainError::Terminal);
    assert_eq!(
        chain.timeout(Duration::from_secs(1)).unwrap_err(),
        ChainError::Terminal
    );
    assert_eq!(chain.eval().unwrap_err(), ChainError::AlreadyEvaluated);
    assert!(!chain.is_empty());
}

#[tokio::test]
async fn action_error_is_recorded() {
    let broken: ActionRef = ActionFn::arc("broken", |_ctx: Context, _done: OnResult| {
        Err(ActionError::fail("disk full"))
    });
    let chain = factory().create_serial(vec![broken, push(2)]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert_eq!(
        chain.context().failure().as_deref(),
        Some("action failed: disk full")
    );
    assert!(!chain.context().contains_key("order"));
}

#[tokio::test]
async fn panicking_actions_fail_the_chain() {
    let sync_panic: ActionRef = ActionFn::arc("sync", |_ctx: Context, _done: OnResult| {
        panic!("kaboom");
    });
    let chain = factory().create_serial(vec![sync_panic]);
    let mut rx = outcomes(&chain);
    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert!(chain.context().failure().unwrap().contains("kaboom"));

    let async_panic: ActionRef = AsyncActionFn::arc("async", |_ctx: Context| async move {
        if true {
            panic!("async kaboom");
        }
        Ok::<_, ActionError>(true)
    });
    let chain = factory().create_serial(vec![async_panic]);
    let mut rx = outcomes(&chain);
    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert!(chain.context().failure().unwrap().contains("async kaboom"));
}

#[tokio::test]
async fn async_error_result_is_recorded() {
    let denied: ActionRef = AsyncActionFn::arc("denied", |_ctx: Context| async move {
        Err::<bool, _>(ActionError::fail("permission denied"))
    });
    let chain = factory().create_serial(vec![denied]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert_eq!(
        chain.context().failure().as_deref(),
        Some("action failed: permission denied")
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_fails_a_running_chain() {
    let factory = factory();
    let mut events = factory.bus().subscribe();
    let chain = factory.create_serial(vec![delayed(1, 1_000), push(2)]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    chain.cancel("user abort").unwrap();

    assert_eq!(rx.recv().await, Some("except"));
    assert_eq!(chain.context().failure().as_deref(), Some("user abort"));
    assert_eq!(chain.cancel("again").unwrap_err(), ChainError::Terminal);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(order(&chain), json!([1]));

    let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|ev| ev.kind)
        .collect();
    assert_eq!(kinds.last(), Some(&EventKind::ChainCancelled));
}

#[tokio::test]
async fn actions_appended_while_running_are_executed() {
    let chain = factory().create_serial(vec![push(1)]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    chain.then(push(2)).unwrap();
    assert_eq!(rx.recv().await, Some("done"));
    assert_eq!(order(&chain), json!([1, 2]));
}

#[tokio::test]
async fn action_can_extend_its_own_chain() {
    let chain = factory().create();
    let handle = chain.clone();
    let grow: ActionRef = ActionFn::arc("grow", move |ctx: Context, done: OnResult| {
        ctx.push("order", 1);
        handle.then(push(2)).map_err(|e| ActionError::fail(e.to_string()))?;
        done.success();
        Ok(())
    });
    chain.then(grow).unwrap();
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("done"));
    assert_eq!(order(&chain), json!([1, 2]));
}

#[tokio::test]
async fn callbacks_see_the_chain_context() {
    let chain = factory().create_serial(vec![push(7)]);
    let expected = chain.context().clone();
    let (tx, mut rx) = mpsc::unbounded_channel();
    chain.done(move |ctx| {
        let _ = tx.send(ctx.same_as(&expected));
    });

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some(true));
}

#[tokio::test]
async fn later_callback_registration_wins() {
    let chain = factory().create_serial(vec![push(1)]);
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let c = calls.clone();
    chain.done(move |_| {
        c.fetch_add(100, Ordering::SeqCst);
    });
    let c = calls.clone();
    chain.done(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(());
    });

    chain.eval().unwrap();
    rx.recv().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lifecycle_events_are_published() {
    let factory = factory();
    let mut bus = factory.bus().subscribe();
    let chain = factory.create_serial(vec![push(1), refuse("reject")]);
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));

    let mut seen = Vec::new();
    while let Ok(ev) = bus.try_recv() {
        assert_eq!(ev.chain, Some(chain.id()));
        seen.push((ev.kind, ev.step, ev.action.as_deref().map(str::to_owned)));
    }
    assert_eq!(
        seen,
        vec![
            (EventKind::ChainEvaluating, None, None),
            (EventKind::StepStarting, Some(0), Some("push-1".into())),
            (EventKind::StepSucceeded, Some(0), Some("push-1".into())),
            (EventKind::StepStarting, Some(1), Some("reject".into())),
            (EventKind::StepFailed, Some(1), Some("reject".into())),
            (EventKind::ChainFailed, None, None),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wide_parallel_group_on_multi_thread_runtime() {
    let members: Vec<ActionRef> = (0..64).map(|n| delayed(n, 1)).collect();
    let chain = factory().create_parallel(members);
    chain.then(push(-1)).unwrap();
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("done"));

    let order = order(&chain);
    let order = order.as_array().unwrap();
    assert_eq!(order.len(), 65);
    assert_eq!(order.last(), Some(&json!(-1)));
}

#[tokio::test]
async fn empty_parallel_group_fails_at_execution() {
    let chain = factory().create();
    chain.all(Vec::new()).unwrap();
    assert!(!chain.is_empty());
    let mut rx = outcomes(&chain);

    chain.eval().unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert!(chain
        .context()
        .failure()
        .unwrap()
        .contains("latch count must be greater than 0"));
}

#[tokio::test(start_paused = true)]
async fn eval_after_early_end_is_rejected() {
    let chain = factory().create_serial(vec![push(1)]);
    let mut rx = outcomes(&chain);
    chain.cancel("changed my mind").unwrap();
    assert_eq!(rx.recv().await, Some("except"));
    assert_eq!(chain.eval().unwrap_err(), ChainError::Terminal);
    assert!(!chain.is_evaluated());

    let config = Config {
        timeout: Duration::from_millis(50),
        ..Config::default()
    };
    let chain = ChainFactory::builder(config).build().create_serial(vec![push(1)]);
    let mut rx = outcomes(&chain);
    assert_eq!(rx.recv().await, Some("except"));
    assert_eq!(chain.eval().unwrap_err(), ChainError::Terminal);
}
