//! # Order pipeline
//!
//! Demonstrates basic taskchain features:
//! - Serial steps sharing one context
//! - A parallel group rejoined before the next step
//! - Failure and timeout routed to `except`
//! - Events rendered by the built-in `LogWriter`
//!
//! Run with: `cargo run --example pipeline --features logging`

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use taskchain::{
    ActionError, ActionFn, ActionRef, AsyncActionFn, Chain, ChainFactory, Config, Context,
    LogWriter, OnResult, Subscribe,
};

/// Loads the order into the context.
fn load_order(id: u64) -> ActionRef {
    ActionFn::arc("load-order", move |ctx: Context, done: OnResult| {
        ctx.put("order_id", id);
        ctx.put("amount", 42);
        done.success();
        Ok(())
    })
}

/// Simulated remote check taking `ms` milliseconds.
fn check(name: &'static str, ms: u64, ok: bool) -> ActionRef {
    AsyncActionFn::arc(name, move |ctx: Context| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        ctx.push("checks", name);
        if !ok {
            ctx.put(taskchain::FAILURE_KEY, format!("{name} rejected the order"));
        }
        Ok::<_, ActionError>(ok)
    })
}

fn ship() -> ActionRef {
    ActionFn::arc("ship", |ctx: Context, done: OnResult| {
        let id = ctx.get("order_id").unwrap_or_default();
        println!("📦 shipping order {id}");
        done.success();
        Ok(())
    })
}

/// Evaluates `chain` and waits for its terminal callback.
async fn run(label: &str, chain: &Chain) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = oneshot::channel::<Result<(), String>>();
    let tx = Arc::new(std::sync::Mutex::new(Some(tx)));
    let on_fail = Arc::clone(&tx);

    chain
        .done(move |_| {
            if let Some(tx) = tx.lock().ok().and_then(|mut t| t.take()) {
                let _ = tx.send(Ok(()));
            }
        })
        .except(move |ctx| {
            let reason = ctx.failure().unwrap_or_default();
            if let Some(tx) = on_fail.lock().ok().and_then(|mut t| t.take()) {
                let _ = tx.send(Err(reason));
            }
        })
        .eval()?;

    match rx.await? {
        Ok(()) => println!("✅ {label}: done"),
        Err(reason) => println!("❌ {label}: {reason}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let cfg = Config {
        timeout: Duration::from_secs(2),
        ..Config::default()
    };
    let factory = ChainFactory::builder(cfg).with_subscribers(subs).build();

    // 1. happy path
    let chain = factory.create_serial(vec![load_order(1)]);
    chain
        .all(vec![check("stock", 200, true), check("payment", 300, true)])?
        .then(ship())?;
    run("order 1", &chain).await?;

    // 2. payment refused: ship never runs
    let chain = factory.create_serial(vec![load_order(2)]);
    chain
        .all(vec![check("stock", 100, true), check("payment", 150, false)])?
        .then(ship())?;
    run("order 2", &chain).await?;

    // 3. stock service too slow for the factory timeout
    let chain = factory.create_serial(vec![load_order(3), check("stock", 5_000, true), ship()]);
    run("order 3", &chain).await?;

    // let the log subscriber drain
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
