use crate::common::{mark, TestHarness, Trace};
use desk_core::*;

fn cancel_middle(sim: &mut Simulator<Trace>, _args: ()) -> HandlerResult {
    sim.schedule(1.0, mark, "a")?;
    let b = sim.schedule(2.0, mark, "b")?;
    sim.schedule(3.0, mark, "c")?;
    assert_eq!(sim.pending_events(), 3);
    assert_eq!(sim.cancel(b), 1);
    assert_eq!(sim.pending_events(), 2);
    Ok(())
}

#[test]
fn test_cancelled_event_never_runs() {
    let result = TestHarness::new()
        .configure(|b| b.initializer(cancel_middle, ()))
        .run();

    assert_eq!(result.context.names(), vec!["a", "c"]);
    assert_eq!(result.context.times(), vec![1.0, 3.0]);
    assert_eq!(result.stats.num_events_processed, 2);
    assert_eq!(result.stats.sim_time, 3.0);
}

fn cancel_twice(sim: &mut Simulator<Trace>, _args: ()) -> HandlerResult {
    let id = sim.schedule(1.0, mark, "gone")?;
    assert_eq!(sim.cancel(id), 1);
    assert_eq!(sim.cancel(id), 0);
    assert_eq!(sim.cancel(id), 0);
    Ok(())
}

#[test]
fn test_cancel_is_idempotent() {
    let result = TestHarness::new()
        .configure(|b| b.initializer(cancel_twice, ()))
        .run();

    assert!(result.context.fired.is_empty());
    assert_eq!(result.stats.exit_reason, ExitReason::NoMoreEvents);
    assert_eq!(result.stats.sim_time, 0.0);
}

fn timeout(sim: &mut Simulator<Trace>, _args: ()) -> HandlerResult {
    mark(sim, "timeout")
}

fn reply(sim: &mut Simulator<Trace>, pending: EventId) -> HandlerResult {
    mark(sim, "reply")?;
    assert_eq!(sim.cancel(pending), 1);
    Ok(())
}

fn request(sim: &mut Simulator<Trace>, _args: ()) -> HandlerResult {
    let t = sim.schedule(10.0, timeout, ())?;
    sim.schedule(4.0, reply, t)?;
    Ok(())
}

#[test]
fn test_handler_cancels_future_event() {
    let result = TestHarness::new()
        .configure(|b| b.initializer(request, ()))
        .run();

    assert_eq!(result.context.names(), vec!["reply"]);
    assert_eq!(result.stats.sim_time, 4.0);
}

fn cancel_executed(sim: &mut Simulator<Trace>, first: EventId) -> HandlerResult {
    assert_eq!(sim.cancel(first), 0);
    mark(sim, "checked")
}

fn seed_executed(sim: &mut Simulator<Trace>, _args: ()) -> HandlerResult {
    let first = sim.schedule(1.0, mark, "first")?;
    sim.schedule(2.0, cancel_executed, first)?;
    Ok(())
}

#[test]
fn test_cancel_after_execution_is_a_no_op() {
    let result = TestHarness::new()
        .configure(|b| b.initializer(seed_executed, ()))
        .run();

    assert_eq!(result.context.names(), vec!["first", "checked"]);
}

fn cancel_everything(sim: &mut Simulator<Trace>, _args: ()) -> HandlerResult {
    let ids = [
        sim.schedule(1.0, mark, "a")?,
        sim.schedule(2.0, mark, "b")?,
    ];
    for id in ids {
        sim.cancel(id);
    }
    Ok(())
}

#[test]
fn test_all_cancelled_drains_cleanly() {
    let result = TestHarness::new()
        .configure(|b| b.initializer(cancel_everything, ()))
        .run();

    assert_eq!(result.stats.exit_reason, ExitReason::NoMoreEvents);
    assert_eq!(result.stats.num_events_processed, 0);
}

#[test]
fn test_kernel_cancel_while_suspended() {
    let mut kernel = TestHarness::with_marks(&[(1.0, "a"), (2.0, "b")])
        .configure(|b| b.debug(true))
        .kernel();

    kernel.run().unwrap();
    let b = kernel.future_events()[0].event_id.unwrap();
    assert_eq!(kernel.cancel(b), 1);
    assert_eq!(kernel.cancel(b), 0);

    kernel.set_debug(false);
    kernel.resume().unwrap();
    assert_eq!(kernel.context().names(), vec!["a"]);
}
