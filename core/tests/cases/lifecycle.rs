use crate::common::{TestHarness, Trace};
use desk_core::*;
use serde_json::{json, Value};

fn count_up(sim: &mut Simulator, _args: ()) -> HandlerResult {
    let ctx = sim.context_mut();
    let n = ctx.get("count").and_then(Value::as_u64).unwrap_or(0);
    ctx.insert("count".into(), json!(n + 1));
    Ok(())
}

fn seed_counts(sim: &mut Simulator, n: u32) -> HandlerResult {
    assert!(sim.context().is_empty());
    for i in 0..n {
        sim.schedule(f64::from(i), count_up, ())?;
    }
    Ok(())
}

#[test]
fn test_default_context_is_empty_mapping() {
    let kernel = SimulationBuilder::new("counter")
        .initializer(seed_counts, 4)
        .build()
        .unwrap();
    let result = run_simulation(kernel).unwrap();

    assert_eq!(result.context.get("count"), Some(&json!(4)));
    assert_eq!(result.finalized, None);
}

#[test]
fn test_finalizer_result_and_context_are_returned() {
    let kernel = TestHarness::with_marks(&[(1.0, "a"), (2.5, "b")])
        .builder
        .context(Trace {
            fired: vec![(0.0, "preset".into())],
        })
        .finalizer(|sim: &mut Simulator<Trace>| Ok(format!("{} at {}", sim.context().fired.len(), sim.time())))
        .build()
        .unwrap();

    let (stats, context, finalized) = run_simulation(kernel).unwrap().into_parts();
    assert_eq!(stats.exit_reason, ExitReason::NoMoreEvents);
    assert_eq!(context.names(), vec!["preset", "a", "b"]);
    assert_eq!(finalized.as_deref(), Some("3 at 2.5"));
}

fn replace_context(sim: &mut Simulator<Trace>, _args: ()) -> HandlerResult {
    let old = sim.set_context(Trace::default());
    assert!(old.fired.is_empty());
    sim.context_mut().fired.push((0.0, "fresh".into()));
    Ok(())
}

#[test]
fn test_handlers_may_replace_context() {
    let result = TestHarness::new()
        .configure(|b| b.initializer(replace_context, ()))
        .run();

    assert_eq!(result.context.names(), vec!["fresh"]);
}

fn registry() -> HandlerRegistry<Context> {
    let mut registry = HandlerRegistry::new();
    registry.register("open", |sim: &mut Simulator, args: &[Value]| {
        let customers = args.first().and_then(Value::as_u64).unwrap_or(0);
        for i in 0..customers {
            sim.schedule_named(i as f64 + 1.0, "serve", json!([i]))?;
        }
        Ok(())
    });
    registry.register("serve", |sim: &mut Simulator, args: &[Value]| {
        let served = sim
            .context_mut()
            .entry("served")
            .or_insert_with(|| json!([]));
        if let Some(list) = served.as_array_mut() {
            list.push(args[0].clone());
        }
        Ok(())
    });
    registry
}

#[test]
fn test_run_described_by_configuration() {
    let config = KernelConfig::from_json(
        r#"{
            "model_name": "bank",
            "max_sim_time": 2.0,
            "initializer": "open",
            "initializer_args": [5]
        }"#,
    )
    .unwrap();

    let mut kernel = SimulationBuilder::new("unused")
        .registry(registry())
        .apply_config(&config)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(kernel.model_name(), "bank");
    assert_eq!(kernel.limits().max_sim_time, Some(2.0));

    let progress = kernel.run().unwrap();
    assert_eq!(progress.stats().exit_reason, ExitReason::ReachedSimTimeLimit);
    assert_eq!(progress.stats().num_events_processed, 2);
    assert_eq!(kernel.future_events().len(), 3);
    assert_eq!(kernel.future_events()[0].name, "serve");
    assert_eq!(kernel.future_events()[0].args, "[2]");
    assert_eq!(kernel.context().get("served"), Some(&json!([0, 1])));
}

#[test]
fn test_build_simulation_from_config() {
    let config = KernelConfig {
        model_name: "counter".into(),
        max_num_events: Some(2),
        ..Default::default()
    };
    let kernel = build_simulation(&config, seed_counts, 10).unwrap();
    let result = run_simulation(kernel).unwrap();

    assert_eq!(result.stats.exit_reason, ExitReason::ReachedEventLimit);
    assert_eq!(result.context.get("count"), Some(&json!(2)));
}

#[test]
fn test_stats_serialize_for_reporting() {
    let result = TestHarness::with_marks(&[(1.0, "a")]).run();
    let value = serde_json::to_value(&result.stats).unwrap();

    assert_eq!(value["exit_reason"], json!("NO_MORE_EVENTS"));
    assert_eq!(value["num_events_processed"], json!(1));
    assert_eq!(value["last_handler"]["name"], json!("mark"));
    assert!(result.stats.to_string().starts_with("1 events, sim time 1"));
}

#[test]
fn test_unusable_real_time_budget_fails_build() {
    let huge = KernelConfig {
        max_real_time: Some(1e20),
        ..Default::default()
    };
    assert!(matches!(
        build_simulation(&huge, seed_counts, 1),
        Err(SimError::InvalidConfig(_))
    ));

    let negative = KernelConfig {
        max_real_time: Some(-1.0),
        ..Default::default()
    };
    assert!(matches!(
        TestHarness::new().builder.apply_config(&negative),
        Err(SimError::InvalidConfig(_))
    ));
}
