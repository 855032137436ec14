//! `htbench run`: build a sweep plan and execute it.

use anyhow::Context;
use chrono::Utc;
use htbench_core::presets::Preset;
use htbench_core::runner::assign_output_names;
use htbench_core::sweep::{host_cores, Ceiling, SweepPlan};
use htbench_core::{HarnessConfig, SweepContext, ThreadSchedule, Trial, TrialRunner};

use crate::cli::{parse_tables, parse_threads, RunArgs};

pub fn execute(mut config: HarnessConfig, args: RunArgs) -> anyhow::Result<()> {
    let preset = Preset::from(args.preset);
    apply_paths(&mut config, preset, &args);

    let cores = host_cores();
    let plan = build_plan(&config, preset, &args, cores)?;
    let trials = plan.generate(cores)?;
    let runner = TrialRunner::new(config);

    tracing::info!(
        "Plan {}: {} tables, {} trials on {} logical cores",
        plan.name,
        plan.tables.len(),
        trials.len(),
        cores
    );

    if args.dry_run {
        print_dry_run(&runner, &plan, &trials);
        return Ok(());
    }

    let context = SweepContext::create(&plan.output_root)
        .with_context(|| format!("Cannot start sweep under {}", plan.output_root.display()))?;
    let summary = runner.run_sweep(&context, &plan.name, &trials, cores)?;

    println!("Sweep directory: {}", context.sweep_dir().display());
    println!("Trials run:      {}", summary.launched());
    println!("Failed to start: {}", summary.spawn_failures());
    println!("Exited non-zero: {}", summary.abnormal_exits());
    Ok(())
}

/// Directory overrides land on the roots the preset actually uses.
fn apply_paths(config: &mut HarnessConfig, preset: Preset, args: &RunArgs) {
    let sequence = preset == Preset::Sequence;
    if let Some(dir) = &args.results_dir {
        if sequence {
            config.sequence_results_root = dir.clone();
        } else {
            config.results_root = dir.clone();
        }
    }
    if let Some(dir) = &args.builds_dir {
        if sequence {
            config.sequence_builds_root = dir.clone();
        } else {
            config.builds_root = dir.clone();
        }
    }
    if let Some(input) = &args.input {
        if !sequence {
            tracing::warn!("--input only applies to the sequence preset; ignoring");
        }
        config.sequence_input = input.clone();
    }
}

fn build_plan(
    config: &HarnessConfig,
    preset: Preset,
    args: &RunArgs,
    host_cores: usize,
) -> anyhow::Result<SweepPlan> {
    let mut plan = preset.plan(config, host_cores);

    if let Some(list) = &args.tables {
        plan.tables = parse_tables(list)?;
    }

    if let Some(list) = &args.threads {
        plan.threads = ThreadSchedule::Fixed(parse_threads(list)?);
    } else if args.points.is_some() || args.ceiling.is_some() || args.stress.is_some() {
        let (mut points, mut ceiling, mut stress) = match plan.threads {
            ThreadSchedule::Interpolated {
                points,
                ceiling,
                stress,
            } => (points, ceiling, stress),
            ThreadSchedule::Fixed(_) => (2, Ceiling::AllCores, None),
        };
        if let Some(p) = args.points {
            points = p;
        }
        if let Some(c) = args.ceiling {
            ceiling = c.into();
        }
        if let Some(s) = args.stress {
            stress = s.into();
        }
        plan.threads = ThreadSchedule::Interpolated {
            points,
            ceiling,
            stress,
        };
    }

    Ok(plan)
}

fn print_dry_run(runner: &TrialRunner, plan: &SweepPlan, trials: &[Trial]) {
    let context = SweepContext::planned(&plan.output_root, Utc::now());
    for (trial, name) in trials.iter().zip(assign_output_names(trials)) {
        println!(
            "{}",
            runner.render(trial, &context.output_path(&name).display().to_string())
        );
    }
}
