use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kira_bashthebug::cli::{
    Cli, Commands, DecodeArgs, GroupByArg, PlatesCommand, PlatesShowArgs, PolicyArg, RunArgs,
    StudyArg,
};
use kira_bashthebug::consensus::{ConsensusConfig, GroupBy};
use kira_bashthebug::ctx::{Ctx, DecodePolicy};
use kira_bashthebug::identity::Study;
use kira_bashthebug::io;
use kira_bashthebug::pipeline::Pipeline;
use kira_bashthebug::pipeline::stage1_input::Stage1Input;
use kira_bashthebug::pipeline::stage2_identity::Stage2Identity;
use kira_bashthebug::pipeline::stage3_decode::Stage3Decode;
use kira_bashthebug::plates::{self, PlateDesign};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args)?,
        Commands::Decode(args) => handle_decode(args)?,
        Commands::Plates(args) => match args.command {
            PlatesCommand::Show(show) => handle_plates_show(show)?,
        },
    }

    Ok(())
}

fn handle_run(args: RunArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&args.unreadable_fraction) {
        anyhow::bail!(
            "--unreadable-fraction must be within [0, 1], got {}",
            args.unreadable_fraction
        );
    }

    let group_by = match args.group_by {
        GroupByArg::PlateImage => GroupBy::PlateImage,
        GroupByArg::ReadingDay => GroupBy::ReadingDay,
    };
    let mut ctx = Ctx::new(
        args.input,
        args.out,
        group_by,
        policy_from_arg(args.policy),
        !args.no_tables,
        args.json,
        env!("CARGO_PKG_VERSION"),
    );
    ctx.plates_path = args.plates;
    ctx.include_non_live = args.include_non_live;
    ctx.from_date = args.from_date;
    ctx.to_date = args.to_date;
    ctx.study = args.study.map(|s| match s {
        StudyArg::Unknown => Study::Unknown,
        StudyArg::Legacy => Study::Legacy,
        StudyArg::Current => Study::Current,
    });
    ctx.reading_day = args.reading_day;
    ctx.merges = args.merge;
    ctx.threads = args.threads;
    ctx.consensus = ConsensusConfig {
        min_total: args.min_total,
        min_valid: args.min_valid,
        unreadable_fraction: args.unreadable_fraction,
        strip_no_growth: !args.keep_no_growth,
    };

    Pipeline::full().run(&mut ctx)?;

    print_summary(&ctx)
}

fn handle_decode(args: DecodeArgs) -> Result<()> {
    let mut ctx = Ctx::new(
        args.input,
        PathBuf::from("."),
        GroupBy::PlateImage,
        policy_from_arg(args.policy),
        false,
        false,
        env!("CARGO_PKG_VERSION"),
    );
    ctx.plates_path = args.plates;
    ctx.include_non_live = args.include_non_live;

    let pipeline = Pipeline::new(vec![
        Box::new(Stage1Input::new()),
        Box::new(Stage2Identity::new()),
        Box::new(Stage3Decode::new()),
    ]);
    pipeline.run(&mut ctx)?;

    print_decode_summary(&ctx);
    Ok(())
}

fn policy_from_arg(arg: PolicyArg) -> DecodePolicy {
    match arg {
        PolicyArg::Encode => DecodePolicy::Encode,
        PolicyArg::Skip => DecodePolicy::Skip,
        PolicyArg::Abort => DecodePolicy::Abort,
    }
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    print_warnings(ctx);
    Ok(())
}

fn print_decode_summary(ctx: &Ctx) {
    println!("kira-bashthebug decode ok");
    println!("rows read: {}", ctx.input_meta.rows_read);
    println!("rows decoded: {}", ctx.input_meta.rows_decoded);
    println!("rows skipped: {}", ctx.input_meta.rows_skipped);
    println!("code\tcount");
    for (code, count) in ctx.code_counts() {
        println!("{}\t{}", code, count);
    }
    print_warnings(ctx);
}

fn print_warnings(ctx: &Ctx) {
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}

fn handle_plates_show(args: PlatesShowArgs) -> Result<()> {
    let tables = plates::load_tables(args.plates.as_deref())?;
    println!("well index tables (version {}):", tables.version);
    for design in [PlateDesign::Ukmyc5, PlateDesign::Ukmyc6] {
        for (drug, max_index) in tables.table(design) {
            println!("{}\t{}\t{}", design.as_str(), drug, max_index);
        }
    }
    Ok(())
}
