//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskweek_core` linkage against the configured database.
//! - Print this week's agenda with deterministic formatting.

use std::process::ExitCode;
use taskweek_core::db::open_db;
use taskweek_core::{
    init_logging, today, week_agenda, PlannerConfig, SqliteKvRepository, TaskStore,
};

fn main() -> ExitCode {
    println!("taskweek_core ping={}", taskweek_core::ping());
    println!("taskweek_core version={}", taskweek_core::core_version());

    let config = PlannerConfig::from_env();
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open `{}`: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };
    let repo = match SqliteKvRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => {
            eprintln!("failed to initialize task storage: {err}");
            return ExitCode::FAILURE;
        }
    };

    let store = TaskStore::open(repo).with_week_start(config.week_start);
    println!(
        "load={:?} tasks={} week_start={}",
        store.last_load_outcome(),
        store.len(),
        store.week_start()
    );

    for entry in week_agenda(store.tasks(), today(), store.week_start()) {
        println!("{}", entry.day.format("%a %Y-%m-%d"));
        for task in entry.tasks {
            let time = task
                .start_time
                .map(|time| time.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            println!(
                "  [{}] {} {} ({})",
                if task.is_done { 'x' } else { ' ' },
                time,
                task.title.as_deref().unwrap_or(""),
                task.priority.badge()
            );
        }
    }

    ExitCode::SUCCESS
}
