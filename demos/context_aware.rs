use std::thread;
use std::time::Instant;

use tracing::info;
use tracing_contextual::init::init_with_config;
use tracing_contextual::{Format, LogContext, LoggerConfig};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

fn handle_request(ctx: &LogContext, path: &str) {
    let ctx = ctx.with("path", path);
    ctx.in_scope(|| {
        info!("handling request");
        lookup_user(42);
    });
}

fn lookup_user(id: u64) {
    LogContext::current().with("user_id", id).in_scope(|| info!("user loaded"));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_config(LoggerConfig {
        format: Format::Json,
        writer: BoxMakeWriter::new(std::io::stdout),
        context_aware: true,
        ..LoggerConfig::default()
    })?;

    let root = LogContext::new().with("service", "demo");
    handle_request(&root.with("request_id", "req-1"), "/orders");

    let start = Instant::now();
    let workers: Vec<_> = ["1", "2"]
        .into_iter()
        .map(|id| {
            let ctx = root.with("thread", id);
            thread::spawn(move || {
                ctx.in_scope(|| {
                    for count in 0..1_000u64 {
                        info!(count, "message from worker");
                    }
                })
            })
        })
        .collect();
    for worker in workers {
        let _ = worker.join();
    }

    info!(duration_seconds = start.elapsed().as_secs_f64(), "time taken to log 2000 messages");
    Ok(())
}
