use chrono::Local;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tickloop::{task, task_impl, Runnable, SchedulerBuilder, TaskContext, TimeUnit};
use tracing_subscriber::EnvFilter;

/// Interval comes from config; falls back to 250ms
#[task(interval = "${app.heartbeat:250ms}")]
fn heartbeat(ctx: &mut TaskContext<'_>) {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    println!("[{}] 💓 [HEARTBEAT] tick {}", now, ctx.now());
}

/// Bare number read in seconds
#[task(interval = "${app.report_interval}", time_unit = TimeUnit::Seconds)]
fn report(_ctx: &mut TaskContext<'_>) {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    println!("[{}] 📝 [REPORT] periodic report", now);
}

/// Switched off in application.toml
#[task(interval = 100, enabled = "${app.debug_dump:false}")]
fn debug_dump(_ctx: &mut TaskContext<'_>) {
    println!("[DEBUG] should not run");
}

struct Throttle {
    hits: Arc<AtomicU32>,
}

#[task_impl(interval = "${app.throttle_interval:1s}")]
impl Runnable for Throttle {
    fn run(&mut self, ctx: &mut TaskContext<'_>) {
        let count = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[THROTTLE] execution #{}", count);
        if count == 3 {
            println!("[THROTTLE] slowing down to 2s");
            ctx.change_interval(2000);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tickloop_runtime=debug".parse()?))
        .init();

    let hits = Arc::new(AtomicU32::new(0));
    let scheduler = SchedulerBuilder::with_toml("demos/config/application.toml")?
        .register_all()
        .runnable(Throttle { hits: hits.clone() })
        .build()?;

    println!("✅ {} tasks scheduled, capacity {}", scheduler.active_tasks(), scheduler.capacity());
    let period = Duration::from_millis(scheduler.config().tick_period_ms);
    let handle = scheduler.start(period);

    tokio::time::sleep(Duration::from_secs(8)).await;
    let scheduler = handle.shutdown().await?;

    println!("\n📊 Throttle ran {} times", hits.load(Ordering::SeqCst));
    println!("   CPU usage: {:.2}%", scheduler.total_usage());
    Ok(())
}
