use chrono::Local;
use std::time::Duration;
use tickloop::{task, MemPool, ResumePoint, SchedulerBuilder, TaskContext};
use tracing_subscriber::EnvFilter;

/// LED blink written as a resumable state machine
#[derive(Debug, Clone, Copy, PartialEq, ResumePoint)]
enum Blink {
    Start = 0,
    LitUp = 1,
    Dark = 2,
}

#[task(interval = "2s")]
fn blink(ctx: &mut TaskContext<'_>) {
    let mut step = ctx.resume_point::<Blink>().unwrap_or(Blink::Start);
    loop {
        match step {
            Blink::Start => {
                println!("[{}] 💡 LED on", Local::now().format("%H:%M:%S%.3f"));
                step = Blink::LitUp;
            }
            Blink::LitUp => {
                if ctx.wait(Blink::LitUp, 300).is_pending() {
                    return;
                }
                println!("[{}] ⚫ LED off", Local::now().format("%H:%M:%S%.3f"));
                step = Blink::Dark;
            }
            Blink::Dark => {
                if ctx.wait(Blink::Dark, 700).is_pending() {
                    return;
                }
                println!("[{}] 🔁 Blink cycle done", Local::now().format("%H:%M:%S%.3f"));
                ctx.finish();
                return;
            }
        }
    }
}

#[task(interval = "500ms")]
fn sensor_poll(ctx: &mut TaskContext<'_>) {
    println!("[{}] 📈 Sensor poll at tick {}", Local::now().format("%H:%M:%S%.3f"), ctx.now());
}

#[task(one_shot = "1s")]
fn boot_banner(_ctx: &mut TaskContext<'_>) {
    println!("[{}] 🚀 Boot complete", Local::now().format("%H:%M:%S%.3f"));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tickloop_runtime=info".parse()?))
        .init();

    let scheduler = SchedulerBuilder::new().register_all().cpu_monitor().build()?;
    let handle = scheduler.start(Duration::from_millis(1));

    tokio::time::sleep(Duration::from_secs(6)).await;
    let scheduler = handle.shutdown().await?;

    println!("\n📊 RESULTS after {}ms:", scheduler.now());
    println!("   CPU usage: {:.2}%", scheduler.total_usage());
    for (id, due) in scheduler.ready_queue() {
        if let Some(info) = scheduler.task(id) {
            println!(
                "   {:<14} next at {:>6}ms, last exec {}ms, max exec {}ms",
                info.name, due, info.actual_exec_time, info.max_exec_time
            );
        }
    }

    // Fixed-block pool for message buffers
    let mut pool = MemPool::new();
    let buffer = pool.alloc().ok_or("block pool exhausted")?;
    if let Some(bytes) = pool.get_mut(buffer) {
        bytes[..5].copy_from_slice(b"hello");
    }
    println!("   Block pool usage: {}%", pool.usage());
    pool.free(buffer);

    Ok(())
}
