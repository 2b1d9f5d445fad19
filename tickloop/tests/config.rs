use std::path::PathBuf;
use tickloop::{Clock, Error, SchedulerBuilder, TaskContext};

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tickloop-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

fn noop(_: &mut TaskContext<'_>) {}

#[test]
fn toml_file_sizes_the_scheduler_and_resolves_placeholders() {
    let path = write_config(
        "app.toml",
        r#"
[scheduler]
capacity = 4

[app]
blink = "250ms"
"#,
    );

    let scheduler = SchedulerBuilder::with_toml(&path)
        .unwrap()
        .clock(Clock::new())
        .task("Blink", "${app.blink}", noop)
        .task("Fallback", "${app.missing:1s}", noop)
        .build()
        .unwrap();

    assert_eq!(scheduler.capacity(), 4);
    let due: Vec<u32> = scheduler.ready_queue().iter().map(|(_, due)| *due).collect();
    assert_eq!(due, vec![250, 1000]);
    std::fs::remove_file(path).ok();
}

#[test]
fn yaml_file_is_supported() {
    let path = write_config(
        "app.yaml",
        "scheduler:\n  capacity: 2\napp:\n  poll: 40\n",
    );

    let scheduler = SchedulerBuilder::with_yaml(&path)
        .unwrap()
        .clock(Clock::new())
        .task("Poll", "${app.poll}", noop)
        .build()
        .unwrap();

    assert_eq!(scheduler.capacity(), 2);
    assert_eq!(scheduler.ready_queue()[0].1, 40);
    std::fs::remove_file(path).ok();
}

#[test]
fn missing_file_is_an_error() {
    let path = std::env::temp_dir().join("tickloop-does-not-exist.toml");
    assert!(matches!(
        SchedulerBuilder::with_toml(path),
        Err(Error::Config(_))
    ));
}

#[test]
fn out_of_range_capacity_fails_the_build() {
    let path = write_config("bad.toml", "[scheduler]\ncapacity = 300\n");
    let result = SchedulerBuilder::with_toml(&path).unwrap().build();
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
    std::fs::remove_file(path).ok();
}
