use tickloop::SchedulerBuilder;

#[test]
fn environment_overrides_file_values() {
    let path = std::env::temp_dir().join(format!("tickloop-{}-env.toml", std::process::id()));
    std::fs::write(&path, "[scheduler]\ncapacity = 4\n").unwrap();
    std::env::set_var("TICKLOOP__SCHEDULER__CAPACITY", "7");

    let scheduler = SchedulerBuilder::with_toml(&path).unwrap().build().unwrap();
    assert_eq!(scheduler.capacity(), 7);

    std::env::remove_var("TICKLOOP__SCHEDULER__CAPACITY");
    std::fs::remove_file(path).ok();
}
