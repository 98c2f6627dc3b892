use std::fs;

use log::info;
use paging_sim::config::config::SimConfig;
use paging_sim::error::error::SimError;
use paging_sim::logging::logging;

// installs the global logger, so everything lives in one test.
#[test]
fn log_file_is_capped_and_logger_installs_once() {
    let path = std::env::temp_dir().join(format!("paging-sim-{}.log", std::process::id()));
    let config = SimConfig {
        log_file: path.clone(),
        log_line_limit: 3,
        ..SimConfig::default()
    };

    logging::init(&config).unwrap();
    for n in 0..5 {
        info!("Master: notice {}", n);
    }
    log::logger().flush();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["Master: notice 0", "Master: notice 1", "Master: notice 2"]);

    assert!(matches!(logging::init(&config), Err(SimError::Logger(_))));
    let _ = fs::remove_file(&path);
}
