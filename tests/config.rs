use std::sync::Arc;
use priority_completion::{Error, PoolConfig, Priority, PriorityCompletionService, ServiceConfig, ThreadPool};

#[derive(serde::Deserialize)]
struct AppConfig {
    service: ServiceConfig,
    pool: PoolConfig,
}

const APP_CONFIG: &str = r#"
[service]
levels = ["low", "high"]
default_priority = "high"

[pool]
threads = 2
name = "workers"
"#;

#[test] fn service_from_toml() {
    let config: AppConfig = toml::from_str(APP_CONFIG).unwrap();
    let pool = Arc::new(ThreadPool::new(config.pool).unwrap());
    assert_eq!(pool.threads(), 2);
    let service = PriorityCompletionService::with_config(pool, config.service).unwrap();
    assert_eq!(service.levels(), &[Priority::Low, Priority::High]);
    assert_eq!(service.default_priority(), Priority::High);

    service.submit(|| Ok(std::thread::current().name().map(str::to_owned))).unwrap();
    let name = service.take().unwrap().get().unwrap().clone();
    assert!(name.unwrap().starts_with("workers-"));

    assert!(matches!(service.submit_at(|| Ok(None), Priority::Medium), Err(Error::InvalidPriority(Priority::Medium))));
}

#[test] fn unknown_priority_in_toml() {
    let result = toml::from_str::<ServiceConfig>(r#"levels = ["low", "urgent"]"#);
    assert!(result.is_err());
}
