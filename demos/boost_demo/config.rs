//! Record types for the demo application.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use boostargs::{Field, Record, RecordSchema};

#[derive(Debug, Deserialize)]
pub struct DemoConfig {
    pub name: String,
    pub verbose: bool,
    pub tags: Vec<String>,
    pub limits: HashMap<String, u32>,
    pub sample_rate: f64,
    pub server: ServerConfig,
}

impl Record for DemoConfig {
    fn schema() -> RecordSchema {
        RecordSchema::builder::<Self>()
            .field(Field::<String>::new("name").help("Name to greet"))
            .field(Field::<bool>::new("verbose").default(false).help("Print extra detail."))
            .field(Field::<Vec<String>>::new("tags").default(Vec::new()).help("Free-form labels"))
            .field(
                Field::<HashMap<String, u32>>::new("limits")
                    .default(HashMap::new())
                    .help("Per-period request limits, e.g. daily:100,monthly=3000"),
            )
            .field(
                Field::<f64>::new("sample_rate")
                    .default(1.0)
                    .parse_with(parse_percent)
                    .help("Sampling rate as a percentage, e.g. 25%"),
            )
            .field(Field::<ServerConfig>::nested("server"))
            .build()
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_dir: Option<PathBuf>,
}

impl Record for ServerConfig {
    fn schema() -> RecordSchema {
        RecordSchema::builder::<Self>()
            .field(Field::<String>::new("host").default("127.0.0.1".to_string()))
            .field(Field::<u16>::new("port").default(8080).help("Port to listen on"))
            .field(Field::<Option<PathBuf>>::new("log_dir").help("Directory for log files"))
            .build()
    }
}

fn parse_percent(raw: &str) -> Result<f64, String> {
    let number = raw.trim().trim_end_matches('%');
    let value: f64 = number.parse().map_err(|_| format!("'{raw}' is not a percentage"))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("{value} is outside 0-100"));
    }
    Ok(value / 100.0)
}
