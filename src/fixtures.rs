#[cfg(test)]
#[allow(dead_code)]
pub mod test {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::schema::{Field, Record, RecordSchema};

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct AppConfig {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub tags: Vec<String>,
        pub database: DbConfig,
    }

    impl Record for AppConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(
                    Field::<String>::new("host")
                        .default("localhost".to_string())
                        .help("Host to bind."),
                )
                .field(Field::<u16>::new("port").default(8080).help("Port to listen on"))
                .field(Field::<bool>::new("debug").default(false).help("Enable debug mode."))
                .field(Field::<Vec<String>>::new("tags").default(Vec::new()))
                .field(Field::<DbConfig>::nested("database").help("Database settings"))
                .build()
        }
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct DbConfig {
        pub url: Option<String>,
        pub pool_size: usize,
    }

    impl Record for DbConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<Option<String>>::new("url").help("Database URL"))
                .field(
                    Field::<usize>::new("pool_size")
                        .default(5)
                        .help("Connection pool size"),
                )
                .build()
        }
    }

    // -- Small single-purpose records ---------------------------------------------

    /// `host` is required, `port` defaults to 5432.
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
    }

    impl Record for ServerConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<String>::new("host"))
                .field(Field::<u16>::new("port").default(5432))
                .build()
        }
    }

    /// `name` is required; `db` defaults as a whole, so `db.host` is not.
    #[derive(Deserialize, Debug, PartialEq)]
    pub struct ServiceConfig {
        pub name: String,
        pub db: ServerConfig,
    }

    impl Record for ServiceConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<String>::new("name"))
                .field(
                    Field::<ServerConfig>::nested("db")
                        .default(ServerConfig {
                            host: "localhost".into(),
                            port: 6432,
                        })
                        .help("Database server"),
                )
                .build()
        }
    }

    /// `ratio` is narrower than the f64 the coercer produces.
    #[derive(Deserialize, Debug, PartialEq)]
    pub struct RatioConfig {
        pub ratio: f32,
    }

    impl Record for RatioConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<f32>::new("ratio").default(0.5))
                .build()
        }
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct TagsConfig {
        pub tags: Vec<String>,
    }

    impl Record for TagsConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<Vec<String>>::new("tags").default(Vec::new()))
                .build()
        }
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct LimitsConfig {
        pub limits: HashMap<String, i64>,
    }

    impl Record for LimitsConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<HashMap<String, i64>>::new("limits").default(HashMap::new()))
                .build()
        }
    }

    fn parse_percent(raw: &str) -> Result<f64, std::num::ParseFloatError> {
        raw.trim().trim_end_matches('%').parse::<f64>().map(|v| v / 100.0)
    }

    /// `ratio` is parsed from `"25%"` style input by a custom parser.
    #[derive(Deserialize, Debug, PartialEq)]
    pub struct PercentConfig {
        pub ratio: f64,
    }

    impl Record for PercentConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(
                    Field::<f64>::new("ratio")
                        .default(0.5)
                        .parse_with(parse_percent)
                        .help("Sampling ratio, e.g. 25%"),
                )
                .build()
        }
    }

    // -- Fixtures for flattening failures -----------------------------------------

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct Point {
        pub x: i32,
    }

    impl Record for Point {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<i32>::new("x"))
                .build()
        }
    }

    /// `a.x` and `b.x` flatten to distinct names.
    #[derive(Deserialize, Debug, PartialEq)]
    pub struct DistinctConfig {
        pub a: Point,
        pub b: Point,
    }

    impl Record for DistinctConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<Point>::nested("a"))
                .field(Field::<Point>::nested("b"))
                .build()
        }
    }

    /// `a.x` and `a_x` both flatten to `a-x`.
    #[derive(Deserialize, Debug, PartialEq)]
    pub struct ConflictConfig {
        pub a: Point,
        pub a_x: i32,
    }

    impl Record for ConflictConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<Point>::nested("a"))
                .field(Field::<i32>::new("a_x"))
                .build()
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct SelfNesting {
        pub inner: Option<Box<SelfNesting>>,
    }

    impl Record for SelfNesting {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<SelfNesting>::nested("inner"))
                .build()
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct CycleA {
        pub b: CycleB,
    }

    #[derive(Deserialize, Debug)]
    pub struct CycleB {
        pub a: Option<Box<CycleA>>,
    }

    impl Record for CycleA {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<CycleB>::nested("b"))
                .build()
        }
    }

    impl Record for CycleB {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<CycleA>::nested("a"))
                .build()
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct BadListConfig {
        pub buckets: Vec<Vec<i32>>,
    }

    impl Record for BadListConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<Vec<Vec<i32>>>::new("buckets"))
                .build()
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct BadNestedConfig {
        pub inner: BadListConfig,
    }

    impl Record for BadNestedConfig {
        fn schema() -> RecordSchema {
            RecordSchema::builder::<Self>()
                .field(Field::<BadListConfig>::nested("inner"))
                .build()
        }
    }

    #[test]
    fn app_config_schema_builds() {
        let schema = AppConfig::schema();
        assert_eq!(schema.fields().len(), 5);
        assert!(schema.field("database").is_some());
    }
}
