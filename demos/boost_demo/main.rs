//! # boostargs demo application
//!
//! A sample CLI tool that shows how to wire [boostargs](https://docs.rs/boostargs)
//! into a clap application. It exists purely to demonstrate and manually
//! verify the library.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example boost_demo -- --name world
//! cargo run --example boost_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                        |
//! |-------------------------|---------------------------------------------------------------------------|
//! | Required field          | `cargo run --example boost_demo` (fails: `--name` is required)            |
//! | Declared defaults       | `cargo run --example boost_demo -- --name x`                              |
//! | Env var                 | `BOOST_DEMO_NAME=env cargo run --example boost_demo`                      |
//! | Nested env var          | `BOOST_DEMO_SERVER_PORT=9999 cargo run --example boost_demo -- --name x`  |
//! | Env shown in help       | `BOOST_DEMO_NAME=env cargo run --example boost_demo -- --help`            |
//! | Config file             | Create `boost-demo.toml` in cwd with `[server]\nport = 1234`              |
//! | Lists and maps          | `... -- --name x --tags a,b --tags c --limits daily:100,monthly=3000`     |
//! | Bare bool flag          | `... -- --name x --verbose`                                               |
//! | Custom parser           | `... -- --name x --sample-rate 25%`                                       |
//! | Logging                 | `RUST_LOG=boostargs=trace cargo run --example boost_demo -- --name x`     |

mod config;

use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::EnvFilter;

use boostargs::{Boost, BoostBuilder};

use config::DemoConfig;

/// boostargs demo: greets someone using a fully layered configuration.
#[derive(Parser, Debug)]
#[command(name = "boost-demo")]
struct Cli {
    /// Print the resolved configuration instead of a greeting.
    #[arg(long)]
    dump: bool,
}

fn builder() -> BoostBuilder<DemoConfig> {
    Boost::builder::<DemoConfig>()
        .app_name("boost-demo")
        .file("boost-demo.toml")
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cmd = match boostargs::cli::command(Cli::command(), &builder()) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let matches = cmd.get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let config = match builder().cli_matches(&matches).load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.dump {
        println!("{config:#?}");
        return ExitCode::SUCCESS;
    }

    println!("Hello, {}!", config.name);
    println!("  server: {}:{}", config.server.host, config.server.port);
    if let Some(dir) = &config.server.log_dir {
        println!("  logs:   {}", dir.display());
    }
    if config.verbose {
        println!("  tags:   {:?}", config.tags);
        println!("  limits: {:?}", config.limits);
        println!("  sample: {:.2}", config.sample_rate);
    }
    ExitCode::SUCCESS
}
