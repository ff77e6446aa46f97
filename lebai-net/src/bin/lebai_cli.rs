//! Lebai Command Client
//!
//! Command-line interface for querying and running tasks on a Lebai
//! controller. Ctrl-C cancels whatever call or wait is in progress.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lebai_net::{
    CancellationToken, ClientConfig, GetTasksInput, LebaiClient, RunOptions, TaskInfo,
};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command line arguments for the Lebai command client
#[derive(Parser)]
#[command(name = "lebai-cli")]
#[command(about = "Query and run tasks on a Lebai robot controller")]
#[command(version)]
struct Args {
    /// Path to the client configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Controller host, overrides the configuration file
    #[arg(long, global = true)]
    host: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a single task
    Task {
        id: i32,
    },
    /// List tasks, most recent first
    Tasks {
        #[arg(long, default_value = "1")]
        page: i32,
        #[arg(long, default_value = "10")]
        size: i32,
    },
    /// Check whether the controller is free to start a task
    CanRun,
    /// Run a task (stops the running task unless --no-clear)
    RunTask {
        id: i32,
        #[arg(long, default_value = "1")]
        count: i32,
        #[arg(long)]
        no_clear: bool,
        /// Wait until the task finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Run a scene as a new task
    RunScene {
        id: i32,
        #[arg(long, default_value = "1")]
        count: i32,
        /// Stop the running task first
        #[arg(long)]
        clear: bool,
        /// Wait until the task finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Wait for a task to finish
    Wait {
        task_id: i32,
    },
    /// Execute a Lua snippet; prefix with @ to read it from a file
    Lua {
        code: String,
    },
    /// Block until queued motion has executed
    Sync,
    /// Show the robot mode
    Status,
}

impl Args {
    fn get_config_path(&self) -> Option<String> {
        self.config
            .clone()
            .or_else(|| std::env::var("LEBAI_CONFIG_PATH").ok())
    }

    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match self.get_config_path() {
            Some(path) => {
                info!("Configuration file: {}", path);
                ClientConfig::load_from_path(&path)
                    .with_context(|| format!("Failed to load configuration from {}", path))?
            }
            None => ClientConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.load_config()?;
    let client = LebaiClient::new(config).context("Failed to create client (is --host set?)")?;

    let token = CancellationToken::new();
    let shutdown = token.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal, cancelling...");
        shutdown.cancel();
    })
    .context("Failed to set signal handler")?;

    match args.command {
        Commands::Task { id } => {
            let task = client.get_task(id, &token).await?;
            print_task(&task, args.json)?;
        }
        Commands::Tasks { page, size } => {
            let input = GetTasksInput {
                page_index: page,
                page_size: size,
            };
            let result = client.get_tasks(input, &token).await?;
            if args.json {
                print_json(&result)?;
            } else {
                println!(
                    "Page {} (size {}), {} tasks total",
                    result.page_index, result.page_size, result.total_count
                );
                for task in &result.items {
                    println!("  {}", task_line(task));
                }
            }
        }
        Commands::CanRun => {
            let free = client.is_can_run_task(&token).await?;
            if args.json {
                print_json(&serde_json::json!({ "can_run": free }))?;
            } else if free {
                println!("✓ Controller is free");
            } else {
                println!("✗ Controller is busy");
            }
        }
        Commands::RunTask {
            id,
            count,
            no_clear,
            wait,
        } => {
            let options = RunOptions::task()
                .with_execute_count(count)
                .with_clear(!no_clear);
            if wait {
                let task = client.run_task_until_done(id, options, &token).await?;
                print_task(&task, args.json)?;
            } else {
                let handle = client.run_task_with(id, options, &token).await?;
                print_handle(handle.id, args.json)?;
            }
        }
        Commands::RunScene {
            id,
            count,
            clear,
            wait,
        } => {
            let options = RunOptions::scene()
                .with_execute_count(count)
                .with_clear(clear);
            if wait {
                let task = client.run_scene_until_done(id, options, &token).await?;
                print_task(&task, args.json)?;
            } else {
                let handle = client.run_scene_with(id, options, &token).await?;
                print_handle(handle.id, args.json)?;
            }
        }
        Commands::Wait { task_id } => {
            let task = client.wait_task_run_completed(task_id, &token).await?;
            print_task(&task, args.json)?;
        }
        Commands::Lua { code } => {
            let code = match code.strip_prefix('@') {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read Lua file {}", path))?,
                None => code,
            };
            let handle = client.execute_lua(&code, &token).await?;
            print_handle(handle.id, args.json)?;
        }
        Commands::Sync => {
            client.sync(&token).await?;
            if args.json {
                print_json(&serde_json::json!({ "synced": true }))?;
            } else {
                println!("✓ Motion queue drained");
            }
        }
        Commands::Status => {
            let status = client.robot_status(&token).await?;
            if args.json {
                print_json(&serde_json::json!({
                    "mode": i32::from(status),
                    "description": status.description(),
                }))?;
            } else {
                println!("{:?}: {}", status, status);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_handle(id: i32, json: bool) -> Result<()> {
    if json {
        print_json(&serde_json::json!({ "id": id }))
    } else {
        println!("Submitted task {}", id);
        Ok(())
    }
}

fn print_task(task: &TaskInfo, json: bool) -> Result<()> {
    if json {
        print_json(task)
    } else {
        println!("{}", task_line(task));
        Ok(())
    }
}

fn task_line(task: &TaskInfo) -> String {
    let status = match task.task_status() {
        Ok(Some(s)) => format!("{:?} ({})", s, s),
        Ok(None) => "unknown".to_string(),
        Err(e) => e.to_string(),
    };
    match &task.name {
        Some(name) => format!("#{} {} - {}", task.id, name, status),
        None => format!("#{} - {}", task.id, status),
    }
}
