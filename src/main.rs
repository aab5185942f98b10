//! smartcart - Grocery Replenishment Suggestions
//!
//! A fast CLI tool that reads a household's order history and suggests what to
//! buy again, plus habitual items that seem to have been forgotten.

// Module declarations
mod classifier;
mod config;
mod display;
mod error;
mod export;
mod helpers;
mod history;
mod mcp;
mod metrics;
mod models;
mod parser;
mod reports;
mod sink;
mod smart_cart;

// Core dependencies
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use config::{Config, OutputFormat};
use display::{
    display_result_enhanced, display_result_json, display_result_table, print_error, print_info,
    print_warning,
};
use error::SmartCartError;
use export::export_result_to_csv;
use sink::{JsonFileSink, load_saved_result, read_saved_result};
use smart_cart::{DumpOrderSource, SmartCartOutcome, calculate_smart_cart};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smartcart")]
#[command(about = "Smart grocery cart - Suggest replenishments from your order history")]
#[command(version)]
#[command(
    long_about = "smartcart analyses the last year of grocery orders and suggests products that are due
for replenishment, plus habitual products you seem to have stopped buying.

EXAMPLES:
  smartcart                              # Calculate and show the smart cart
  smartcart --orders dump.json           # Use a specific order history dump
  smartcart --json calculate             # Result as JSON
  smartcart --now 2026-01-15T00:00:00Z   # Replay a past run deterministically
  smartcart show                         # Show the last saved calculation
  smartcart export -o cart.csv           # Export the last calculation to CSV
  smartcart config --show                # View current configuration
  smartcart mcp-server                   # Serve the MCP tool and resource on stdio"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Order history dump (JSON)",
        long_help = "Path to the order history dump: a JSON array of orders with their lines\nDefault: configured path, or ./orders_dump.json"
    )]
    orders: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Where the smart cart document is written",
        long_help = "Path of the smart cart JSON document\nDefault: configured path, or ~/smart_cart_calculation.json"
    )]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DATETIME",
        global = true,
        help = "Reference time (RFC 3339) instead of the current time",
        long_help = "Analyse as if it were this instant. Format: RFC 3339\nExample: --now 2026-01-15T09:00:00Z"
    )]
    now: Option<String>,

    #[arg(short, long, global = true, help = "Output in JSON format")]
    json: bool,

    #[arg(long, global = true, help = "Use classic table format")]
    classic: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Calculate the smart cart (default)")]
    Calculate,
    #[command(about = "Show the last saved smart cart")]
    Show,
    #[command(about = "Export the last saved smart cart to CSV")]
    Export {
        #[arg(short, long, value_name = "PATH", help = "CSV file to write")]
        output_file: Option<PathBuf>,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[arg(long, help = "Show current configuration")]
        show: bool,
        #[arg(long, help = "Reset configuration to defaults")]
        reset: bool,
        #[arg(long, value_name = "PATH", help = "Set the order history dump path")]
        set_orders: Option<PathBuf>,
        #[arg(long, value_name = "PATH", help = "Set the smart cart output path")]
        set_output: Option<PathBuf>,
    },
    #[command(about = "Run the MCP server on stdio")]
    McpServer {
        #[arg(long, help = "List available tools and exit")]
        list_tools: bool,
        #[arg(long, help = "List available resources and exit")]
        list_resources: bool,
    },
}

/// Application entry point
fn main() {
    init_tracing();

    if let Err(e) = run() {
        match e.downcast_ref::<SmartCartError>() {
            Some(err) => print_error(&err.detailed_message()),
            None => print_error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr so stdout stays usable for JSON and MCP
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SMARTCART_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main application logic
fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load().unwrap_or_else(|e| {
        print_warning(&format!("Ignoring configuration file: {}", e));
        Config::default()
    });

    if let Some(Commands::Config {
        show,
        reset,
        set_orders,
        set_output,
    }) = &cli.command
    {
        return handle_config_command(&mut config, *show, *reset, set_orders, set_output);
    }

    let orders_path = cli.orders.clone().unwrap_or_else(|| config.get_orders_path());
    let output_path = match &cli.output {
        Some(path) => path.clone(),
        None => config.get_output_path()?,
    };
    let now = resolve_now(cli.now.as_deref())?;

    let format = if cli.json {
        OutputFormat::Json
    } else if cli.classic {
        OutputFormat::Table
    } else {
        config.default_output_format
    };

    match cli.command.unwrap_or(Commands::Calculate) {
        Commands::Calculate => {
            handle_calculate_command(&config, orders_path, output_path, now, format)
        }
        Commands::Show => handle_show_command(output_path, format),
        Commands::Export { output_file } => {
            handle_export_command(&config, output_path, output_file)
        }
        Commands::McpServer {
            list_tools,
            list_resources,
        } => handle_mcp_server_command(
            &config,
            orders_path,
            output_path,
            cli.now.is_some().then_some(now),
            list_tools,
            list_resources,
        ),
        Commands::Config { .. } => Ok(()),
    }
}

fn resolve_now(value: Option<&str>) -> Result<DateTime<Utc>> {
    match value {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .map_err(|_| SmartCartError::date_parse_error(raw, "RFC 3339"))?;
            Ok(parsed.with_timezone(&Utc))
        }
        None => Ok(Utc::now()),
    }
}

fn handle_calculate_command(
    config: &Config,
    orders_path: PathBuf,
    output_path: PathBuf,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> Result<()> {
    let source = DumpOrderSource::new(orders_path);
    let sink = JsonFileSink::new(output_path);

    let outcome = calculate_smart_cart(&source, &sink, now, &config.heuristics)?;
    match &outcome {
        SmartCartOutcome::NoOrderHistory => print_warning(&outcome.summary()),
        SmartCartOutcome::Calculated { result, .. } => {
            match format {
                OutputFormat::Json => display_result_json(result),
                OutputFormat::Table => display_result_table(result),
                OutputFormat::Enhanced => display_result_enhanced(result),
            }
            if format != OutputFormat::Json {
                print_info(&outcome.summary());
            }
        }
    }

    Ok(())
}

fn handle_show_command(output_path: PathBuf, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", read_saved_result(&output_path)?);
        return Ok(());
    }

    match load_saved_result(&output_path)? {
        Some(result) if format == OutputFormat::Table => display_result_table(&result),
        Some(result) => display_result_enhanced(&result),
        None => print_warning(&format!(
            "No smart cart calculation found at {}. Run `smartcart calculate` first.",
            output_path.display()
        )),
    }

    Ok(())
}

fn handle_export_command(
    config: &Config,
    output_path: PathBuf,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let Some(result) = load_saved_result(&output_path)? else {
        print_warning("No smart cart calculation found. Run `smartcart calculate` first.");
        return Ok(());
    };

    let path = output_file
        .unwrap_or_else(|| config.get_export_directory().join("smart_cart.csv"));
    export_result_to_csv(&result, &path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;
    print_info(&format!("Smart cart exported to: {}", path.display()));
    Ok(())
}

/// Handle configuration management commands
fn handle_config_command(
    config: &mut Config,
    show: bool,
    reset: bool,
    set_orders: &Option<PathBuf>,
    set_output: &Option<PathBuf>,
) -> Result<()> {
    if reset {
        *config = Config::default();
        config.save()?;
        print_info("Configuration reset to defaults");
        return Ok(());
    }

    let mut changed = false;
    if let Some(path) = set_orders {
        config.orders_path = Some(path.clone());
        print_info(&format!("Order history path set to: {}", path.display()));
        changed = true;
    }
    if let Some(path) = set_output {
        config.output_path = Some(path.clone());
        print_info(&format!("Smart cart output path set to: {}", path.display()));
        changed = true;
    }
    if changed {
        config.save()?;
    }

    if show || !changed {
        println!("Current Configuration:");
        println!("Orders Path: {}", config.get_orders_path().display());
        println!("Output Path: {}", config.get_output_path()?.display());
        println!("Default Output Format: {:?}", config.default_output_format);
        println!("Export Directory: {}", config.get_export_directory().display());
        println!("Heuristics:\n{}", serde_yaml::to_string(&config.heuristics)?);
        println!("Config File: {}", Config::config_path()?.display());
    }

    Ok(())
}

fn handle_mcp_server_command(
    config: &Config,
    orders_path: PathBuf,
    output_path: PathBuf,
    fixed_now: Option<DateTime<Utc>>,
    list_tools: bool,
    list_resources: bool,
) -> Result<()> {
    use mcp::McpServer;

    let mut server = McpServer::new(orders_path, output_path, config.heuristics.clone());
    if let Some(now) = fixed_now {
        server = server.with_fixed_clock(now);
    }

    if list_tools {
        println!("📋 Available MCP Tools:");
        for tool in server.list_tools() {
            println!("  🔧 {}", tool.name);
            println!("     {}", tool.description);
            println!(
                "     Schema: {}",
                serde_json::to_string_pretty(&tool.input_schema)?
            );
            println!();
        }
        return Ok(());
    }

    if list_resources {
        println!("📋 Available MCP Resources:");
        for resource in server.list_resources() {
            println!("  📊 {} ({})", resource.name, resource.uri);
            println!("     {}", resource.description);
            println!("     Type: {}", resource.mime_type);
            println!();
        }
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.run_stdio())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_now() {
        let now = resolve_now(Some("2026-01-15T10:00:00+02:00")).unwrap();
        assert_eq!(now.to_rfc3339(), "2026-01-15T08:00:00+00:00");
        assert!(resolve_now(Some("tomorrow")).is_err());
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "smartcart",
            "calculate",
            "--orders",
            "dump.json",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.orders, Some(PathBuf::from("dump.json")));
        assert!(matches!(cli.command, Some(Commands::Calculate)));
    }
}
