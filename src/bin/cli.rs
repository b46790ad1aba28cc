//! Headless graph runner.
//!
//! Loads a graph file, cooks it, and exports the display node (or the
//! last node in execution order) as OBJ:
//!
//! ```text
//! meshforge-cli <input.nfg> <output.obj> [--verbose|-v] [--stats|-s]
//! ```
//!
//! Exit code 0 on success, 1 on any error.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use meshforge::graph::{ExecutionEngine, GraphSerializer};
use meshforge::host::{HostInterface, LogLevel};
use meshforge::io::obj;

/// Host with a progress bar and log filtering for terminal use.
struct CliHost {
    verbose: bool,
}

impl HostInterface for CliHost {
    fn report_progress(&self, current: usize, total: usize, message: &str) -> bool {
        if self.verbose && total > 0 {
            let width = 50usize;
            let filled = current * width / total;
            let percent = current * 100 / total;
            let bar: String = (0..width)
                .map(|i| {
                    if i < filled {
                        '='
                    } else if i == filled {
                        '>'
                    } else {
                        ' '
                    }
                })
                .collect();
            print!("\r[{bar}] {percent}% - {message}");
            let _ = std::io::stdout().flush();
        }
        true
    }

    fn log(&self, level: LogLevel, message: &str) {
        if self.verbose || level >= LogLevel::Warning {
            println!("\n[{}] {message}", level.as_str());
        }
    }

    fn host_info(&self) -> String {
        "meshforge-cli".to_string()
    }
}

fn print_usage(program: &str) {
    println!("meshforge - headless node graph execution\n");
    println!("Usage:");
    println!("  {program} <input.nfg> <output.obj> [options]\n");
    println!("Arguments:");
    println!("  <input.nfg>    Input node graph file (JSON)");
    println!("  <output.obj>   Output mesh file (.obj format)\n");
    println!("Options:");
    println!("  --verbose, -v  Show detailed progress");
    println!("  --stats,   -s  Show execution statistics");
    println!("  --help,    -h  Show this help message");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("meshforge-cli");

    let mut input_file = None;
    let mut output_file = None;
    let mut verbose = false;
    let mut show_stats = false;

    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage(program);
                return ExitCode::SUCCESS;
            }
            "--verbose" | "-v" => verbose = true,
            "--stats" | "-s" => show_stats = true,
            other if input_file.is_none() => input_file = Some(other.to_string()),
            other if output_file.is_none() => output_file = Some(other.to_string()),
            other => {
                eprintln!("Error: unknown argument '{other}'");
                return ExitCode::FAILURE;
            }
        }
    }

    let (Some(input_file), Some(output_file)) = (input_file, output_file) else {
        eprintln!("Error: both input and output files are required\n");
        print_usage(program);
        return ExitCode::FAILURE;
    };

    if !Path::new(&input_file).exists() {
        eprintln!("Error: input file '{input_file}' not found");
        return ExitCode::FAILURE;
    }

    let started = Instant::now();

    let mut graph = match GraphSerializer::load_from_file(&input_file) {
        Ok(graph) => graph,
        Err(error) => {
            eprintln!("Error: failed to load graph from '{input_file}': {error}");
            return ExitCode::FAILURE;
        }
    };
    if verbose {
        println!("Loaded {} nodes", graph.node_count());
    }

    let mut engine = ExecutionEngine::new();
    engine.set_host(Box::new(CliHost { verbose }));

    if !engine.execute_graph(&mut graph) {
        if verbose {
            println!();
        }
        eprintln!("Error: graph execution failed");
        if let Some(error) = engine.last_error() {
            eprintln!("  {error}");
        }
        return ExitCode::FAILURE;
    }
    if verbose {
        println!("\nExecution complete");
    }

    // Export the display node, falling back to the last cooked node.
    let export_node = graph.get_display_node().or_else(|| {
        graph.get_execution_order().last().copied()
    });
    let Some(export_node) = export_node else {
        eprintln!("Error: no nodes to export");
        return ExitCode::FAILURE;
    };
    let Some(handle) = engine.get_node_geometry(export_node) else {
        eprintln!("Error: no geometry to export");
        return ExitCode::FAILURE;
    };
    let Some(geometry) = handle.read() else {
        eprintln!("Error: no geometry to export");
        return ExitCode::FAILURE;
    };

    if let Err(error) = obj::export_obj(geometry, Path::new(&output_file)) {
        eprintln!("Error: failed to export to '{output_file}': {error}");
        return ExitCode::FAILURE;
    }

    if show_stats {
        println!("\nStatistics:");
        println!("-----------");
        println!("Nodes:        {}", graph.node_count());
        println!("Points:       {}", geometry.point_count());
        println!("Primitives:   {}", geometry.primitive_count());
        println!("Execution:    {} ms", started.elapsed().as_millis());
        if let Ok(metadata) = std::fs::metadata(&output_file) {
            println!("Output size:  {} bytes", metadata.len());
        }
    }

    println!("Exported to: {output_file}");
    ExitCode::SUCCESS
}
