//! lrush - line-oriented command shell over an LruCache

mod handler;
mod reply;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::handler::CommandHandler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 10000)]
    capacity: usize,

    /// Attach statistics at startup, tracking these keys individually
    #[arg(short, long, num_args = 0.., value_name = "KEY")]
    monitor: Option<Vec<String>>,

    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Do not print the startup banner
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting lrush v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    let mut handler = CommandHandler::new(args.capacity);
    if let Some(keys) = args.monitor {
        info!("Monitoring enabled ({} tracked keys)", keys.len());
        handler.monitor(keys);
    }

    if !args.quiet {
        eprintln!("lrush {} - capacity {}", env!("CARGO_PKG_VERSION"), args.capacity);
        eprintln!("Commands: SET GET HAS DEL CLEAR SHRINK CAPACITY LEN KEYS ORDER");
        eprintln!("          MONITOR UNMONITOR STATS QUIT");
    }

    let stdout = io::stdout();
    let executed = match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            run(&mut handler, BufReader::new(file), stdout.lock())?
        }
        None => run(&mut handler, io::stdin().lock(), stdout.lock())?,
    };

    info!("Executed {} commands", executed);
    Ok(())
}

/// Execute every command from `input`, writing one reply per command.
///
/// Blank lines and lines starting with `#` are skipped. Returns the number of
/// commands executed, stopping early at `QUIT`.
fn run<R: BufRead, W: Write>(handler: &mut CommandHandler, input: R, mut output: W) -> Result<usize> {
    let mut executed = 0;

    for line in input.lines() {
        let line = line.context("failed to read command")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reply = handler.handle(line);
        executed += 1;
        if reply.is_quit() {
            debug!("quit requested");
            break;
        }
        writeln!(output, "{}", reply)?;
    }

    output.flush()?;
    Ok(executed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn run_script(handler: &mut CommandHandler, script: &str) -> (usize, String) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(script.as_bytes()).unwrap();

        let input = BufReader::new(File::open(file.path()).unwrap());
        let mut output = Vec::new();
        let executed = run(handler, input, &mut output).unwrap();
        (executed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_script_file() {
        let mut handler = CommandHandler::new(2);
        let (executed, output) = run_script(
            &mut handler,
            "# warm up\nSET a 1\nSET b 2\n\nSET c 3\nHAS a\nORDER\n",
        );

        assert_eq!(executed, 5);
        assert_eq!(output, "inserted\ninserted\ninserted\n0\n1) b\n2) c\n");
    }

    #[test]
    fn test_quit_stops_script() {
        let mut handler = CommandHandler::new(2);
        let (executed, output) = run_script(&mut handler, "SET a 1\nQUIT\nSET b 2\n");

        assert_eq!(executed, 2);
        assert_eq!(output, "inserted\n");
    }

    #[test]
    fn test_errors_keep_running() {
        let mut handler = CommandHandler::new(2);
        let input = Cursor::new("BOGUS\nGET\nSET k v\nGET k\n");
        let mut output = Vec::new();

        let executed = run(&mut handler, input, &mut output).unwrap();
        assert_eq!(executed, 4);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "ERR unknown command 'BOGUS'\n\
             ERR wrong number of arguments for 'get' command\n\
             inserted\n\
             v\n"
        );
    }

    #[test]
    fn test_monitor_flag_session() {
        let mut handler = CommandHandler::new(4);
        handler.monitor(vec!["k".to_string()]);
        let (_, output) = run_script(&mut handler, "GET k\nSET k 1\nGET k\nSTATS JSON\n");

        let last = output.lines().last().unwrap();
        let value: serde_json::Value = serde_json::from_str(last).unwrap();
        assert_eq!(value["total_hits"], 1);
        assert_eq!(value["keys"]["k"]["hits"], 1);
        assert_eq!(value["keys"]["k"]["misses"], 1);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["lrush", "--capacity", "5", "--monitor", "a", "b", "-q"]);
        assert_eq!(args.capacity, 5);
        assert_eq!(args.monitor, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(args.quiet);
        assert!(args.script.is_none());

        let args = Args::parse_from(["lrush", "--monitor"]);
        assert_eq!(args.monitor, Some(vec![]));
        assert_eq!(args.capacity, 10000);
    }
}
