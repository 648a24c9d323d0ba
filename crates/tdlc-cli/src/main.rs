use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tdlc_core::check::{CheckRequest, Checker};
use tdlc_core::counter::{Counter, FileCounter, Unconfigured};
use tdlc_core::report::{model::ToolInfo, render};
use tdlc_core::rules::catalog::Channel;
use tdlc_core::rules::source::{BuiltinRules, FileRules, RuleSource, load_or_builtin};
use tdlc_core::rules::store::RuleStore;

mod args;

use args::{Args, ChannelArg, OutputFormat};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let rules = match &args.rules {
        Some(path) => load_or_builtin(&FileRules::new(path)),
        None => BuiltinRules.load(),
    }
    .context("failed to load rules")?;
    debug!(version = %rules.version, rules = rules.len(), "rules loaded");

    if args.dump_rules {
        let output = serde_json::to_string_pretty(rules.document())?;
        return emit(&args, &output);
    }

    let message = read_message(&args)?;

    let counter: Arc<dyn Counter> = match &args.counter_file {
        Some(path) => Arc::new(FileCounter::new(path)),
        None => Arc::new(Unconfigured),
    };
    let tool = ToolInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let checker = Checker::new(Arc::new(RuleStore::new(rules)), counter).with_tool(tool);

    let mut request = CheckRequest::new(message).with_channel(match args.channel {
        ChannelArg::Sms => Channel::Sms,
        ChannelArg::Mms => Channel::Mms,
    });
    if let Some(mode) = &args.mode {
        request = request.with_mode(mode.clone());
    }

    let response = checker.check(&request).context("message could not be checked")?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&response)?,
        OutputFormat::Text => render::render_text(&response),
    };
    emit(&args, &output)?;

    std::process::exit(response.exit_code());
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_message(args: &Args) -> Result<String> {
    match (&args.message, &args.message_file) {
        (Some(message), _) => Ok(message.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read message from stdin")?;
            Ok(buf)
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read message file {}", path.display())),
        (None, None) => anyhow::bail!("no message given"),
    }
}

fn emit(args: &Args, output: &str) -> Result<()> {
    match &args.out {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{output}"),
    }
    Ok(())
}
