use clap::{Args, Parser};

use crate::caller::Caller;
use crate::config::Config;
use crate::emitter::Logger;
use crate::error::Result;
use crate::level::Level;
use crate::logger;

#[derive(Parser, Debug)]
#[command(
    name = "conlog",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub format: FormatOptions,

    /// Source position to annotate the line with, as FILE:LINE[:FUNCTION]
    #[arg(long, value_name = "LOCATION", value_parser = parse_caller)]
    pub caller: Option<Caller>,

    /// debug, info, warn, error or fatal
    #[arg(name = "LEVEL")]
    pub level: Level,

    /// Message words, joined with single spaces
    #[arg(
        name = "MESSAGE",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub message: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct FormatOptions {
    /// Text printed at the start of every line (default "[Log]")
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// strftime pattern for the timestamp (default "%y-%m-%d %H:%M:%S")
    #[arg(long, value_name = "FORMAT")]
    pub time_format: Option<String>,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,
}

impl FormatOptions {
    /// Flags win over whatever the environment configured.
    pub fn apply(&self, config: &mut Config) {
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(format) = &self.time_format {
            config.time_format = format.clone();
        }
        if self.no_color {
            config.no_color = true;
        }
    }
}

pub fn run_with_cli(cli: Cli) -> Result<()> {
    logger::init();
    log::debug!("cli args: {:?}", cli);

    let mut config = Config::from_env()?;
    cli.format.apply(&mut config);
    // The binary's own stack says nothing useful about the script calling it.
    config.show_location = cli.caller.is_some();

    let output = Logger::new(config);
    let message = cli.message.join(" ");
    match cli.caller {
        Some(caller) => output.emit_at(cli.level, caller, format_args!("{}", message)),
        None => output.emit(cli.level, format_args!("{}", message)),
    }
    Ok(())
}

/// `FILE:LINE[:FUNCTION]`, split from the right so drive letters survive.
fn parse_caller(raw: &str) -> std::result::Result<Caller, String> {
    let invalid = || format!("expected FILE:LINE[:FUNCTION], got '{}'", raw);
    let (head, tail) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let (file, line, function) = match tail.parse::<u32>() {
        Ok(line) => (head, line, None),
        Err(_) => {
            let (file, line) = head.rsplit_once(':').ok_or_else(invalid)?;
            let line = line.parse::<u32>().map_err(|_| invalid())?;
            (file, line, Some(tail))
        }
    };
    if file.is_empty() || line == 0 {
        return Err(invalid());
    }
    let function = function
        .filter(|f| !f.is_empty())
        .unwrap_or(crate::caller::UNKNOWN_FUNCTION);
    Ok(Caller::new(file, line, function))
}
