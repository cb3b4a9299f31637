//! Format a post read from stdin and print the resulting fragment
//!
//! ```text
//! echo 'Hello <b onclick="x()">there</b>' | RUST_LOG=forum_markup=debug \
//!     cargo run --example format_post -- --charset windows-1252
//! ```

use std::io::{self, Read, Write};
use std::process::ExitCode;

use forum_markup::charset::decode_input;
use forum_markup::formatter::Formatter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();

    let mut args = std::env::args().skip(1);
    let mut charset = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--charset" => charset = args.next(),
            other => {
                eprintln!("unknown argument: {other}");
                eprintln!("usage: format_post [--charset LABEL] < post.txt");
                return ExitCode::from(2);
            }
        }
    }

    let mut raw = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut raw) {
        eprintln!("failed to read stdin: {e}");
        return ExitCode::FAILURE;
    }

    let text = decode_input(&raw, charset.as_deref());
    let html = Formatter::default().format_or_escape(&text);

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{html}") {
        eprintln!("failed to write output: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
