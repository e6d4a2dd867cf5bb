use clap::Parser;
use postern::{Message, SmtpConfig, SmtpServer};
use std::process;
use std::sync::mpsc;
use std::thread;
use tracing::{Level, error, info};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Standalone SMTP sink that parses and logs every message it receives")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:2525")]
    addr: String,

    /// Host name announced in the greeting and EHLO reply
    #[arg(long, default_value = "postern.local")]
    hostname: String,

    /// Greeting banner text
    #[arg(long)]
    banner: Option<String>,

    /// Largest DATA payload accepted, in bytes
    #[arg(long)]
    max_data_size: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt().with_max_level(args.log_level).init();

    let mut config = SmtpConfig::new(&args.hostname);
    if let Some(banner) = &args.banner {
        config = config.with_banner(banner);
    }
    if let Some(max) = args.max_data_size {
        config = config.with_max_data_size(max);
    }

    info!("Starting Postern SMTP server on {} as {}", args.addr, args.hostname);

    let (tx, rx) = mpsc::channel::<Message>();
    let server = SmtpServer::new(config);

    thread::spawn(move || {
        let mut count = 0;
        while let Ok(message) = rx.recv() {
            count += 1;
            info!(
                "Received message #{count} from: {} to: {:?} subject: {:?} ({} attachment(s))",
                message.from,
                message.to,
                message.subject,
                message.attachments.len()
            );
        }
    });

    if let Err(e) = server.start(&args.addr, tx) {
        error!("Failed to start server: {e}");
        process::exit(1);
    }
}
