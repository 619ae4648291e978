//! pose_listen - receive pose datagrams and log them, as the engine would.
//!
//! Useful for checking a running relay without the engine attached.

use anyhow::Result;
use clap::Parser;

use pose_relay::transport::EnvelopeListener;

#[derive(Parser, Debug)]
#[command(author, version, about = "Log pose datagrams sent by pose_relay")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "POSE_LISTEN_ADDR", default_value = "127.0.0.1:5052")]
    bind: String,

    /// Exit after this many datagrams.
    #[arg(long)]
    count: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut listener = EnvelopeListener::bind(&args.bind)?;
    log::info!("listening for poses on {}", listener.local_addr()?);

    let mut received = 0u64;
    loop {
        if args.count.is_some_and(|count| received >= count) {
            break;
        }
        let (envelope, from) = match listener.recv() {
            Ok(datagram) => datagram,
            Err(e) => {
                log::warn!("dropped datagram: {:#}", e);
                continue;
            }
        };
        received += 1;
        log::info!(
            "pose #{} from {}: {} landmarks, complete={}",
            received,
            from,
            envelope.len(),
            envelope.is_complete()
        );
        for lm in &envelope.pose {
            log::info!(
                "  {} ({}): x={:.3}, y={:.3}, z={:.3}",
                lm.name,
                lm.index,
                lm.x,
                lm.y,
                lm.z
            );
        }
    }
    Ok(())
}
